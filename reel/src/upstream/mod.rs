pub mod phim_api;

pub use phim_api::PhimApiClient;
