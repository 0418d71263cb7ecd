pub mod operation;
pub mod read_through;

pub use operation::CachedFetch;
pub use read_through::ReadThroughFetcher;
