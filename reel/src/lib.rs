pub mod catalog;
pub mod clock;
pub mod domain;
pub mod planes;
pub mod ports;
pub mod query;
pub mod upstream;

pub use catalog::{Catalog, Version};
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::CacheEntry;
pub use planes::data::{CachedFetch, ReadThroughFetcher};
pub use ports::{CacheStore, Upstream};
pub use query::QueryParams;
pub use upstream::PhimApiClient;
