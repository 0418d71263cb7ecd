pub mod requests;
pub mod responses;

pub use requests::{CollectionQuery, LatestMoviesQuery, PaginationQuery, SearchQuery};
pub use responses::{ErrorResponse, HealthResponse};
