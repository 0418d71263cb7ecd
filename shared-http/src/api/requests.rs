use serde::Deserialize;

// Every field is taken as a raw string; the server validates and converts them
// so that bad input produces a JSON error body instead of an extractor rejection.

/// Query for GET /api/movies/new
#[derive(Debug, Default, Deserialize)]
pub struct LatestMoviesQuery {
    pub page: Option<String>,
    pub version: Option<String>,
}

/// Paging, sorting and filtering shared by the listing endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_field: Option<String>,
    pub sort_type: Option<String>,
    pub sort_lang: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub year: Option<String>,
}

/// Query for GET /api/collections
#[derive(Debug, Default, Deserialize)]
pub struct CollectionQuery {
    pub type_list: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationQuery,
}

/// Query for GET /api/search
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationQuery,
}
