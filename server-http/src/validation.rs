use reel::QueryParams;
use reel::catalog::{TmdbKind, Version};
use shared_http::api::{CollectionQuery, LatestMoviesQuery, PaginationQuery, SearchQuery};

// Constants for validation ranges
const DEFAULT_PAGE: u32 = 1;
const MIN_LIMIT: i64 = 1;
const MAX_LIMIT: i64 = 64;
const MIN_YEAR: i64 = 1970;

const SORT_TYPES: &[&str] = &["asc", "desc"];
const VERSIONS: &[&str] = &["v1", "v2", "v3"];
const TMDB_KINDS: &[&str] = &["tv", "movie"];
const COLLECTION_TYPES: &[&str] = &[
    "phim-bo",
    "phim-le",
    "tv-shows",
    "hoat-hinh",
    "phim-vietsub",
    "phim-thuyet-minh",
    "phim-long-tieng",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Required {
        field: &'static str,
    },
    Empty {
        field: &'static str,
    },
    NotAnInteger {
        field: &'static str,
        value: String,
    },
    TooSmall {
        field: &'static str,
        min: i64,
    },
    TooLarge {
        field: &'static str,
        max: i64,
    },
    NotAllowed {
        field: &'static str,
        allowed: &'static [&'static str],
    },
    /// The query string itself could not be read
    Malformed {
        reason: String,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Required { field } => write!(f, "\"{}\" is required", field),
            ValidationError::Empty { field } => {
                write!(f, "\"{}\" is not allowed to be empty", field)
            }
            ValidationError::NotAnInteger { field, value } => {
                write!(f, "\"{}\" must be an integer (got '{}')", field, value)
            }
            ValidationError::TooSmall { field, min } => {
                write!(f, "\"{}\" must be greater than or equal to {}", field, min)
            }
            ValidationError::TooLarge { field, max } => {
                write!(f, "\"{}\" must be less than or equal to {}", field, max)
            }
            ValidationError::NotAllowed { field, allowed } => {
                write!(f, "\"{}\" must be one of [{}]", field, allowed.join(", "))
            }
            ValidationError::Malformed { reason } => write!(f, "{}", reason),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Every problem found in one request
#[derive(Debug, Default)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    pub fn details(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

/// Validated query for the "recently updated" feed
#[derive(Debug, PartialEq)]
pub struct LatestMovies {
    pub page: u32,
    pub version: Version,
}

pub fn latest_movies(query: &LatestMoviesQuery) -> Result<LatestMovies, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let page = record(&mut errors, parse_page(query.page.as_deref())).unwrap_or(DEFAULT_PAGE);
    let version = match non_empty(query.version.as_deref()) {
        None => Version::default(),
        Some(raw) => raw.parse::<Version>().unwrap_or_else(|_| {
            errors.push(ValidationError::NotAllowed {
                field: "version",
                allowed: VERSIONS,
            });
            Version::default()
        }),
    };

    errors.into_result(LatestMovies { page, version })
}

/// Paging, sorting and filter parameters forwarded upstream
pub fn pagination(query: &PaginationQuery) -> Result<QueryParams, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let params = pagination_params(query, &mut errors);
    errors.into_result(params)
}

/// Returns the list type and the remaining forwarded parameters
pub fn collection(query: &CollectionQuery) -> Result<(String, QueryParams), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let type_list = match non_empty(query.type_list.as_deref()) {
        None => {
            errors.push(ValidationError::Required { field: "type_list" });
            String::new()
        }
        Some(raw) if COLLECTION_TYPES.contains(&raw) => raw.to_string(),
        Some(_) => {
            errors.push(ValidationError::NotAllowed {
                field: "type_list",
                allowed: COLLECTION_TYPES,
            });
            String::new()
        }
    };
    let params = pagination_params(&query.pagination, &mut errors);

    errors.into_result((type_list, params))
}

/// The keyword is trimmed and forwarded with the paging parameters
pub fn search(query: &SearchQuery) -> Result<QueryParams, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let keyword = match query.keyword.as_deref().map(str::trim) {
        None => {
            errors.push(ValidationError::Required { field: "keyword" });
            None
        }
        Some("") => {
            errors.push(ValidationError::Empty { field: "keyword" });
            None
        }
        Some(keyword) => Some(keyword.to_string()),
    };
    let params = pagination_params(&query.pagination, &mut errors).with("keyword", keyword);

    errors.into_result(params)
}

pub fn tmdb_kind(raw: &str) -> Result<TmdbKind, ValidationErrors> {
    raw.parse::<TmdbKind>().map_err(|_| {
        ValidationError::NotAllowed {
            field: "type",
            allowed: TMDB_KINDS,
        }
        .into()
    })
}

pub fn year(raw: &str) -> Result<String, ValidationErrors> {
    let year = parse_int("year", raw)?;
    if year < MIN_YEAR {
        return Err(ValidationError::TooSmall {
            field: "year",
            min: MIN_YEAR,
        }
        .into());
    }
    Ok(year.to_string())
}

fn pagination_params(query: &PaginationQuery, errors: &mut ValidationErrors) -> QueryParams {
    let page = record(errors, parse_page(query.page.as_deref())).unwrap_or(DEFAULT_PAGE);

    let limit = non_empty(query.limit.as_deref())
        .and_then(|raw| record(errors, parse_bounded("limit", raw, MIN_LIMIT, MAX_LIMIT)));

    let sort_type = non_empty(query.sort_type.as_deref()).and_then(|raw| {
        if SORT_TYPES.contains(&raw) {
            Some(raw)
        } else {
            errors.push(ValidationError::NotAllowed {
                field: "sort_type",
                allowed: SORT_TYPES,
            });
            None
        }
    });

    // A year may be a number (>= 1970) or free text such as "2020-2022".
    let year = non_empty(query.year.as_deref()).and_then(|raw| match raw.parse::<i64>() {
        Ok(year) if year < MIN_YEAR => {
            errors.push(ValidationError::TooSmall {
                field: "year",
                min: MIN_YEAR,
            });
            None
        }
        _ => Some(raw),
    });

    QueryParams::new()
        .with("page", Some(page))
        .with("limit", limit)
        .with("sort_field", query.sort_field.as_deref())
        .with("sort_type", sort_type)
        .with("sort_lang", query.sort_lang.as_deref())
        .with("category", query.category.as_deref())
        .with("country", query.country.as_deref())
        .with("year", year)
}

fn parse_page(raw: Option<&str>) -> Result<u32, ValidationError> {
    match non_empty(raw) {
        None => Ok(DEFAULT_PAGE),
        Some(raw) => parse_bounded("page", raw, 1, u32::MAX as i64).map(|page| page as u32),
    }
}

fn parse_bounded(field: &'static str, raw: &str, min: i64, max: i64) -> Result<i64, ValidationError> {
    let value = parse_int(field, raw)?;
    if value < min {
        return Err(ValidationError::TooSmall { field, min });
    }
    if value > max {
        return Err(ValidationError::TooLarge { field, max });
    }
    Ok(value)
}

fn parse_int(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::NotAnInteger {
            field,
            value: raw.to_string(),
        })
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.is_empty())
}

fn record<T>(errors: &mut ValidationErrors, result: Result<T, ValidationError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}
