//! Upstream endpoint families.
//!
//! Every call goes through the read-through cache with its own key prefix so
//! that keys from different families never collide, even when raw upstream
//! paths overlap.

use crate::planes::data::CachedFetch;
use crate::query::QueryParams;
use serde_json::Value;
use shared::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::form_urlencoded;

const LATEST_MOVIES_PATH: &str = "/danh-sach/phim-moi-cap-nhat";

/// Feed version of the "recently updated" listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Version {
    #[default]
    V1,
    V2,
    V3,
}

impl Version {
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V1 => "v1",
            Version::V2 => "v2",
            Version::V3 => "v3",
        }
    }

    fn path_suffix(&self) -> &'static str {
        match self {
            Version::V1 => "",
            Version::V2 => "-v2",
            Version::V3 => "-v3",
        }
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "v1" => Ok(Version::V1),
            "v2" => Ok(Version::V2),
            "v3" => Ok(Version::V3),
            other => Err(Error::InvalidRequest(format!(
                "Invalid version '{}'. Must be 'v1', 'v2' or 'v3'",
                other
            ))),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media kind in a TMDB lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TmdbKind {
    Tv,
    Movie,
}

impl TmdbKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TmdbKind::Tv => "tv",
            TmdbKind::Movie => "movie",
        }
    }
}

impl FromStr for TmdbKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "tv" => Ok(TmdbKind::Tv),
            "movie" => Ok(TmdbKind::Movie),
            other => Err(Error::InvalidRequest(format!(
                "Invalid TMDB type '{}'. Must be 'tv' or 'movie'",
                other
            ))),
        }
    }
}

/// Cached access to the upstream movie catalog.
#[derive(Clone)]
pub struct Catalog {
    fetcher: Arc<dyn CachedFetch>,
}

impl Catalog {
    pub fn new(fetcher: Arc<dyn CachedFetch>) -> Self {
        Self { fetcher }
    }

    pub async fn latest_movies(&self, page: u32, version: Version) -> Result<Value> {
        let path = format!("{}{}", LATEST_MOVIES_PATH, version.path_suffix());
        let params = QueryParams::new().with("page", Some(page));
        let prefix = format!("latest:{}", version);
        self.fetcher.fetch(&path, &params, Some(&prefix)).await
    }

    pub async fn movie_details(&self, slug: &str) -> Result<Value> {
        let slug = segment(slug);
        let prefix = format!("movie:{}", slug);
        self.fetcher
            .fetch(&format!("/phim/{}", slug), &QueryParams::new(), Some(&prefix))
            .await
    }

    pub async fn movie_by_tmdb(&self, kind: TmdbKind, id: &str) -> Result<Value> {
        let id = segment(id);
        let path = format!("/tmdb/{}/{}", kind.as_str(), id);
        let prefix = format!("tmdb:{}:{}", kind.as_str(), id);
        self.fetcher
            .fetch(&path, &QueryParams::new(), Some(&prefix))
            .await
    }

    /// `params` must not carry the list type itself; it is part of the path.
    pub async fn collection(&self, type_list: &str, params: &QueryParams) -> Result<Value> {
        let type_list = segment(type_list);
        let path = format!("/v1/api/danh-sach/{}", type_list);
        let prefix = format!("collection:{}", type_list);
        self.fetcher.fetch(&path, params, Some(&prefix)).await
    }

    pub async fn search(&self, params: &QueryParams) -> Result<Value> {
        self.fetcher
            .fetch("/v1/api/tim-kiem", params, Some("search"))
            .await
    }

    pub async fn genres(&self) -> Result<Value> {
        self.fetcher
            .fetch("/the-loai", &QueryParams::new(), Some("genres"))
            .await
    }

    pub async fn genre_detail(&self, slug: &str, params: &QueryParams) -> Result<Value> {
        let slug = segment(slug);
        let path = format!("/v1/api/the-loai/{}", slug);
        let prefix = format!("genre:{}", slug);
        self.fetcher.fetch(&path, params, Some(&prefix)).await
    }

    pub async fn countries(&self) -> Result<Value> {
        self.fetcher
            .fetch("/quoc-gia", &QueryParams::new(), Some("countries"))
            .await
    }

    pub async fn country_detail(&self, slug: &str, params: &QueryParams) -> Result<Value> {
        let slug = segment(slug);
        let path = format!("/v1/api/quoc-gia/{}", slug);
        let prefix = format!("country:{}", slug);
        self.fetcher.fetch(&path, params, Some(&prefix)).await
    }

    pub async fn year_detail(&self, year: &str, params: &QueryParams) -> Result<Value> {
        let year = segment(year);
        let path = format!("/v1/api/nam/{}", year);
        let prefix = format!("year:{}", year);
        self.fetcher.fetch(&path, params, Some(&prefix)).await
    }
}

/// Percent-encodes one path segment so it can't inject `/`, `?` or `#` into
/// the upstream URL or the cache key.
fn segment(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog").finish_non_exhaustive()
    }
}
