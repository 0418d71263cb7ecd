//! Pass-through catalog endpoints. Bodies are the upstream payloads, verbatim.

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use serde_json::Value;
use shared_http::api::{CollectionQuery, LatestMoviesQuery, PaginationQuery, SearchQuery};
use tracing::info;

type ApiResult = Result<Json<Value>, ApiError>;

/// GET /api/movies/new
pub async fn latest_movies(
    State(state): State<AppState>,
    query: Result<Query<LatestMoviesQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let latest = validation::latest_movies(&query)?;
    info!("LATEST: page={}, version={}", latest.page, latest.version);

    let payload = state
        .catalog
        .latest_movies(latest.page, latest.version)
        .await?;
    Ok(Json(payload))
}

/// GET /api/movies/:slug
pub async fn movie_details(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult {
    info!("MOVIE: slug={}", slug);
    Ok(Json(state.catalog.movie_details(&slug).await?))
}

/// GET /api/movies/tmdb/:type/:id
pub async fn movie_by_tmdb(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult {
    let kind = validation::tmdb_kind(&kind)?;
    info!("TMDB: type={}, id={}", kind.as_str(), id);

    Ok(Json(state.catalog.movie_by_tmdb(kind, &id).await?))
}

/// GET /api/collections
pub async fn collections(
    State(state): State<AppState>,
    query: Result<Query<CollectionQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let (type_list, params) = validation::collection(&query)?;
    info!("COLLECTION: type_list={}", type_list);

    Ok(Json(state.catalog.collection(&type_list, &params).await?))
}

/// GET /api/search
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let params = validation::search(&query)?;
    info!("SEARCH: keyword={:?}", params.get("keyword"));

    Ok(Json(state.catalog.search(&params).await?))
}

/// GET /api/genres
pub async fn genres(State(state): State<AppState>) -> ApiResult {
    Ok(Json(state.catalog.genres().await?))
}

/// GET /api/genres/:slug
pub async fn genre_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let params = validation::pagination(&query)?;
    info!("GENRE: slug={}", slug);

    Ok(Json(state.catalog.genre_detail(&slug, &params).await?))
}

/// GET /api/countries
pub async fn countries(State(state): State<AppState>) -> ApiResult {
    Ok(Json(state.catalog.countries().await?))
}

/// GET /api/countries/:slug
pub async fn country_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let params = validation::pagination(&query)?;
    info!("COUNTRY: slug={}", slug);

    Ok(Json(state.catalog.country_detail(&slug, &params).await?))
}

/// GET /api/years/:year
pub async fn year_detail(
    State(state): State<AppState>,
    Path(year): Path<String>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let year = validation::year(&year)?;
    let params = validation::pagination(&query)?;
    info!("YEAR: year={}", year);

    Ok(Json(state.catalog.year_detail(&year, &params).await?))
}
