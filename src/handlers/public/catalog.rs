// handlers/public/catalog.rs - Read-only artist, album and search endpoints

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::database::models::{Album, AlbumDetails, Artist, SearchResults};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::validation::parse_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /artists
pub async fn list_artists(State(state): State<AppState>) -> ApiResult<Vec<Artist>> {
    Ok(ApiResponse::success(state.catalog().list_artists().await?))
}

/// GET /artists/:id
pub async fn get_artist(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Artist> {
    let id = parse_id("artist", &id)?;
    Ok(ApiResponse::success(state.catalog().get_artist(id).await?))
}

/// GET /artists/:id/albums
pub async fn artist_albums(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<Album>> {
    let id = parse_id("artist", &id)?;
    Ok(ApiResponse::success(state.catalog().albums_for_artist(id).await?))
}

/// GET /albums - every album with its artist resolved
pub async fn list_albums(State(state): State<AppState>) -> ApiResult<Vec<AlbumDetails>> {
    Ok(ApiResponse::success(state.catalog().list_albums().await?))
}

/// GET /albums/:id
pub async fn get_album(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<AlbumDetails> {
    let id = parse_id("album", &id)?;
    Ok(ApiResponse::success(state.catalog().get_album(id).await?))
}

/// GET /search?q= - case-insensitive match on artist names and album titles
pub async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> ApiResult<SearchResults> {
    let results = state.catalog().search(query.q.as_deref()).await?;
    Ok(ApiResponse::success(results))
}
