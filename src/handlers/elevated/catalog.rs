// handlers/elevated/catalog.rs - Catalog writes and embedded review moderation

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

use crate::database::models::{AlbumDetails, Artist, ReviewTarget};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::validation::parse_id;
use crate::services::{AlbumInput, ArtistInput};
use crate::state::AppState;

/// POST /artists - `{name, country?, genre?, image?}`
pub async fn create_artist(
    State(state): State<AppState>,
    body: Result<Json<ArtistInput>, JsonRejection>,
) -> ApiResult<Artist> {
    let Json(input) = body?;
    Ok(ApiResponse::created(state.catalog().create_artist(input).await?))
}

/// PUT /artists/:id - partial; absent fields are left alone
pub async fn update_artist(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ArtistInput>, JsonRejection>,
) -> ApiResult<Artist> {
    let id = parse_id("artist", &id)?;
    let Json(input) = body?;
    Ok(ApiResponse::success(state.catalog().update_artist(id, input).await?))
}

/// DELETE /artists/:id - also removes the artist's albums
pub async fn delete_artist(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id("artist", &id)?;
    state.catalog().delete_artist(id).await?;
    Ok(ApiResponse::message("Artist deleted"))
}

/// POST /albums - `{title, artist, year, cover?, genre?, tracklist?}`
pub async fn create_album(
    State(state): State<AppState>,
    body: Result<Json<AlbumInput>, JsonRejection>,
) -> ApiResult<AlbumDetails> {
    let Json(input) = body?;
    Ok(ApiResponse::created(state.catalog().create_album(input).await?))
}

/// PUT /albums/:id
pub async fn update_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<AlbumInput>, JsonRejection>,
) -> ApiResult<AlbumDetails> {
    let id = parse_id("album", &id)?;
    let Json(input) = body?;
    Ok(ApiResponse::success(state.catalog().update_album(id, input).await?))
}

/// DELETE /albums/:id
pub async fn delete_album(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id("album", &id)?;
    state.catalog().delete_album(id).await?;
    Ok(ApiResponse::message("Album deleted"))
}

/// DELETE /artists/:id/reviews/:review_id
pub async fn delete_artist_review(
    State(state): State<AppState>,
    Path((id, review_id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let target = ReviewTarget::Artist(parse_id("artist", &id)?);
    let review_id = parse_id("review", &review_id)?;
    state.catalog().delete_review(target, review_id).await?;
    Ok(ApiResponse::message("Review deleted"))
}

/// DELETE /albums/:id/reviews/:review_id
pub async fn delete_album_review(
    State(state): State<AppState>,
    Path((id, review_id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let target = ReviewTarget::Album(parse_id("album", &id)?);
    let review_id = parse_id("review", &review_id)?;
    state.catalog().delete_review(target, review_id).await?;
    Ok(ApiResponse::message("Review deleted"))
}
