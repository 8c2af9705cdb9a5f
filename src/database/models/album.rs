use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::{Artist, EmbeddedReview};

#[derive(Debug, Clone, Serialize)]
pub struct Album {
    pub id: Uuid,
    pub title: String,
    pub artist_id: Uuid,
    pub year: i32,
    pub cover: String,
    pub genre: String,
    pub tracklist: Vec<String>,
    pub reviews: Vec<EmbeddedReview>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct AlbumRow {
    pub id: Uuid,
    pub title: String,
    pub artist_id: Uuid,
    pub year: i32,
    pub cover: String,
    pub genre: String,
    pub tracklist: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AlbumRow {
    pub fn into_album(self, reviews: Vec<EmbeddedReview>) -> Album {
        Album {
            id: self.id,
            title: self.title,
            artist_id: self.artist_id,
            year: self.year,
            cover: self.cover,
            genre: self.genre,
            tracklist: self.tracklist,
            reviews,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Album read view with its artist resolved
#[derive(Debug, Clone, Serialize)]
pub struct AlbumDetails {
    #[serde(flatten)]
    pub album: Album,
    pub artist: Option<Artist>,
}

#[derive(Debug, Clone)]
pub struct NewAlbum {
    pub title: String,
    pub artist_id: Uuid,
    pub year: i32,
    pub cover: String,
    pub genre: String,
    pub tracklist: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AlbumChanges {
    pub title: Option<String>,
    pub artist_id: Option<Uuid>,
    pub year: Option<i32>,
    pub cover: Option<String>,
    pub genre: Option<String>,
    pub tracklist: Option<Vec<String>>,
}
