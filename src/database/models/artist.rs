use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::EmbeddedReview;

#[derive(Debug, Clone, Serialize)]
pub struct Artist {
    pub id: Uuid,
    pub name: String,
    pub country: String,
    pub genre: String,
    pub image: String,
    pub reviews: Vec<EmbeddedReview>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct ArtistRow {
    pub id: Uuid,
    pub name: String,
    pub country: String,
    pub genre: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArtistRow {
    pub fn into_artist(self, reviews: Vec<EmbeddedReview>) -> Artist {
        Artist {
            id: self.id,
            name: self.name,
            country: self.country,
            genre: self.genre,
            image: self.image,
            reviews,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewArtist {
    pub name: String,
    pub country: String,
    pub genre: String,
    pub image: String,
}

#[derive(Debug, Clone, Default)]
pub struct ArtistChanges {
    pub name: Option<String>,
    pub country: Option<String>,
    pub genre: Option<String>,
    pub image: Option<String>,
}
