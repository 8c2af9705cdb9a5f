use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Review nested inside an artist or album
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddedReview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub comment: String,
    pub rating: i16,
    pub date: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct EmbeddedReviewRow {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub user_id: Uuid,
    pub comment: String,
    pub rating: i16,
    pub date: DateTime<Utc>,
}

impl From<EmbeddedReviewRow> for EmbeddedReview {
    fn from(row: EmbeddedReviewRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            comment: row.comment,
            rating: row.rating,
            date: row.date,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewEmbeddedReview {
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: String,
}

/// Parent record an embedded review hangs off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewTarget {
    Artist(Uuid),
    Album(Uuid),
}

impl ReviewTarget {
    pub fn id(&self) -> Uuid {
        match self {
            ReviewTarget::Artist(id) | ReviewTarget::Album(id) => *id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReviewTarget::Artist(_) => "Artist",
            ReviewTarget::Album(_) => "Album",
        }
    }
}

/// Standalone album review
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub album_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: Uuid,
    pub album_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
}

/// Public projection of a review author
#[derive(Debug, Clone, Serialize)]
pub struct ReviewAuthor {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub author: Option<ReviewAuthor>,
}
