use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::{Album, Artist};
use crate::types::Role;

/// Full user record, including the password hash. Never serialized directly.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub role: Role,
    pub favorite_albums: Vec<Uuid>,
    pub favorite_artists: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape as stored in Postgres; `role` is checked when converting to [`User`].
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub role: String,
    pub favorite_albums: Vec<Uuid>,
    pub favorite_artists: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = crate::types::UnknownRole;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            avatar: row.avatar,
            role: row.role.parse()?,
            favorite_albums: row.favorite_albums,
            favorite_artists: row.favorite_artists,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub role: Role,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.avatar.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
    }
}

/// Minimal public projection returned by signup and login
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            avatar: user.avatar.clone(),
            role: user.role,
        }
    }
}

/// Password-stripped user with favorite ids
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub role: Role,
    pub favorite_albums: Vec<Uuid>,
    pub favorite_artists: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            role: user.role,
            favorite_albums: user.favorite_albums.clone(),
            favorite_artists: user.favorite_artists.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Password-stripped user with favorite collections resolved to full records
#[derive(Debug, Clone, Serialize)]
pub struct PopulatedUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub role: Role,
    pub favorite_albums: Vec<Album>,
    pub favorite_artists: Vec<Artist>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PopulatedUser {
    pub fn new(user: &User, favorite_albums: Vec<Album>, favorite_artists: Vec<Artist>) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            role: user.role,
            favorite_albums,
            favorite_artists,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
