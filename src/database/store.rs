use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::*;
use crate::types::FavoriteKind;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write; carries the field name.
    #[error("Duplicate value for {0}")]
    Duplicate(String),

    /// A write referenced a record that does not exist.
    #[error("{0} does not exist")]
    MissingReference(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. Fails with `Duplicate("email" | "username")` on a uniqueness clash.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Exact match on the already-normalized email.
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Applies the changes and returns the updated user, or `None` if it does not exist.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>>;

    /// Returns whether a row was removed.
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    async fn count_admins(&self) -> StoreResult<i64>;

    /// Atomic set-union of one id into a favorite set. `None` if the user does not exist.
    async fn add_favorite(&self, user_id: Uuid, kind: FavoriteKind, item_id: Uuid) -> StoreResult<Option<User>>;

    /// Atomic set-difference of one id from a favorite set. `None` if the user does not exist.
    async fn remove_favorite(&self, user_id: Uuid, kind: FavoriteKind, item_id: Uuid) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_artists(&self) -> StoreResult<Vec<Artist>>;

    async fn artist_by_id(&self, id: Uuid) -> StoreResult<Option<Artist>>;

    /// Returns the artists that exist, in the order of `ids`.
    async fn artists_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Artist>>;

    async fn insert_artist(&self, artist: NewArtist) -> StoreResult<Artist>;

    async fn update_artist(&self, id: Uuid, changes: ArtistChanges) -> StoreResult<Option<Artist>>;

    /// Removes the artist and, with it, its albums.
    async fn delete_artist(&self, id: Uuid) -> StoreResult<bool>;

    async fn list_albums(&self) -> StoreResult<Vec<Album>>;

    async fn albums_by_artist(&self, artist_id: Uuid) -> StoreResult<Vec<Album>>;

    async fn album_by_id(&self, id: Uuid) -> StoreResult<Option<Album>>;

    /// Returns the albums that exist, in the order of `ids`.
    async fn albums_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Album>>;

    /// Fails with `MissingReference("Artist")` if the artist does not exist.
    async fn insert_album(&self, album: NewAlbum) -> StoreResult<Album>;

    async fn update_album(&self, id: Uuid, changes: AlbumChanges) -> StoreResult<Option<Album>>;

    async fn delete_album(&self, id: Uuid) -> StoreResult<bool>;

    /// Case-insensitive substring match on artist names and album titles.
    async fn search(&self, query: &str) -> StoreResult<SearchResults>;

    /// Appends a review to the target. `None` if the target does not exist.
    async fn add_embedded_review(
        &self,
        target: ReviewTarget,
        review: NewEmbeddedReview,
    ) -> StoreResult<Option<EmbeddedReview>>;

    async fn remove_embedded_review(&self, target: ReviewTarget, review_id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Fails with `MissingReference("Album")` if the album does not exist.
    async fn insert_review(&self, review: NewReview) -> StoreResult<Review>;

    /// Newest first, with author projections.
    async fn reviews_for_album(&self, album_id: Uuid) -> StoreResult<Vec<ReviewWithAuthor>>;

    /// Deletes only when `user_id` authored the review. Returns whether a row was removed.
    async fn delete_review_by_owner(&self, review_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    async fn delete_review(&self, review_id: Uuid) -> StoreResult<bool>;
}

/// Everything the application persists
#[async_trait]
pub trait Store: UserStore + CatalogStore + ReviewStore {
    /// Cheap connectivity check used by `/health`.
    async fn ping(&self) -> StoreResult<()>;

    fn backend(&self) -> &'static str;
}
