use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::*;
use super::store::{CatalogStore, ReviewStore, Store, StoreError, StoreResult, UserStore};
use crate::types::{FavoriteKind, Role};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    artists: Vec<Artist>,
    albums: Vec<Album>,
    reviews: Vec<Review>,
}

impl Tables {
    fn user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    fn clashes(&self, exclude: Option<Uuid>, username: Option<&str>, email: Option<&str>) -> Option<&'static str> {
        let others = self.users.iter().filter(|u| Some(u.id) != exclude);
        for user in others {
            if email.is_some_and(|e| e == user.email) {
                return Some("email");
            }
            if username.is_some_and(|n| n == user.username) {
                return Some("username");
            }
        }
        None
    }

    fn drop_reviews_of_albums(&mut self, album_ids: &[Uuid]) {
        self.reviews.retain(|r| !album_ids.contains(&r.album_id));
    }
}

/// In-process store with the same constraints and cascades as the Postgres schema.
/// Used by the test suite and by development runs without `DATABASE_URL`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if let Some(field) = tables.clashes(None, Some(&user.username), Some(&user.email)) {
            return Err(StoreError::Duplicate(field.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            avatar: user.avatar,
            role: user.role,
            favorite_albums: Vec::new(),
            favorite_artists: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(field) = tables.clashes(Some(id), changes.username.as_deref(), changes.email.as_deref()) {
            return Err(StoreError::Duplicate(field.to_string()));
        }

        let Some(user) = tables.user_mut(id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(avatar) = changes.avatar {
            user.avatar = avatar;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }

        tables.reviews.retain(|r| r.user_id != id);
        for artist in tables.artists.iter_mut() {
            artist.reviews.retain(|r| r.user_id != id);
        }
        for album in tables.albums.iter_mut() {
            album.reviews.retain(|r| r.user_id != id);
        }
        Ok(true)
    }

    async fn count_admins(&self) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().filter(|u| u.role == Role::Admin).count() as i64)
    }

    async fn add_favorite(&self, user_id: Uuid, kind: FavoriteKind, item_id: Uuid) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.user_mut(user_id) else {
            return Ok(None);
        };
        let set = match kind {
            FavoriteKind::Album => &mut user.favorite_albums,
            FavoriteKind::Artist => &mut user.favorite_artists,
        };
        if !set.contains(&item_id) {
            set.push(item_id);
            user.updated_at = Utc::now();
        }
        Ok(Some(user.clone()))
    }

    async fn remove_favorite(&self, user_id: Uuid, kind: FavoriteKind, item_id: Uuid) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.user_mut(user_id) else {
            return Ok(None);
        };
        let set = match kind {
            FavoriteKind::Album => &mut user.favorite_albums,
            FavoriteKind::Artist => &mut user.favorite_artists,
        };
        let before = set.len();
        set.retain(|id| *id != item_id);
        if set.len() != before {
            user.updated_at = Utc::now();
        }
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_artists(&self) -> StoreResult<Vec<Artist>> {
        Ok(self.tables.read().await.artists.clone())
    }

    async fn artist_by_id(&self, id: Uuid) -> StoreResult<Option<Artist>> {
        let tables = self.tables.read().await;
        Ok(tables.artists.iter().find(|a| a.id == id).cloned())
    }

    async fn artists_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Artist>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.artists.iter().find(|a| a.id == *id).cloned())
            .collect())
    }

    async fn insert_artist(&self, artist: NewArtist) -> StoreResult<Artist> {
        let now = Utc::now();
        let artist = Artist {
            id: Uuid::new_v4(),
            name: artist.name,
            country: artist.country,
            genre: artist.genre,
            image: artist.image,
            reviews: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.artists.push(artist.clone());
        Ok(artist)
    }

    async fn update_artist(&self, id: Uuid, changes: ArtistChanges) -> StoreResult<Option<Artist>> {
        let mut tables = self.tables.write().await;
        let Some(artist) = tables.artists.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            artist.name = name;
        }
        if let Some(country) = changes.country {
            artist.country = country;
        }
        if let Some(genre) = changes.genre {
            artist.genre = genre;
        }
        if let Some(image) = changes.image {
            artist.image = image;
        }
        artist.updated_at = Utc::now();
        Ok(Some(artist.clone()))
    }

    async fn delete_artist(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.artists.len();
        tables.artists.retain(|a| a.id != id);
        if tables.artists.len() == before {
            return Ok(false);
        }

        let orphaned: Vec<Uuid> = tables
            .albums
            .iter()
            .filter(|a| a.artist_id == id)
            .map(|a| a.id)
            .collect();
        tables.albums.retain(|a| a.artist_id != id);
        tables.drop_reviews_of_albums(&orphaned);
        Ok(true)
    }

    async fn list_albums(&self) -> StoreResult<Vec<Album>> {
        Ok(self.tables.read().await.albums.clone())
    }

    async fn albums_by_artist(&self, artist_id: Uuid) -> StoreResult<Vec<Album>> {
        let tables = self.tables.read().await;
        Ok(tables
            .albums
            .iter()
            .filter(|a| a.artist_id == artist_id)
            .cloned()
            .collect())
    }

    async fn album_by_id(&self, id: Uuid) -> StoreResult<Option<Album>> {
        let tables = self.tables.read().await;
        Ok(tables.albums.iter().find(|a| a.id == id).cloned())
    }

    async fn albums_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Album>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.albums.iter().find(|a| a.id == *id).cloned())
            .collect())
    }

    async fn insert_album(&self, album: NewAlbum) -> StoreResult<Album> {
        let mut tables = self.tables.write().await;
        if !tables.artists.iter().any(|a| a.id == album.artist_id) {
            return Err(StoreError::MissingReference("Artist".to_string()));
        }

        let now = Utc::now();
        let album = Album {
            id: Uuid::new_v4(),
            title: album.title,
            artist_id: album.artist_id,
            year: album.year,
            cover: album.cover,
            genre: album.genre,
            tracklist: album.tracklist,
            reviews: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.albums.push(album.clone());
        Ok(album)
    }

    async fn update_album(&self, id: Uuid, changes: AlbumChanges) -> StoreResult<Option<Album>> {
        let mut tables = self.tables.write().await;
        if let Some(artist_id) = changes.artist_id {
            if !tables.artists.iter().any(|a| a.id == artist_id) {
                return Err(StoreError::MissingReference("Artist".to_string()));
            }
        }

        let Some(album) = tables.albums.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            album.title = title;
        }
        if let Some(artist_id) = changes.artist_id {
            album.artist_id = artist_id;
        }
        if let Some(year) = changes.year {
            album.year = year;
        }
        if let Some(cover) = changes.cover {
            album.cover = cover;
        }
        if let Some(genre) = changes.genre {
            album.genre = genre;
        }
        if let Some(tracklist) = changes.tracklist {
            album.tracklist = tracklist;
        }
        album.updated_at = Utc::now();
        Ok(Some(album.clone()))
    }

    async fn delete_album(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.albums.len();
        tables.albums.retain(|a| a.id != id);
        if tables.albums.len() == before {
            return Ok(false);
        }
        tables.drop_reviews_of_albums(&[id]);
        Ok(true)
    }

    async fn search(&self, query: &str) -> StoreResult<SearchResults> {
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        Ok(SearchResults {
            artists: tables
                .artists
                .iter()
                .filter(|a| a.name.to_lowercase().contains(&needle))
                .cloned()
                .collect(),
            albums: tables
                .albums
                .iter()
                .filter(|a| a.title.to_lowercase().contains(&needle))
                .cloned()
                .collect(),
        })
    }

    async fn add_embedded_review(
        &self,
        target: ReviewTarget,
        review: NewEmbeddedReview,
    ) -> StoreResult<Option<EmbeddedReview>> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == review.user_id) {
            return Err(StoreError::MissingReference("User".to_string()));
        }

        let reviews = match target {
            ReviewTarget::Artist(id) => tables.artists.iter_mut().find(|a| a.id == id).map(|a| &mut a.reviews),
            ReviewTarget::Album(id) => tables.albums.iter_mut().find(|a| a.id == id).map(|a| &mut a.reviews),
        };
        let Some(reviews) = reviews else {
            return Ok(None);
        };

        let review = EmbeddedReview {
            id: Uuid::new_v4(),
            user_id: review.user_id,
            comment: review.comment,
            rating: review.rating,
            date: Utc::now(),
        };
        reviews.push(review.clone());
        Ok(Some(review))
    }

    async fn remove_embedded_review(&self, target: ReviewTarget, review_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let reviews = match target {
            ReviewTarget::Artist(id) => tables.artists.iter_mut().find(|a| a.id == id).map(|a| &mut a.reviews),
            ReviewTarget::Album(id) => tables.albums.iter_mut().find(|a| a.id == id).map(|a| &mut a.reviews),
        };
        let Some(reviews) = reviews else {
            return Ok(false);
        };

        let before = reviews.len();
        reviews.retain(|r| r.id != review_id);
        Ok(reviews.len() != before)
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert_review(&self, review: NewReview) -> StoreResult<Review> {
        let mut tables = self.tables.write().await;
        if !tables.albums.iter().any(|a| a.id == review.album_id) {
            return Err(StoreError::MissingReference("Album".to_string()));
        }
        if !tables.users.iter().any(|u| u.id == review.user_id) {
            return Err(StoreError::MissingReference("User".to_string()));
        }

        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            user_id: review.user_id,
            album_id: review.album_id,
            rating: review.rating,
            comment: review.comment,
            created_at: now,
            updated_at: now,
        };
        tables.reviews.push(review.clone());
        Ok(review)
    }

    async fn reviews_for_album(&self, album_id: Uuid) -> StoreResult<Vec<ReviewWithAuthor>> {
        let tables = self.tables.read().await;
        // Later inserts first so equal timestamps still come out newest first.
        let mut reviews: Vec<ReviewWithAuthor> = tables
            .reviews
            .iter()
            .rev()
            .filter(|r| r.album_id == album_id)
            .map(|review| ReviewWithAuthor {
                author: tables
                    .users
                    .iter()
                    .find(|u| u.id == review.user_id)
                    .map(|u| ReviewAuthor {
                        id: u.id,
                        username: u.username.clone(),
                        avatar: u.avatar.clone(),
                    }),
                review: review.clone(),
            })
            .collect();
        reviews.sort_by(|a, b| b.review.created_at.cmp(&a.review.created_at));
        Ok(reviews)
    }

    async fn delete_review_by_owner(&self, review_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.reviews.len();
        tables
            .reviews
            .retain(|r| !(r.id == review_id && r.user_id == user_id));
        Ok(tables.reviews.len() != before)
    }

    async fn delete_review(&self, review_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.reviews.len();
        tables.reviews.retain(|r| r.id != review_id);
        Ok(tables.reviews.len() != before)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
