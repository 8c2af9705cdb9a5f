use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::models::*;
use super::store::{CatalogStore, ReviewStore, Store, StoreError, StoreResult, UserStore};
use crate::types::FavoriteKind;

const USER_COLUMNS: &str = "id, username, email, password_hash, avatar, role, favorite_albums, favorite_artists, created_at, updated_at";
const ARTIST_COLUMNS: &str = "id, name, country, genre, image, created_at, updated_at";
const ALBUM_COLUMNS: &str = "id, title, artist_id, year, cover, genre, tracklist, created_at, updated_at";
const REVIEW_COLUMNS: &str = "id, user_id, album_id, rating, comment, created_at, updated_at";

/// Translates constraint violations into store-level errors the service layer understands.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let Some(db) = err.as_database_error() {
        let constraint = db.constraint().unwrap_or_default().to_string();
        match db.code().as_deref() {
            Some("23505") => {
                let field = if constraint.contains("email") {
                    "email"
                } else if constraint.contains("username") {
                    "username"
                } else {
                    constraint.as_str()
                };
                return StoreError::Duplicate(field.to_string());
            }
            Some("23503") => {
                let what = if constraint.ends_with("artist_id_fkey") {
                    "Artist"
                } else if constraint.ends_with("album_id_fkey") {
                    "Album"
                } else {
                    "User"
                };
                return StoreError::MissingReference(what.to_string());
            }
            _ => {}
        }
    }
    StoreError::Database(err)
}

fn into_user(row: UserRow) -> StoreResult<User> {
    User::try_from(row).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Escapes LIKE wildcards so user input only ever matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Re-applies the caller's id order to an `= ANY($1)` result and drops missing ids.
fn in_id_order<T>(ids: &[Uuid], items: Vec<T>, id_of: impl Fn(&T) -> Uuid) -> Vec<T> {
    let mut by_id: HashMap<Uuid, T> = items.into_iter().map(|item| (id_of(&item), item)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn embedded_reviews(
        &self,
        target: fn(Uuid) -> ReviewTarget,
        parent_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, Vec<EmbeddedReview>>> {
        if parent_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = match target(Uuid::nil()) {
            ReviewTarget::Artist(_) => {
                "SELECT id, artist_id AS parent_id, user_id, comment, rating, created_at AS date \
                 FROM artist_reviews WHERE artist_id = ANY($1) ORDER BY created_at, id"
            }
            ReviewTarget::Album(_) => {
                "SELECT id, album_id AS parent_id, user_id, comment, rating, created_at AS date \
                 FROM album_reviews WHERE album_id = ANY($1) ORDER BY created_at, id"
            }
        };

        let rows = sqlx::query_as::<_, EmbeddedReviewRow>(sql)
            .bind(parent_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut grouped: HashMap<Uuid, Vec<EmbeddedReview>> = HashMap::new();
        for row in rows {
            grouped.entry(row.parent_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    async fn hydrate_artists(&self, rows: Vec<ArtistRow>) -> StoreResult<Vec<Artist>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut reviews = self.embedded_reviews(ReviewTarget::Artist, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let own = reviews.remove(&row.id).unwrap_or_default();
                row.into_artist(own)
            })
            .collect())
    }

    async fn hydrate_albums(&self, rows: Vec<AlbumRow>) -> StoreResult<Vec<Album>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut reviews = self.embedded_reviews(ReviewTarget::Album, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let own = reviews.remove(&row.id).unwrap_or_default();
                row.into_album(own)
            })
            .collect())
    }

    async fn hydrate_artist(&self, row: Option<ArtistRow>) -> StoreResult<Option<Artist>> {
        match row {
            Some(row) => Ok(self.hydrate_artists(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn hydrate_album(&self, row: Option<AlbumRow>) -> StoreResult<Option<Album>> {
        match row {
            Some(row) => Ok(self.hydrate_albums(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn user_where(&self, clause: &str, value: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_user).transpose()
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, username, email, password_hash, avatar, role) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.avatar)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        into_user(row)
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_user).transpose()
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.user_where("email", email).await
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.user_where("username", username).await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, UserRow>(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(into_user).collect()
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
                username = COALESCE($2, username), \
                email = COALESCE($3, email), \
                avatar = COALESCE($4, avatar), \
                password_hash = COALESCE($5, password_hash), \
                role = COALESCE($6, role), \
                updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(changes.username)
            .bind(changes.email)
            .bind(changes.avatar)
            .bind(changes.password_hash)
            .bind(changes.role.map(|r| r.as_str()))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        row.map(into_user).transpose()
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_admins(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn add_favorite(&self, user_id: Uuid, kind: FavoriteKind, item_id: Uuid) -> StoreResult<Option<User>> {
        let set = match kind {
            FavoriteKind::Album => {
                "favorite_albums = CASE WHEN $2 = ANY(favorite_albums) THEN favorite_albums \
                 ELSE array_append(favorite_albums, $2) END"
            }
            FavoriteKind::Artist => {
                "favorite_artists = CASE WHEN $2 = ANY(favorite_artists) THEN favorite_artists \
                 ELSE array_append(favorite_artists, $2) END"
            }
        };
        let sql = format!("UPDATE users SET {set}, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        if row.is_some() {
            debug!("Added {} {} to favorites of {}", kind.label(), item_id, user_id);
        }
        row.map(into_user).transpose()
    }

    async fn remove_favorite(&self, user_id: Uuid, kind: FavoriteKind, item_id: Uuid) -> StoreResult<Option<User>> {
        let set = match kind {
            FavoriteKind::Album => "favorite_albums = array_remove(favorite_albums, $2)",
            FavoriteKind::Artist => "favorite_artists = array_remove(favorite_artists, $2)",
        };
        let sql = format!("UPDATE users SET {set}, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_user).transpose()
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_artists(&self) -> StoreResult<Vec<Artist>> {
        let sql = format!("SELECT {ARTIST_COLUMNS} FROM artists ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, ArtistRow>(&sql).fetch_all(&self.pool).await?;
        self.hydrate_artists(rows).await
    }

    async fn artist_by_id(&self, id: Uuid) -> StoreResult<Option<Artist>> {
        let sql = format!("SELECT {ARTIST_COLUMNS} FROM artists WHERE id = $1");
        let row = sqlx::query_as::<_, ArtistRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.hydrate_artist(row).await
    }

    async fn artists_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Artist>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {ARTIST_COLUMNS} FROM artists WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, ArtistRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        let artists = self.hydrate_artists(rows).await?;
        Ok(in_id_order(ids, artists, |a| a.id))
    }

    async fn insert_artist(&self, artist: NewArtist) -> StoreResult<Artist> {
        let sql = format!(
            "INSERT INTO artists (id, name, country, genre, image) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ARTIST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ArtistRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&artist.name)
            .bind(&artist.country)
            .bind(&artist.genre)
            .bind(&artist.image)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.into_artist(Vec::new()))
    }

    async fn update_artist(&self, id: Uuid, changes: ArtistChanges) -> StoreResult<Option<Artist>> {
        let sql = format!(
            "UPDATE artists SET \
                name = COALESCE($2, name), \
                country = COALESCE($3, country), \
                genre = COALESCE($4, genre), \
                image = COALESCE($5, image), \
                updated_at = now() \
             WHERE id = $1 RETURNING {ARTIST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ArtistRow>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.country)
            .bind(changes.genre)
            .bind(changes.image)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        self.hydrate_artist(row).await
    }

    async fn delete_artist(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM artists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_albums(&self) -> StoreResult<Vec<Album>> {
        let sql = format!("SELECT {ALBUM_COLUMNS} FROM albums ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, AlbumRow>(&sql).fetch_all(&self.pool).await?;
        self.hydrate_albums(rows).await
    }

    async fn albums_by_artist(&self, artist_id: Uuid) -> StoreResult<Vec<Album>> {
        let sql = format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE artist_id = $1 ORDER BY year, created_at");
        let rows = sqlx::query_as::<_, AlbumRow>(&sql)
            .bind(artist_id)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate_albums(rows).await
    }

    async fn album_by_id(&self, id: Uuid) -> StoreResult<Option<Album>> {
        let sql = format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE id = $1");
        let row = sqlx::query_as::<_, AlbumRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.hydrate_album(row).await
    }

    async fn albums_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Album>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, AlbumRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        let albums = self.hydrate_albums(rows).await?;
        Ok(in_id_order(ids, albums, |a| a.id))
    }

    async fn insert_album(&self, album: NewAlbum) -> StoreResult<Album> {
        let sql = format!(
            "INSERT INTO albums (id, title, artist_id, year, cover, genre, tracklist) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ALBUM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AlbumRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&album.title)
            .bind(album.artist_id)
            .bind(album.year)
            .bind(&album.cover)
            .bind(&album.genre)
            .bind(&album.tracklist)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.into_album(Vec::new()))
    }

    async fn update_album(&self, id: Uuid, changes: AlbumChanges) -> StoreResult<Option<Album>> {
        let sql = format!(
            "UPDATE albums SET \
                title = COALESCE($2, title), \
                artist_id = COALESCE($3, artist_id), \
                year = COALESCE($4, year), \
                cover = COALESCE($5, cover), \
                genre = COALESCE($6, genre), \
                tracklist = COALESCE($7, tracklist), \
                updated_at = now() \
             WHERE id = $1 RETURNING {ALBUM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AlbumRow>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.artist_id)
            .bind(changes.year)
            .bind(changes.cover)
            .bind(changes.genre)
            .bind(changes.tracklist)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        self.hydrate_album(row).await
    }

    async fn delete_album(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM albums WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, query: &str) -> StoreResult<SearchResults> {
        let pattern = like_pattern(query);

        let artist_sql = format!(
            "SELECT {ARTIST_COLUMNS} FROM artists WHERE name ILIKE $1 ESCAPE '\\' ORDER BY name"
        );
        let artist_rows = sqlx::query_as::<_, ArtistRow>(&artist_sql)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;

        let album_sql = format!(
            "SELECT {ALBUM_COLUMNS} FROM albums WHERE title ILIKE $1 ESCAPE '\\' ORDER BY title"
        );
        let album_rows = sqlx::query_as::<_, AlbumRow>(&album_sql)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;

        Ok(SearchResults {
            artists: self.hydrate_artists(artist_rows).await?,
            albums: self.hydrate_albums(album_rows).await?,
        })
    }

    async fn add_embedded_review(
        &self,
        target: ReviewTarget,
        review: NewEmbeddedReview,
    ) -> StoreResult<Option<EmbeddedReview>> {
        // Inserting through a SELECT on the parent yields no row when the parent is gone.
        let sql = match target {
            ReviewTarget::Artist(_) => {
                "INSERT INTO artist_reviews (id, artist_id, user_id, rating, comment) \
                 SELECT $1, a.id, $3, $4, $5 FROM artists a WHERE a.id = $2 \
                 RETURNING id, artist_id AS parent_id, user_id, comment, rating, created_at AS date"
            }
            ReviewTarget::Album(_) => {
                "INSERT INTO album_reviews (id, album_id, user_id, rating, comment) \
                 SELECT $1, a.id, $3, $4, $5 FROM albums a WHERE a.id = $2 \
                 RETURNING id, album_id AS parent_id, user_id, comment, rating, created_at AS date"
            }
        };
        let row = sqlx::query_as::<_, EmbeddedReviewRow>(sql)
            .bind(Uuid::new_v4())
            .bind(target.id())
            .bind(review.user_id)
            .bind(review.rating)
            .bind(&review.comment)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.map(EmbeddedReview::from))
    }

    async fn remove_embedded_review(&self, target: ReviewTarget, review_id: Uuid) -> StoreResult<bool> {
        let sql = match target {
            ReviewTarget::Artist(_) => "DELETE FROM artist_reviews WHERE id = $1 AND artist_id = $2",
            ReviewTarget::Album(_) => "DELETE FROM album_reviews WHERE id = $1 AND album_id = $2",
        };
        let result = sqlx::query(sql)
            .bind(review_id)
            .bind(target.id())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct ReviewWithAuthorRow {
    id: Uuid,
    user_id: Uuid,
    album_id: Uuid,
    rating: i16,
    comment: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    author_username: Option<String>,
    author_avatar: Option<String>,
}

impl From<ReviewWithAuthorRow> for ReviewWithAuthor {
    fn from(row: ReviewWithAuthorRow) -> Self {
        let author = match (row.author_username, row.author_avatar) {
            (Some(username), avatar) => Some(ReviewAuthor {
                id: row.user_id,
                username,
                avatar: avatar.unwrap_or_default(),
            }),
            _ => None,
        };
        ReviewWithAuthor {
            review: Review {
                id: row.id,
                user_id: row.user_id,
                album_id: row.album_id,
                rating: row.rating,
                comment: row.comment,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            author,
        }
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn insert_review(&self, review: NewReview) -> StoreResult<Review> {
        let sql = format!(
            "INSERT INTO reviews (id, user_id, album_id, rating, comment) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {REVIEW_COLUMNS}"
        );
        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(Uuid::new_v4())
            .bind(review.user_id)
            .bind(review.album_id)
            .bind(review.rating)
            .bind(&review.comment)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(review)
    }

    async fn reviews_for_album(&self, album_id: Uuid) -> StoreResult<Vec<ReviewWithAuthor>> {
        let rows = sqlx::query_as::<_, ReviewWithAuthorRow>(
            "SELECT r.id, r.user_id, r.album_id, r.rating, r.comment, r.created_at, r.updated_at, \
                    u.username AS author_username, u.avatar AS author_avatar \
             FROM reviews r LEFT JOIN users u ON u.id = r.user_id \
             WHERE r.album_id = $1 ORDER BY r.created_at DESC, r.id",
        )
        .bind(album_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ReviewWithAuthor::from).collect())
    }

    async fn delete_review_by_owner(&self, review_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1 AND user_id = $2")
            .bind(review_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_review(&self, review_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }

    #[test]
    fn id_order_follows_the_request_and_skips_missing() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let found = vec![b, a];
        let ordered = in_id_order(&[a, c, b], found, |id| *id);
        assert_eq!(ordered, vec![a, b]);
    }
}
