use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::{
    Album, AlbumChanges, AlbumDetails, Artist, ArtistChanges, EmbeddedReview, NewAlbum, NewArtist,
    NewEmbeddedReview, ReviewTarget, SearchResults,
};
use crate::database::{CatalogStore, Store};
use crate::error::ApiError;

use super::validation::{
    non_blank, optional, parse_id, required, validate_album_year, validate_rating, EMBEDDED_RATING,
};

#[derive(Debug, Default, Deserialize)]
pub struct ArtistInput {
    pub name: Option<String>,
    pub country: Option<String>,
    pub genre: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlbumInput {
    pub title: Option<String>,
    /// Artist id
    pub artist: Option<String>,
    pub year: Option<i64>,
    pub cover: Option<String>,
    pub genre: Option<String>,
    pub tracklist: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmbeddedReviewInput {
    pub rating: Option<f64>,
    pub comment: Option<String>,
}

fn album_year(year: i64) -> Result<i32, ApiError> {
    let year = i32::try_from(year).map_err(|_| ApiError::invalid_field("year", "Year is out of range"))?;
    validate_album_year(year)?;
    Ok(year)
}

/// Drops blank entries and trims the rest.
fn clean_tracklist(tracks: Vec<String>) -> Vec<String> {
    tracks
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Artists, albums, search and the reviews embedded in them
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn with_artist(&self, album: Album) -> Result<AlbumDetails, ApiError> {
        let artist = self.store.artist_by_id(album.artist_id).await?;
        Ok(AlbumDetails { album, artist })
    }

    pub async fn list_artists(&self) -> Result<Vec<Artist>, ApiError> {
        Ok(self.store.list_artists().await?)
    }

    pub async fn get_artist(&self, id: Uuid) -> Result<Artist, ApiError> {
        self.store
            .artist_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Artist not found"))
    }

    pub async fn albums_for_artist(&self, artist_id: Uuid) -> Result<Vec<Album>, ApiError> {
        self.get_artist(artist_id).await?;
        Ok(self.store.albums_by_artist(artist_id).await?)
    }

    pub async fn create_artist(&self, input: ArtistInput) -> Result<Artist, ApiError> {
        let artist = NewArtist {
            name: required("name", input.name)?,
            genre: required("genre", input.genre)?,
            country: optional(input.country).unwrap_or_default(),
            image: optional(input.image).unwrap_or_default(),
        };
        let artist = self.store.insert_artist(artist).await?;
        info!(artist_id = %artist.id, "Artist created: {}", artist.name);
        Ok(artist)
    }

    pub async fn update_artist(&self, id: Uuid, input: ArtistInput) -> Result<Artist, ApiError> {
        let changes = ArtistChanges {
            name: non_blank("name", input.name)?,
            genre: non_blank("genre", input.genre)?,
            country: input.country.map(|c| c.trim().to_string()),
            image: input.image.map(|i| i.trim().to_string()),
        };
        let artist = self
            .store
            .update_artist(id, changes)
            .await?
            .ok_or_else(|| ApiError::not_found("Artist not found"))?;
        info!(artist_id = %id, "Artist updated");
        Ok(artist)
    }

    /// Also removes the artist's albums.
    pub async fn delete_artist(&self, id: Uuid) -> Result<(), ApiError> {
        if !self.store.delete_artist(id).await? {
            return Err(ApiError::not_found("Artist not found"));
        }
        info!(artist_id = %id, "Artist deleted");
        Ok(())
    }

    pub async fn list_albums(&self) -> Result<Vec<AlbumDetails>, ApiError> {
        let albums = self.store.list_albums().await?;
        let artist_ids: Vec<Uuid> = albums.iter().map(|a| a.artist_id).collect();
        let artists = self.store.artists_by_ids(&artist_ids).await?;

        Ok(albums
            .into_iter()
            .map(|album| {
                let artist = artists.iter().find(|a| a.id == album.artist_id).cloned();
                AlbumDetails { album, artist }
            })
            .collect())
    }

    pub async fn get_album(&self, id: Uuid) -> Result<AlbumDetails, ApiError> {
        let album = self
            .store
            .album_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Album not found"))?;
        self.with_artist(album).await
    }

    pub async fn create_album(&self, input: AlbumInput) -> Result<AlbumDetails, ApiError> {
        let title = required("title", input.title)?;
        let artist_id = parse_id("artist", &required("artist", input.artist)?)?;
        let year = album_year(input.year.ok_or_else(|| ApiError::missing_field("year"))?)?;
        let genre = required("genre", input.genre)?;

        let album = self
            .store
            .insert_album(NewAlbum {
                title,
                artist_id,
                year,
                cover: optional(input.cover).unwrap_or_default(),
                genre,
                tracklist: clean_tracklist(input.tracklist.unwrap_or_default()),
            })
            .await?;

        info!(album_id = %album.id, artist_id = %artist_id, "Album created: {}", album.title);
        self.with_artist(album).await
    }

    pub async fn update_album(&self, id: Uuid, input: AlbumInput) -> Result<AlbumDetails, ApiError> {
        let artist_id = match non_blank("artist", input.artist)? {
            Some(raw) => Some(parse_id("artist", &raw)?),
            None => None,
        };
        let changes = AlbumChanges {
            title: non_blank("title", input.title)?,
            artist_id,
            year: input.year.map(album_year).transpose()?,
            cover: input.cover.map(|c| c.trim().to_string()),
            genre: non_blank("genre", input.genre)?,
            tracklist: input.tracklist.map(clean_tracklist),
        };

        let album = self
            .store
            .update_album(id, changes)
            .await?
            .ok_or_else(|| ApiError::not_found("Album not found"))?;
        info!(album_id = %id, "Album updated");
        self.with_artist(album).await
    }

    pub async fn delete_album(&self, id: Uuid) -> Result<(), ApiError> {
        if !self.store.delete_album(id).await? {
            return Err(ApiError::not_found("Album not found"));
        }
        info!(album_id = %id, "Album deleted");
        Ok(())
    }

    /// Blank queries match nothing.
    pub async fn search(&self, query: Option<&str>) -> Result<SearchResults, ApiError> {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => Ok(self.store.search(q).await?),
            None => Ok(SearchResults::default()),
        }
    }

    /// The author is always the verified caller; the body cannot choose it.
    pub async fn add_review(
        &self,
        caller: AuthUser,
        target: ReviewTarget,
        input: EmbeddedReviewInput,
    ) -> Result<EmbeddedReview, ApiError> {
        let rating = validate_rating(input.rating, EMBEDDED_RATING)?;
        let comment = required("comment", input.comment)?;

        let review = self
            .store
            .add_embedded_review(
                target,
                NewEmbeddedReview {
                    user_id: caller.user_id,
                    rating,
                    comment,
                },
            )
            .await?
            .ok_or_else(|| ApiError::not_found(format!("{} not found", target.label())))?;

        info!(review_id = %review.id, parent = %target.id(), "{} review added", target.label());
        Ok(review)
    }

    pub async fn delete_review(&self, target: ReviewTarget, review_id: Uuid) -> Result<(), ApiError> {
        if !self.store.remove_embedded_review(target, review_id).await? {
            return Err(ApiError::not_found("Review not found"));
        }
        info!(review_id = %review_id, parent = %target.id(), "{} review deleted", target.label());
        Ok(())
    }
}
