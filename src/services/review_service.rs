use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::{NewReview, Review, ReviewWithAuthor};
use crate::database::{ReviewStore, Store};
use crate::error::ApiError;

use super::validation::{optional, parse_id, required, validate_comment_length, validate_rating, STANDALONE_RATING};

#[derive(Debug, Default, Deserialize)]
pub struct ReviewInput {
    /// Album id
    pub album: Option<String>,
    pub rating: Option<f64>,
    pub comment: Option<String>,
}

/// Standalone album reviews
pub struct ReviewService {
    store: Arc<dyn Store>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, caller: AuthUser, input: ReviewInput) -> Result<Review, ApiError> {
        let album_id = parse_id("album", &required("album", input.album)?)?;
        let rating = validate_rating(input.rating, STANDALONE_RATING)?;
        let comment = optional(input.comment);
        if let Some(comment) = &comment {
            validate_comment_length(comment)?;
        }

        let review = self
            .store
            .insert_review(NewReview {
                user_id: caller.user_id,
                album_id,
                rating,
                comment,
            })
            .await?;

        info!(review_id = %review.id, album_id = %album_id, user_id = %caller.user_id, "Review created");
        Ok(review)
    }

    /// Newest first. An unknown album simply has no reviews.
    pub async fn list_for_album(&self, album_id: Uuid) -> Result<Vec<ReviewWithAuthor>, ApiError> {
        Ok(self.store.reviews_for_album(album_id).await?)
    }

    /// Owner-only delete. A review that is absent or authored by someone else is reported
    /// as not found and left untouched.
    pub async fn delete_own(&self, caller: AuthUser, review_id: Uuid) -> Result<(), ApiError> {
        if !self.store.delete_review_by_owner(review_id, caller.user_id).await? {
            warn!(review_id = %review_id, user_id = %caller.user_id, "Owner delete matched no review");
            return Err(ApiError::not_found("Review not found"));
        }
        info!(review_id = %review_id, user_id = %caller.user_id, "Review deleted by owner");
        Ok(())
    }

    pub async fn delete_any(&self, caller: AuthUser, review_id: Uuid) -> Result<(), ApiError> {
        caller.require_admin()?;
        if !self.store.delete_review(review_id).await? {
            return Err(ApiError::not_found("Review not found"));
        }
        info!(review_id = %review_id, by = %caller.user_id, "Review deleted by admin");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_album, seed_artist, seed_user, test_state};
    use crate::types::Role;

    fn input(album: Uuid, rating: f64) -> ReviewInput {
        ReviewInput {
            album: Some(album.to_string()),
            rating: Some(rating),
            comment: Some("Still sounds like the future".to_string()),
        }
    }

    #[tokio::test]
    async fn reviews_use_the_ten_point_scale() {
        let state = test_state();
        let user = seed_user(&state, "listener", Role::User).await;
        let artist = seed_artist(&state, "DJ Shadow").await;
        let album = seed_album(&state, artist.id, "Endtroducing").await;
        let reviews = state.reviews();
        let caller = AuthUser::new(user.id, Role::User);

        let review = reviews.create(caller, input(album.id, 10.0)).await.unwrap();
        assert_eq!(review.rating, 10);
        assert_eq!(review.user_id, user.id);

        let err = reviews.create(caller, input(album.id, 11.0)).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RATING");

        let mut long = input(album.id, 5.0);
        long.comment = Some("x".repeat(1001));
        assert_eq!(reviews.create(caller, long).await.unwrap_err().error_code(), "VALIDATION_ERROR");

        let err = reviews.create(caller, input(Uuid::new_v4(), 5.0)).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn only_the_author_can_delete_through_the_owner_path() {
        let state = test_state();
        let author = seed_user(&state, "author", Role::User).await;
        let other = seed_user(&state, "other", Role::User).await;
        let admin = seed_user(&state, "root", Role::Admin).await;
        let artist = seed_artist(&state, "Moby").await;
        let album = seed_album(&state, artist.id, "Play").await;
        let reviews = state.reviews();

        let review = reviews
            .create(AuthUser::new(author.id, Role::User), input(album.id, 6.0))
            .await
            .unwrap();

        let err = reviews
            .delete_own(AuthUser::new(other.id, Role::User), review.id)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(reviews.list_for_album(album.id).await.unwrap().len(), 1);

        let err = reviews
            .delete_any(AuthUser::new(other.id, Role::User), review.id)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");

        reviews
            .delete_any(AuthUser::new(admin.id, Role::Admin), review.id)
            .await
            .unwrap();
        assert!(reviews.list_for_album(album.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_is_newest_first_with_authors() {
        let state = test_state();
        let user = seed_user(&state, "listener", Role::User).await;
        let artist = seed_artist(&state, "Lamb").await;
        let album = seed_album(&state, artist.id, "Fear of Fours").await;
        let reviews = state.reviews();
        let caller = AuthUser::new(user.id, Role::User);

        let first = reviews.create(caller, input(album.id, 7.0)).await.unwrap();
        let second = reviews.create(caller, input(album.id, 8.0)).await.unwrap();

        let listed = reviews.list_for_album(album.id).await.unwrap();
        assert_eq!(listed[0].review.id, second.id);
        assert_eq!(listed[1].review.id, first.id);
        assert_eq!(listed[0].author.as_ref().unwrap().username, "listener");
    }
}
