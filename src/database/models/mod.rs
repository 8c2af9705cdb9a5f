pub mod album;
pub mod artist;
pub mod review;
pub mod user;

pub use album::{Album, AlbumChanges, AlbumDetails, AlbumRow, NewAlbum};
pub use artist::{Artist, ArtistChanges, ArtistRow, NewArtist};
pub use review::{
    EmbeddedReview, EmbeddedReviewRow, NewEmbeddedReview, NewReview, Review, ReviewAuthor, ReviewTarget,
    ReviewWithAuthor,
};
pub use user::{NewUser, PopulatedUser, User, UserChanges, UserProfile, UserRow, UserSummary};

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
}
