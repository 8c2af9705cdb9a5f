pub mod account_service;
pub mod catalog_service;
pub mod review_service;
pub mod user_service;
pub mod validation;

pub use account_service::{AccountService, LoginRequest, LoginResponse, SignupRequest};
pub use catalog_service::{AlbumInput, ArtistInput, CatalogService, EmbeddedReviewInput};
pub use review_service::{ReviewInput, ReviewService};
pub use user_service::{AdminUserUpdate, PasswordChange, ProfileUpdate, UserService};
