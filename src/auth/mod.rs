pub mod identity;
pub mod password;
pub mod token;

pub use identity::{Access, AuthUser};
pub use password::{PasswordError, PasswordHasher};
pub use token::{Claims, TokenCodec, TokenError, TOKEN_LIFETIME_HOURS};
