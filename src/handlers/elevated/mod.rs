// handlers/elevated/mod.rs - Admin-only handlers
//
// Reached only after both the JWT gate and the admin role gate have passed.

pub mod catalog;
pub mod reviews;
pub mod users;
