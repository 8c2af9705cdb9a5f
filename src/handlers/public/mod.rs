// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, catalog browsing, search and the album review feed.

pub mod accounts;
pub mod catalog;
pub mod reviews;
pub mod system;
