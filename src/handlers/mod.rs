// handlers/mod.rs - 3-tier handler layout
//
// Public (no auth) -> Protected (JWT auth) -> Elevated (JWT auth + admin role).
// Route tables live in app.rs; each tier there gets its gates as route layers.

pub mod elevated;
pub mod protected;
pub mod public;
