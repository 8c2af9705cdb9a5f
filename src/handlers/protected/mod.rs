// handlers/protected/mod.rs - Handlers behind the JWT gate
//
// Every handler here receives the verified caller as `Extension<AuthUser>`.
// Self-only and self-or-admin checks happen in the services.

pub mod accounts;
pub mod reviews;
pub mod users;
