use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::models::{Album, Artist, NewAlbum, NewArtist, NewUser, User};
use crate::database::{CatalogStore, MemoryStore, UserStore};
use crate::state::AppState;
use crate::types::Role;

/// Password every seeded account is created with
pub const TEST_PASSWORD: &str = "password123";

/// Development profile with cheap Argon2 parameters so hashing stays fast in tests.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.token_secret = "unit-test-secret".to_string();
    config.security.password_hash_memory_kib = 8;
    config.security.password_hash_iterations = 1;
    config
}

/// Fresh state over an empty in-memory store
pub fn test_state() -> AppState {
    AppState::new(test_config(), Arc::new(MemoryStore::new())).expect("test state")
}

/// Inserts an account directly, bypassing signup validation. Email is `<username>@example.com`.
pub async fn seed_user(state: &AppState, username: &str, role: Role) -> User {
    let password_hash = state.hasher.hash(TEST_PASSWORD).expect("hash test password");
    state
        .store
        .insert_user(NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash,
            avatar: String::new(),
            role,
        })
        .await
        .expect("seed user")
}

pub async fn seed_artist(state: &AppState, name: &str) -> Artist {
    state
        .store
        .insert_artist(NewArtist {
            name: name.to_string(),
            country: String::new(),
            genre: "Electronic".to_string(),
            image: String::new(),
        })
        .await
        .expect("seed artist")
}

pub async fn seed_album(state: &AppState, artist_id: uuid::Uuid, title: &str) -> Album {
    state
        .store
        .insert_album(NewAlbum {
            title: title.to_string(),
            artist_id,
            year: 1998,
            cover: String::new(),
            genre: "Electronic".to_string(),
            tracklist: vec![],
        })
        .await
        .expect("seed album")
}
