// Router assembly: route tables per tier, gates and global layers

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Uri},
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin_middleware};
use crate::state::AppState;

/// Builds the full application router over `state`.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .merge(elevated_routes(state.clone()))
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if let Some(cors) = cors_layer(&config) {
        router = router.layer(cors);
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        // Token acquisition
        .route("/auth/signup", post(public::accounts::signup))
        .route("/auth/login", post(public::accounts::login))
        // Catalog reads
        .route("/artists", get(public::catalog::list_artists))
        .route("/artists/:id", get(public::catalog::get_artist))
        .route("/artists/:id/albums", get(public::catalog::artist_albums))
        .route("/albums", get(public::catalog::list_albums))
        .route("/albums/:id", get(public::catalog::get_album))
        .route("/search", get(public::catalog::search))
        .route("/reviews/album/:id", get(public::reviews::album_reviews))
}

/// Any authenticated caller; ownership is checked per operation.
fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{accounts, reviews, users};

    Router::new()
        .route("/auth/verify", get(accounts::verify))
        // Self-service
        .route("/users/:id", get(users::get_user).put(users::update_profile))
        .route("/users/:id/change-password", put(users::change_password))
        .route(
            "/users/:id/favorites/albums/:item_id",
            post(users::add_favorite_album).delete(users::remove_favorite_album),
        )
        .route(
            "/users/:id/favorites/artists/:item_id",
            post(users::add_favorite_artist).delete(users::remove_favorite_artist),
        )
        // Reviews
        .route("/artists/:id/reviews", post(reviews::review_artist))
        .route("/albums/:id/reviews", post(reviews::review_album))
        .route("/reviews", post(reviews::create_review))
        .route("/reviews/:id", delete(reviews::delete_own_review))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

/// Admin only. The admin gate is added first so it runs after authentication.
fn elevated_routes(state: AppState) -> Router<AppState> {
    use elevated::{catalog, reviews, users};

    Router::new()
        // Accounts
        .route("/users", get(users::list_users))
        .route("/users/:id", patch(users::admin_update).delete(users::delete_user))
        // Catalog writes
        .route("/artists", post(catalog::create_artist))
        .route("/artists/:id", put(catalog::update_artist).delete(catalog::delete_artist))
        .route("/albums", post(catalog::create_album))
        .route("/albums/:id", put(catalog::update_album).delete(catalog::delete_album))
        // Moderation
        .route(
            "/artists/:id/reviews/:review_id",
            delete(catalog::delete_artist_review),
        )
        .route(
            "/albums/:id/reviews/:review_id",
            delete(catalog::delete_album_review),
        )
        .route("/reviews/admin/:id", delete(reviews::delete_any_review))
        .route_layer(middleware::from_fn(require_admin_middleware))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }
    if config.is_development() {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

async fn fallback(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
