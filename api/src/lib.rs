//! REST API for tsundoku.
//!
//! Every route lives under `/api/v1`. Store operations are synchronous SQLite
//! work and run on tokio's blocking pool.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tsundoku_core::models::TargetKind;
use tsundoku_core::{ContentCatalog, Database, LibraryTracker, RankedFavoriteStore, ReviewStore};

pub use auth::{AuthGateway, AuthUser, Claims, CurrentUser, MaybeUser, DEFAULT_AUTH_COOKIE};
pub use error::ApiError;

/// Shared state for API handlers.
pub struct ApiState {
    pub db: Database,
    pub auth: AuthGateway,
    pub favorites: RankedFavoriteStore,
    pub catalog: ContentCatalog,
    pub reviews: ReviewStore,
    pub library: LibraryTracker,
}

impl ApiState {
    /// Wire the stores together; content deletion cascades into favorites.
    pub fn new(db: Database, auth: AuthGateway, lock_timeout: Duration) -> Self {
        let favorites = RankedFavoriteStore::new(db.clone(), lock_timeout);
        let catalog = ContentCatalog::new(db.clone()).with_listener(Arc::new(favorites.clone()));
        Self {
            reviews: ReviewStore::new(db.clone()),
            library: LibraryTracker::new(db.clone()),
            favorites,
            catalog,
            auth,
            db,
        }
    }
}

/// Build the API router with all routes.
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/api/v1/status", get(handlers::status::health))
        .route("/api/v1/stats", get(handlers::catalog::stats))
        // Favorites
        .route(
            "/api/v1/favorites",
            get(handlers::favorites::list_favorites).post(handlers::favorites::create_favorite),
        )
        .route("/api/v1/favorites/reorder", post(handlers::favorites::reorder_favorites))
        .route(
            "/api/v1/favorites/:id",
            get(handlers::favorites::get_favorite)
                .patch(handlers::favorites::update_favorite)
                .delete(handlers::favorites::delete_favorite),
        )
        // Likes
        .route("/api/v1/likes", get(handlers::likes::list_likes))
        .route("/api/v1/likes/toggle", post(handlers::likes::toggle_like))
        // Reviews
        .route(
            "/api/v1/reviews",
            get(handlers::reviews::list_reviews).post(handlers::reviews::create_review),
        )
        .route(
            "/api/v1/reviews/:id",
            get(handlers::reviews::get_review)
                .patch(handlers::reviews::update_review)
                .delete(handlers::reviews::delete_review),
        )
        // Library
        .route(
            "/api/v1/library",
            get(handlers::library::list_entries).post(handlers::library::create_entry),
        )
        .route("/api/v1/library/stats", get(handlers::library::stats))
        .route(
            "/api/v1/library/:id",
            get(handlers::library::get_entry)
                .patch(handlers::library::update_entry)
                .delete(handlers::library::delete_entry),
        )
        // Genres
        .route(
            "/api/v1/genres",
            get(handlers::catalog::list_genres).post(handlers::catalog::create_genre),
        );

    let router = handlers::catalog::content_routes(router, TargetKind::Comic, "/api/v1/comics");
    let router = handlers::catalog::content_routes(router, TargetKind::Novel, "/api/v1/novels");

    router
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %uuid::Uuid::new_v4(),
                    )
                })
                .on_request(())
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                        let status = response.status();
                        if !status.is_success() {
                            tracing::warn!(status = %status, latency_ms = latency.as_millis() as u64, "request failed");
                        }
                    },
                ),
        )
        .with_state(state)
}

/// Start the API server; returns when `shutdown` resolves.
pub async fn serve<F>(state: Arc<ApiState>, bind_addr: &str, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    tracing::info!("tsundoku API listening on {}", listener.local_addr()?);

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    Ok(())
}

