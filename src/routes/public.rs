use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints the gateway answers itself. All of them sit under public prefixes (or
/// on the guard's exclusion list), so they are reachable with or without a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe. Excluded from the guard so probes are never redirected.
        .route("/health", get(|| async { "ok" }))
        // GET /api/auth/session
        // The caller's decoded session: role, default route, subject, expiry.
        .route("/api/auth/session", get(handlers::get_session))
        // GET /api/public/menu?path=...
        // The administration sidebar with active/open state for the given path.
        .route("/api/public/menu", get(handlers::get_menu))
}
