use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. There is deliberately no data
/// retrieval here: an anonymous subject resolves to an empty view, so the
/// only useful anonymous operations are the health probe and logging in.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitors and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/login
        // End-user login: phone number + access code. All failures collapse
        // into one generic 401 (no account enumeration).
        .route("/auth/login", post(handlers::login_user))
        // POST /auth/admin/login
        // Operator login: email + access code, same failure shape.
        .route("/auth/admin/login", post(handlers::login_admin))
}
