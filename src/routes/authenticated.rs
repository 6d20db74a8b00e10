use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes for any subject that passed the authentication layer: regular
/// users and admins alike. What a subject actually *sees* through these
/// endpoints is decided by the capability model: admins get the unrestricted
/// view, users get whatever their category grants resolve to.
///
/// Access Control Strategy:
/// Every handler here relies on the `AuthUser` extractor middleware being
/// layered above this module, guaranteeing a validated subject.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The resolved subject plus a one-line access summary for the
        // welcome card.
        .route("/me", get(handlers::get_me))
        // GET /me/access
        // The capability-resolved view: six filtered content lists, the
        // available tabs in fixed precedence order, per-type category counts.
        // The client renders its tab bar straight from this response.
        .route("/me/access", get(handlers::get_my_access))
        // GET /me/chat-link
        // Deep link that opens an external chat with the operator-configured
        // destination and pre-filled message body.
        .route("/me/chat-link", get(handlers::get_chat_link))
}
