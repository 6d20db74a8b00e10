use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Admin Router Module
///
/// Everything the operator console needs: category and content management
/// across the six content types, user/admin account administration, the
/// access-grant editor (bulk replace + individual revoke), dashboard
/// counters, chat-button settings and the media upload pipeline.
///
/// Access Control:
/// This router is nested under `/admin` behind the authentication layer;
/// every handler additionally requires the admin capability
/// (`AuthUser::require_admin`) and rejects regular users with 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // --- Categories ---
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        // --- Content, generic over the six types ---
        // The {content_type} segment is one of: audio, audio_cloud, pdf,
        // pdf_cloud, video, file_cloud.
        .route(
            "/content/{content_type}",
            get(handlers::list_content).post(handlers::create_content),
        )
        .route(
            "/content/{content_type}/{id}",
            put(handlers::update_content).delete(handlers::delete_content),
        )
        // --- User accounts ---
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/{id}",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        // --- Access grants ---
        // GET returns all six grant sets for the edit form; PUT is the bulk
        // replace for one (user, type); DELETE revokes a single grant.
        .route("/users/{id}/access", get(handlers::get_user_access))
        .route(
            "/users/{id}/access/{content_type}",
            put(handlers::replace_user_access),
        )
        .route(
            "/access/{content_type}/{grant_id}",
            delete(handlers::revoke_access),
        )
        // --- Admin accounts ---
        .route(
            "/admins",
            get(handlers::list_admins).post(handlers::create_admin),
        )
        .route("/admins/{id}", delete(handlers::delete_admin))
        // --- Dashboard, settings, uploads ---
        .route("/stats", get(handlers::get_admin_stats))
        .route(
            "/settings/chat",
            get(handlers::get_chat_settings).put(handlers::update_chat_settings),
        )
        .route("/upload/presigned", post(handlers::get_presigned_url))
}
