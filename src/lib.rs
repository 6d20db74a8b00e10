use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod messaging;
pub mod models;
pub mod repository;
pub mod resolver;
pub mod storage;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point.
pub use config::AppConfig;
pub use errors::{ApiError, ApiResult};
pub use repository::{PostgresRepository, Repository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the
/// application by aggregating every `#[utoipa::path]` handler and every
/// schema used in request/response bodies. Served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login_user, handlers::login_admin,
        handlers::get_me, handlers::get_my_access, handlers::get_chat_link,
        handlers::list_categories, handlers::create_category,
        handlers::update_category, handlers::delete_category,
        handlers::list_content, handlers::create_content,
        handlers::update_content, handlers::delete_content,
        handlers::list_users, handlers::create_user,
        handlers::update_user, handlers::delete_user,
        handlers::get_user_access, handlers::replace_user_access,
        handlers::revoke_access,
        handlers::list_admins, handlers::create_admin, handlers::delete_admin,
        handlers::get_admin_stats,
        handlers::get_chat_settings, handlers::update_chat_settings,
        handlers::get_presigned_url,
    ),
    components(
        schemas(
            models::ContentType, models::Category, models::AudioItem, models::PdfItem,
            models::VideoItem, models::FileItem, models::UserAccount, models::AdminAccount,
            models::AccessGrant, models::PortalSetting, models::Subject,
            models::LoginRequest, models::AdminLoginRequest, models::LoginResponse,
            models::CreateCategoryRequest, models::UpdateCategoryRequest,
            models::CreateContentRequest, models::UpdateContentRequest,
            models::CreateUserRequest, models::UpdateUserRequest,
            models::CreateAdminRequest, models::ReplaceAccessRequest,
            models::ChatSettingsRequest, models::ChatSettings,
            models::PresignedUrlRequest, models::PresignedUrlResponse,
            models::ContentItem, models::GrantSets, models::ContentLibrary,
            models::AccessCounts, models::ResolvedAccess, models::MeResponse,
            models::ChatLinkResponse, models::DashboardStats,
            storage::MediaKind,
        )
    ),
    tags(
        (name = "media-portal", description = "Gated media portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The **Unified State Pattern**: a single, thread-safe, immutable container
/// holding all essential application services and configuration, shared
/// across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Entity Store + Access Relation Store behind one trait.
    pub repo: RepositoryState,
    /// Storage Layer: media upload pipeline (presigned URLs, public URLs).
    pub storage: StorageState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These allow handlers and extractors to selectively pull components from the
// shared AppState, keeping dependency boundaries explicit.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for protected route groups by running the
/// `AuthUser` extractor; a failed extraction rejects the request with 401
/// before any handler executes.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no middleware applied.
        .merge(public::public_routes())
        // Authenticated routes: protected by the auth middleware.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Admin routes: nested under '/admin'. The admin capability check is
        // performed inside every handler after authentication.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Apply the unified state to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation: unique UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing: span per request, correlated by the id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS layer (applied last).
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the `TraceLayer` span: includes the generated `x-request-id`
/// alongside the HTTP method and URI so every log line for a single request
/// is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
