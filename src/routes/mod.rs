/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly at the module level (via Axum layers
/// and handler-level capability checks), preventing accidental exposure of
/// protected endpoints.

/// Routes accessible to anonymous clients: health probe and the two login
/// gateways.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware. Any valid subject
/// (user or admin) may call these.
pub mod authenticated;

/// Routes restricted to subjects holding the admin capability. Every handler
/// performs the capability check itself.
pub mod admin;
