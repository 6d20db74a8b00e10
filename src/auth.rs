use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::{
    config::{AppConfig, Env},
    errors::{ApiError, ApiResult},
    models::Subject,
    repository::RepositoryState,
};

// Session lifetime. The client holds the token for continuity across visits,
// so it is deliberately long-lived; revocation happens by deactivating or
// deleting the account, which the extractor re-checks on every request.
const SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 30;

/// Claims
///
/// Payload of the signed session token handed out at login. The token is the
/// explicit client-side session boundary: the subject is re-resolved from the
/// store on every request, so the claims only need to say who and which realm.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the account id in either `users` or `admins`.
    pub sub: i64,
    /// Which realm `sub` belongs to: admin accounts and user accounts have
    /// independent id spaces.
    pub admin: bool,
    /// Expiration Time (exp): timestamp after which the token is rejected.
    pub exp: usize,
    /// Issued At (iat): timestamp when the token was issued.
    pub iat: usize,
}

/// issue_session_token
///
/// Signs a session token for a freshly authenticated subject.
pub fn issue_session_token(subject: &Subject, secret: &str) -> ApiResult<String> {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs();

    let claims = Claims {
        sub: subject.id,
        admin: subject.is_admin,
        iat: now as usize,
        exp: (now + SESSION_TTL_SECS) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    // Signing only fails on malformed key material; surface it as a generic
    // rejection rather than leaking signer internals.
    .map_err(|_| ApiError::Unauthorized)
}

/// authenticate_user
///
/// The end-user login check: find the account by phone number (stored in
/// `username`), compare the access code for exact equality, and require the
/// account to be active. Every failure collapses into the same generic
/// `Unauthorized` so callers cannot distinguish "unknown phone" from "wrong
/// code" from "deactivated" (no account enumeration).
pub async fn authenticate_user(
    repo: &RepositoryState,
    phone: &str,
    access_code: &str,
) -> ApiResult<Subject> {
    let account = repo
        .find_user_by_username(phone)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if account.access_code != access_code || !account.is_active {
        return Err(ApiError::Unauthorized);
    }

    Ok(Subject {
        id: account.id,
        is_admin: false,
        name: account.name,
        permissions: Subject::user_permissions(),
    })
}

/// authenticate_admin
///
/// The operator login check: email plus access code, same flat equality and
/// the same generic failure.
pub async fn authenticate_admin(
    repo: &RepositoryState,
    email: &str,
    access_code: &str,
) -> ApiResult<Subject> {
    let account = repo
        .find_admin_by_email(email)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if account.access_code != access_code {
        return Err(ApiError::Unauthorized);
    }

    Ok(Subject {
        id: account.id,
        is_admin: true,
        name: None,
        permissions: Subject::admin_permissions(),
    })
}

/// AuthUser
///
/// The resolved identity of an authenticated request, produced by the
/// extractor below and handed to handlers as a plain argument. Handlers pass
/// it (as a `Subject`) into the Resolver explicitly; there is no ambient
/// "current user" anywhere in the process.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub is_admin: bool,
    pub name: Option<String>,
    pub permissions: Vec<String>,
}

impl AuthUser {
    /// The subject this request acts as, for resolver/capability calls.
    pub fn subject(&self) -> Subject {
        Subject {
            id: self.id,
            is_admin: self.is_admin,
            name: self.name.clone(),
            permissions: self.permissions.clone(),
        }
    }

    /// Capability gate for admin-only handlers.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any protected handler. The process:
/// 1. Dependency Resolution: Repository and AppConfig from the app state.
/// 2. Local Bypass: `x-user-id` / `x-admin-id` headers, Env::Local only.
/// 3. Token Validation: Bearer extraction and session token decoding.
/// 4. Store Lookup: the account must still exist (and, for users, still be
///    active). A valid token for a deleted or deactivated account is dead.
///
/// Rejection: 401 on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Local Development Bypass: a bare account id in a header stands in
        // for a session, but the account must exist in the local store so
        // the realm and activity flags are real.
        if config.env == Env::Local {
            if let Some(id) = header_id(parts, "x-user-id") {
                if let Ok(Some(user)) = repo.get_user(id).await {
                    if user.is_active {
                        return Ok(AuthUser {
                            id: user.id,
                            is_admin: false,
                            name: user.name,
                            permissions: Subject::user_permissions(),
                        });
                    }
                }
            }
            if let Some(id) = header_id(parts, "x-admin-id") {
                if let Ok(Some(admin)) = repo.get_admin(id).await {
                    return Ok(AuthUser {
                        id: admin.id,
                        is_admin: true,
                        name: None,
                        permissions: Subject::admin_permissions(),
                    });
                }
            }
        }
        // In Production, or when the bypass did not resolve, fall through to
        // standard token validation.

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let decoding_key = DecodingKey::from_secret(config.session_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            // Expired, malformed and forged tokens all collapse to 401.
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        let claims = token_data.claims;

        // Final verification against the store: the session is only as alive
        // as the account behind it.
        if claims.admin {
            let admin = repo
                .get_admin(claims.sub)
                .await
                .map_err(|_| StatusCode::UNAUTHORIZED)?
                .ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(AuthUser {
                id: admin.id,
                is_admin: true,
                name: None,
                permissions: Subject::admin_permissions(),
            })
        } else {
            let user = repo
                .get_user(claims.sub)
                .await
                .map_err(|_| StatusCode::UNAUTHORIZED)?
                .ok_or(StatusCode::UNAUTHORIZED)?;
            if !user.is_active {
                return Err(StatusCode::UNAUTHORIZED);
            }
            Ok(AuthUser {
                id: user.id,
                is_admin: false,
                name: user.name,
                permissions: Subject::user_permissions(),
            })
        }
    }
}

fn header_id(parts: &Parts, name: &str) -> Option<i64> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}
