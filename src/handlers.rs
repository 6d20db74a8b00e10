use crate::{
    AppState,
    auth::{self, AuthUser},
    errors::{ApiError, ApiResult},
    messaging,
    models::{
        AccessGrant, AdminAccount, AdminLoginRequest, Category, ChatLinkResponse,
        ChatSettings, ChatSettingsRequest, ContentItem, ContentType, CreateAdminRequest,
        CreateCategoryRequest, CreateContentRequest, CreateUserRequest, DashboardStats, GrantSets,
        LoginRequest, LoginResponse, MeResponse, PresignedUrlRequest, PresignedUrlResponse,
        ReplaceAccessRequest, ResolvedAccess, UpdateCategoryRequest, UpdateContentRequest,
        UpdateUserRequest, UserAccount,
    },
    repository::{
        AudioPatch, FilePatch, NewAdmin, NewAudio, NewFile, NewPdf, NewUser, NewVideo, PdfPatch,
        UserPatch, VideoPatch,
    },
    resolver,
    storage::{StorageState, sanitize_key_segment},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

// --- Validation Helpers ---

/// Rejects blank required strings before any store call is made.
fn require(value: &str, what: &'static str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{what} is required")));
    }
    Ok(())
}

/// Resolves the media source for content creation: a pasted URL wins, an
/// upload key resolves to its public URL, and neither is a validation error:
/// the mutually-exclusive-inputs-both-empty case is rejected here, never
/// silently defaulted.
fn media_source(
    file_url: Option<String>,
    upload_key: Option<String>,
    storage: &StorageState,
) -> ApiResult<String> {
    let url = file_url.filter(|s| !s.trim().is_empty());
    let key = upload_key.filter(|s| !s.trim().is_empty());
    match (url, key) {
        (Some(url), _) => Ok(url),
        (None, Some(key)) => Ok(storage.public_url(&key)),
        (None, None) => Err(ApiError::Validation(
            "either a file URL or an uploaded file is required".to_string(),
        )),
    }
}

/// Optional-update variant: `None` when neither source field was supplied.
fn media_source_patch(
    file_url: Option<String>,
    upload_key: Option<String>,
    storage: &StorageState,
) -> ApiResult<Option<String>> {
    let url = file_url.filter(|s| !s.trim().is_empty());
    let key = upload_key.filter(|s| !s.trim().is_empty());
    if url.is_none() && key.is_none() {
        return Ok(None);
    }
    media_source(url, key, storage).map(Some)
}

// --- Identity Handlers ---

/// login_user
///
/// [Public Route] End-user login by phone number and access code. Any failure
/// (unknown phone, wrong code, deactivated account) yields the same generic
/// 401.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let subject = auth::authenticate_user(&state.repo, &payload.phone, &payload.access_code).await?;
    let token = auth::issue_session_token(&subject, &state.config.session_secret)?;
    Ok(Json(LoginResponse { token, subject }))
}

/// login_admin
///
/// [Public Route] Operator login by email and access code; same generic
/// failure shape as the user login.
#[utoipa::path(
    post,
    path = "/auth/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_admin(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let subject =
        auth::authenticate_admin(&state.repo, &payload.email, &payload.access_code).await?;
    let token = auth::issue_session_token(&subject, &state.config.session_secret)?;
    Ok(Json(LoginResponse { token, subject }))
}

/// get_me
///
/// [Authenticated Route] The subject plus a one-line summary of its access,
/// used for the post-login welcome card.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = MeResponse))
)]
pub async fn get_me(auth: AuthUser, State(state): State<AppState>) -> ApiResult<Json<MeResponse>> {
    let snapshot = state.repo.load_access_snapshot().await?;
    let subject = auth.subject();
    let view = resolver::capability_for(Some(&subject)).view(&snapshot);

    let summary = if subject.is_admin {
        "full administrative access".to_string()
    } else {
        view.counts.describe()
    };

    Ok(Json(MeResponse {
        subject,
        summary,
        available_tabs: view.available_tabs,
    }))
}

/// get_my_access
///
/// [Authenticated Route] The capability-resolved view for the requesting
/// subject: six filtered content lists, available tabs in fixed precedence
/// order, and per-type granted-category counts. Admins receive the
/// unrestricted view; the Resolver is bypassed for them by capability, not by
/// scattered flag checks.
#[utoipa::path(
    get,
    path = "/me/access",
    responses((status = 200, description = "Resolved access", body = ResolvedAccess))
)]
pub async fn get_my_access(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ResolvedAccess>> {
    let snapshot = state.repo.load_access_snapshot().await?;
    let subject = auth.subject();
    Ok(Json(resolver::capability_for(Some(&subject)).view(&snapshot)))
}

/// get_chat_link
///
/// [Authenticated Route] Deep link opening an external chat with the
/// operator-configured destination and pre-filled body. 404 until the
/// operator has configured a destination number.
#[utoipa::path(
    get,
    path = "/me/chat-link",
    responses(
        (status = 200, description = "Chat deep link", body = ChatLinkResponse),
        (status = 404, description = "Chat button not configured")
    )
)]
pub async fn get_chat_link(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ChatLinkResponse>> {
    let number = state
        .repo
        .get_setting(messaging::CHAT_NUMBER_KEY)
        .await?
        .and_then(|s| s.value)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ApiError::NotFound("chat settings"))?;

    let message = state
        .repo
        .get_setting(messaging::CHAT_MESSAGE_KEY)
        .await?
        .and_then(|s| s.value)
        .unwrap_or_default();

    Ok(Json(ChatLinkResponse {
        url: messaging::chat_link(&number, &message),
    }))
}

// --- Category Handlers (Admin) ---

/// list_categories
///
/// [Admin Route] All categories, regardless of type-hint.
#[utoipa::path(
    get,
    path = "/admin/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn list_categories(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Category>>> {
    auth.require_admin()?;
    Ok(Json(state.repo.list_categories().await?))
}

/// create_category
#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CreateCategoryRequest,
    responses((status = 200, description = "Created", body = Category))
)]
pub async fn create_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    auth.require_admin()?;
    require(&payload.name, "category name")?;
    // Absent filter defaults to the baseline type, matching the admin form.
    let filter = payload.filter.unwrap_or(ContentType::Pdf);
    let category = state
        .repo
        .create_category(payload.name, payload.description, filter)
        .await?;
    Ok(Json(category))
}

/// update_category
///
/// Partial-field merge: only supplied fields change.
#[utoipa::path(
    put,
    path = "/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    auth.require_admin()?;
    let category = state
        .repo
        .update_category(id, payload.name, payload.description, payload.filter)
        .await?;
    Ok(Json(category))
}

/// delete_category
///
/// Unconditional removal. Content items and grants referencing the id are
/// orphaned (no cascade here); resolution tolerates them.
#[utoipa::path(
    delete,
    path = "/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    auth.require_admin()?;
    state.repo.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Content Handlers (Admin, generic over the six types) ---

/// list_content
///
/// [Admin Route] All items of one content type. The wire shape varies with
/// the type (audio/pdf/video/file item shapes).
#[utoipa::path(
    get,
    path = "/admin/content/{content_type}",
    params(("content_type" = ContentType, Path, description = "Content type")),
    responses((status = 200, description = "Items", body = [ContentItem]))
)]
pub async fn list_content(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(ty): Path<ContentType>,
) -> ApiResult<Json<Vec<ContentItem>>> {
    auth.require_admin()?;
    let items = match ty {
        ContentType::Audio | ContentType::AudioCloud => state
            .repo
            .list_audio(ty)
            .await?
            .into_iter()
            .map(ContentItem::Audio)
            .collect(),
        ContentType::Pdf | ContentType::PdfCloud => state
            .repo
            .list_pdf(ty)
            .await?
            .into_iter()
            .map(ContentItem::Pdf)
            .collect(),
        ContentType::Video => state
            .repo
            .list_video()
            .await?
            .into_iter()
            .map(ContentItem::Video)
            .collect(),
        ContentType::FileCloud => state
            .repo
            .list_files()
            .await?
            .into_iter()
            .map(ContentItem::File)
            .collect(),
    };
    Ok(Json(items))
}

/// create_content
///
/// [Admin Route] Creates one item of the given type. A category must be
/// selected, a title given, and a media source supplied as either a URL or an
/// uploaded object key; PDF and file shapes additionally need a cover.
#[utoipa::path(
    post,
    path = "/admin/content/{content_type}",
    params(("content_type" = ContentType, Path, description = "Content type")),
    request_body = CreateContentRequest,
    responses(
        (status = 200, description = "Created", body = ContentItem),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_content(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(ty): Path<ContentType>,
    Json(payload): Json<CreateContentRequest>,
) -> ApiResult<Json<ContentItem>> {
    auth.require_admin()?;
    require(&payload.title, "title")?;
    if payload.category_id <= 0 {
        return Err(ApiError::Validation("a category must be selected".to_string()));
    }

    let item = match ty {
        ContentType::Audio | ContentType::AudioCloud => {
            let file_url = media_source(payload.file_url, payload.upload_key, &state.storage)?;
            ContentItem::Audio(
                state
                    .repo
                    .create_audio(
                        ty,
                        NewAudio {
                            title: payload.title,
                            file_url,
                            category_id: payload.category_id,
                        },
                    )
                    .await?,
            )
        }
        ContentType::Pdf | ContentType::PdfCloud => {
            let cover_url = payload
                .cover_url
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| ApiError::Validation("a cover image is required".to_string()))?;
            let file_url = media_source(payload.file_url, payload.upload_key, &state.storage)?;
            ContentItem::Pdf(
                state
                    .repo
                    .create_pdf(
                        ty,
                        NewPdf {
                            title: payload.title,
                            cover_url,
                            file_url,
                            category_id: payload.category_id,
                        },
                    )
                    .await?,
            )
        }
        ContentType::Video => {
            let video_url = media_source(payload.file_url, payload.upload_key, &state.storage)?;
            ContentItem::Video(
                state
                    .repo
                    .create_video(NewVideo {
                        title: payload.title,
                        video_url,
                        category_id: payload.category_id,
                    })
                    .await?,
            )
        }
        ContentType::FileCloud => {
            let cover_url = payload
                .cover_url
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| ApiError::Validation("a cover image is required".to_string()))?;
            let file_url = media_source(payload.file_url, payload.upload_key, &state.storage)?;
            ContentItem::File(
                state
                    .repo
                    .create_file(NewFile {
                        title: payload.title,
                        cover_url,
                        file_url,
                        file_type: payload.file_type,
                        category_id: payload.category_id,
                    })
                    .await?,
            )
        }
    };
    Ok(Json(item))
}

/// update_content
///
/// [Admin Route] Partial update of one item; moving it to another category is
/// just another field change.
#[utoipa::path(
    put,
    path = "/admin/content/{content_type}/{id}",
    params(
        ("content_type" = ContentType, Path, description = "Content type"),
        ("id" = i64, Path, description = "Item ID")
    ),
    request_body = UpdateContentRequest,
    responses(
        (status = 200, description = "Updated", body = ContentItem),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_content(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((ty, id)): Path<(ContentType, i64)>,
    Json(payload): Json<UpdateContentRequest>,
) -> ApiResult<Json<ContentItem>> {
    auth.require_admin()?;
    let source = media_source_patch(payload.file_url, payload.upload_key, &state.storage)?;

    let item = match ty {
        ContentType::Audio | ContentType::AudioCloud => ContentItem::Audio(
            state
                .repo
                .update_audio(
                    ty,
                    id,
                    AudioPatch {
                        title: payload.title,
                        file_url: source,
                        category_id: payload.category_id,
                    },
                )
                .await?,
        ),
        ContentType::Pdf | ContentType::PdfCloud => ContentItem::Pdf(
            state
                .repo
                .update_pdf(
                    ty,
                    id,
                    PdfPatch {
                        title: payload.title,
                        cover_url: payload.cover_url,
                        file_url: source,
                        category_id: payload.category_id,
                    },
                )
                .await?,
        ),
        ContentType::Video => ContentItem::Video(
            state
                .repo
                .update_video(
                    id,
                    VideoPatch {
                        title: payload.title,
                        video_url: source,
                        category_id: payload.category_id,
                    },
                )
                .await?,
        ),
        ContentType::FileCloud => ContentItem::File(
            state
                .repo
                .update_file(
                    id,
                    FilePatch {
                        title: payload.title,
                        cover_url: payload.cover_url,
                        file_url: source,
                        file_type: payload.file_type,
                        category_id: payload.category_id,
                    },
                )
                .await?,
        ),
    };
    Ok(Json(item))
}

/// delete_content
#[utoipa::path(
    delete,
    path = "/admin/content/{content_type}/{id}",
    params(
        ("content_type" = ContentType, Path, description = "Content type"),
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_content(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((ty, id)): Path<(ContentType, i64)>,
) -> ApiResult<StatusCode> {
    auth.require_admin()?;
    state.repo.delete_content(ty, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- User Account Handlers (Admin) ---

/// list_users
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "Users", body = [UserAccount]))
)]
pub async fn list_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<UserAccount>>> {
    auth.require_admin()?;
    Ok(Json(state.repo.list_users().await?))
}

/// create_user
#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = CreateUserRequest,
    responses((status = 200, description = "Created", body = UserAccount))
)]
pub async fn create_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<Json<UserAccount>> {
    auth.require_admin()?;
    require(&payload.username, "phone number")?;
    require(&payload.access_code, "access code")?;
    let user = state
        .repo
        .create_user(NewUser {
            username: payload.username,
            access_code: payload.access_code,
            name: payload.name,
            is_active: payload.is_active.unwrap_or(true),
        })
        .await?;
    Ok(Json(user))
}

/// update_user
#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserAccount),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserAccount>> {
    auth.require_admin()?;
    let user = state
        .repo
        .update_user(
            id,
            UserPatch {
                username: payload.username,
                access_code: payload.access_code,
                name: payload.name,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(Json(user))
}

/// delete_user
///
/// Grant rows for the user go with the account (store-level cascade).
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    auth.require_admin()?;
    state.repo.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Access Grant Handlers (Admin) ---

/// get_user_access
///
/// [Admin Route] All six grant sets for one user, for the edit form.
#[utoipa::path(
    get,
    path = "/admin/users/{id}/access",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Grant sets", body = GrantSets),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_access(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<GrantSets>> {
    auth.require_admin()?;
    state
        .repo
        .get_user(id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(state.repo.grants_for_user(id).await?))
}

/// replace_user_access
///
/// [Admin Route] The bulk replace: after this call the grant set for
/// (user, type) is exactly the deduplicated request list. An empty list
/// clears the type. The two-phase delete-then-insert underneath is idempotent
/// (repeating the call is safe) but not minimal, which is fine for
/// admin-frequency edits. On a partial failure the type is left empty and
/// the operator is told to retry the whole edit.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/access/{content_type}",
    params(
        ("id" = i64, Path, description = "User ID"),
        ("content_type" = ContentType, Path, description = "Content type")
    ),
    request_body = ReplaceAccessRequest,
    responses(
        (status = 200, description = "Replaced", body = [AccessGrant]),
        (status = 404, description = "User not found")
    )
)]
pub async fn replace_user_access(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, ty)): Path<(i64, ContentType)>,
    Json(payload): Json<ReplaceAccessRequest>,
) -> ApiResult<Json<Vec<AccessGrant>>> {
    auth.require_admin()?;
    state
        .repo
        .get_user(id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    state
        .repo
        .replace_access(id, ty, &payload.category_ids)
        .await?;

    // Echo the written set back so the edit form can refresh in place.
    Ok(Json(state.repo.grants_for_user(id).await?.get(ty).clone()))
}

/// revoke_access
///
/// [Admin Route] Removes a single grant by id within one type's relation.
#[utoipa::path(
    delete,
    path = "/admin/access/{content_type}/{grant_id}",
    params(
        ("content_type" = ContentType, Path, description = "Content type"),
        ("grant_id" = i64, Path, description = "Grant ID")
    ),
    responses(
        (status = 204, description = "Revoked"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn revoke_access(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((ty, grant_id)): Path<(ContentType, i64)>,
) -> ApiResult<StatusCode> {
    auth.require_admin()?;
    state.repo.revoke_access(ty, grant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Admin Account Handlers (Admin) ---

/// list_admins
#[utoipa::path(
    get,
    path = "/admin/admins",
    responses((status = 200, description = "Admins", body = [AdminAccount]))
)]
pub async fn list_admins(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<AdminAccount>>> {
    auth.require_admin()?;
    Ok(Json(state.repo.list_admins().await?))
}

/// create_admin
#[utoipa::path(
    post,
    path = "/admin/admins",
    request_body = CreateAdminRequest,
    responses((status = 200, description = "Created", body = AdminAccount))
)]
pub async fn create_admin(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateAdminRequest>,
) -> ApiResult<Json<AdminAccount>> {
    auth.require_admin()?;
    require(&payload.email, "email")?;
    require(&payload.access_code, "access code")?;
    let admin = state
        .repo
        .create_admin(NewAdmin {
            email: payload.email,
            access_code: payload.access_code,
        })
        .await?;
    Ok(Json(admin))
}

/// delete_admin
#[utoipa::path(
    delete,
    path = "/admin/admins/{id}",
    params(("id" = i64, Path, description = "Admin ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_admin(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    auth.require_admin()?;
    state.repo.delete_admin(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Dashboard & Settings Handlers (Admin) ---

/// get_admin_stats
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = DashboardStats))
)]
pub async fn get_admin_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<DashboardStats>> {
    auth.require_admin()?;
    Ok(Json(state.repo.get_stats().await?))
}

/// get_chat_settings
#[utoipa::path(
    get,
    path = "/admin/settings/chat",
    responses((status = 200, description = "Chat settings", body = ChatSettings))
)]
pub async fn get_chat_settings(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ChatSettings>> {
    auth.require_admin()?;
    let number = state
        .repo
        .get_setting(messaging::CHAT_NUMBER_KEY)
        .await?
        .and_then(|s| s.value);
    let message = state
        .repo
        .get_setting(messaging::CHAT_MESSAGE_KEY)
        .await?
        .and_then(|s| s.value);
    Ok(Json(ChatSettings { number, message }))
}

/// update_chat_settings
#[utoipa::path(
    put,
    path = "/admin/settings/chat",
    request_body = ChatSettingsRequest,
    responses((status = 200, description = "Saved", body = ChatSettings))
)]
pub async fn update_chat_settings(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ChatSettingsRequest>,
) -> ApiResult<Json<ChatSettings>> {
    auth.require_admin()?;
    require(&payload.number, "destination number")?;
    let number = state
        .repo
        .put_setting(messaging::CHAT_NUMBER_KEY, &payload.number)
        .await?;
    let message = state
        .repo
        .put_setting(messaging::CHAT_MESSAGE_KEY, &payload.message)
        .await?;
    Ok(Json(ChatSettings {
        number: number.value,
        message: message.value,
    }))
}

// --- Upload Handler (Admin) ---

/// get_presigned_url
///
/// [Admin Route] Generates a temporary URL for direct client-to-storage
/// upload. The media kind pins the key prefix and the accepted MIME types;
/// the object key is a fresh UUID plus the sanitized original extension, so
/// client filenames never reach storage verbatim.
#[utoipa::path(
    post,
    path = "/admin/upload/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 422, description = "MIME type not allowed for kind")
    )
)]
pub async fn get_presigned_url(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> ApiResult<Json<PresignedUrlResponse>> {
    auth.require_admin()?;

    if !payload.kind.accepts(&payload.file_type) {
        return Err(ApiError::Validation(format!(
            "content type '{}' is not allowed for {} uploads",
            payload.file_type,
            payload.kind.prefix()
        )));
    }

    let extension = std::path::Path::new(&sanitize_key_segment(&payload.filename))
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin")
        .to_string();
    let object_key = format!("{}/{}.{}", payload.kind.prefix(), Uuid::new_v4(), extension);

    let upload_url = state
        .storage
        .presigned_upload_url(&object_key, &payload.file_type)
        .await
        .map_err(ApiError::Storage)?;

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key: object_key,
    }))
}
