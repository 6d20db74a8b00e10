use crate::errors::{ApiError, ApiResult};
use crate::models::{
    AccessGrant, AccessSnapshot, AdminAccount, AudioItem, Category, ContentLibrary, ContentType,
    DashboardStats, FileItem, GrantSets, PdfItem, PortalSetting, UserAccount, VideoItem,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;

// --- Store-Level Input Types ---
//
// Handlers resolve upload keys into final URLs and validate required fields
// before the store is touched, so the repository only ever sees fully-formed
// values. Patch structs carry `Option<T>` per field: only supplied fields
// change (COALESCE in the Postgres implementation).

#[derive(Debug, Clone, Default)]
pub struct NewAudio {
    pub title: String,
    pub file_url: String,
    pub category_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AudioPatch {
    pub title: Option<String>,
    pub file_url: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPdf {
    pub title: String,
    pub cover_url: String,
    pub file_url: String,
    pub category_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PdfPatch {
    pub title: Option<String>,
    pub cover_url: Option<String>,
    pub file_url: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NewVideo {
    pub title: String,
    pub video_url: String,
    pub category_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub video_url: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NewFile {
    pub title: String,
    pub cover_url: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub category_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct FilePatch {
    pub title: Option<String>,
    pub cover_url: Option<String>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub access_code: String,
    pub name: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub access_code: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct NewAdmin {
    pub email: String,
    pub access_code: String,
}

/// Repository Trait
///
/// The abstract contract for all persistence operations: the Entity Store
/// (categories, six content collections, accounts, settings) and the Access
/// Relation Store (six grant relations) behind one seam, so handlers never
/// know the concrete backend (Postgres, in-memory mock, etc.).
///
/// Every operation is fail-fast: store errors surface as
/// `ApiError::Transport`, zero-row updates/deletes as `ApiError::NotFound`.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's async task
/// boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Categories ---
    async fn list_categories(&self) -> ApiResult<Vec<Category>>;
    async fn create_category(
        &self,
        name: String,
        description: String,
        filter: ContentType,
    ) -> ApiResult<Category>;
    // Partial merge: None fields keep their stored value.
    async fn update_category(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
        filter: Option<ContentType>,
    ) -> ApiResult<Category>;
    // Unconditional removal. No cascade at this layer: content items and
    // grants referencing the id are orphaned, which the Resolver tolerates.
    async fn delete_category(&self, id: i64) -> ApiResult<()>;

    // --- Content Items (audio shape: Audio | AudioCloud) ---
    async fn list_audio(&self, kind: ContentType) -> ApiResult<Vec<AudioItem>>;
    async fn create_audio(&self, kind: ContentType, item: NewAudio) -> ApiResult<AudioItem>;
    async fn update_audio(&self, kind: ContentType, id: i64, patch: AudioPatch)
    -> ApiResult<AudioItem>;

    // --- Content Items (pdf shape: Pdf | PdfCloud) ---
    async fn list_pdf(&self, kind: ContentType) -> ApiResult<Vec<PdfItem>>;
    async fn create_pdf(&self, kind: ContentType, item: NewPdf) -> ApiResult<PdfItem>;
    async fn update_pdf(&self, kind: ContentType, id: i64, patch: PdfPatch) -> ApiResult<PdfItem>;

    // --- Content Items (video shape) ---
    async fn list_video(&self) -> ApiResult<Vec<VideoItem>>;
    async fn create_video(&self, item: NewVideo) -> ApiResult<VideoItem>;
    async fn update_video(&self, id: i64, patch: VideoPatch) -> ApiResult<VideoItem>;

    // --- Content Items (file shape) ---
    async fn list_files(&self) -> ApiResult<Vec<FileItem>>;
    async fn create_file(&self, item: NewFile) -> ApiResult<FileItem>;
    async fn update_file(&self, id: i64, patch: FilePatch) -> ApiResult<FileItem>;

    // Deletion is uniform across all six collections.
    async fn delete_content(&self, kind: ContentType, id: i64) -> ApiResult<()>;

    // --- User Accounts ---
    async fn list_users(&self) -> ApiResult<Vec<UserAccount>>;
    async fn get_user(&self, id: i64) -> ApiResult<Option<UserAccount>>;
    async fn find_user_by_username(&self, username: &str) -> ApiResult<Option<UserAccount>>;
    async fn create_user(&self, user: NewUser) -> ApiResult<UserAccount>;
    async fn update_user(&self, id: i64, patch: UserPatch) -> ApiResult<UserAccount>;
    async fn delete_user(&self, id: i64) -> ApiResult<()>;

    // --- Admin Accounts ---
    async fn list_admins(&self) -> ApiResult<Vec<AdminAccount>>;
    async fn get_admin(&self, id: i64) -> ApiResult<Option<AdminAccount>>;
    async fn find_admin_by_email(&self, email: &str) -> ApiResult<Option<AdminAccount>>;
    async fn create_admin(&self, admin: NewAdmin) -> ApiResult<AdminAccount>;
    async fn delete_admin(&self, id: i64) -> ApiResult<()>;

    // --- Access Relation Store ---
    // One relation per content type; the ContentType parameter selects it.
    async fn grants_for_type(&self, ty: ContentType) -> ApiResult<Vec<AccessGrant>>;
    async fn grants_for_user(&self, user_id: i64) -> ApiResult<GrantSets>;

    /// Access Mutator: replaces the full grant set for one (user, type) by
    /// deleting every existing grant and inserting the deduplicated desired
    /// set. The delete must be acknowledged before the first insert. An
    /// insert failure after the delete leaves the user with zero access for
    /// the type and surfaces as `ApiError::PartialMutation`; replaying the
    /// whole call is safe.
    async fn replace_access(
        &self,
        user_id: i64,
        ty: ContentType,
        category_ids: &[i64],
    ) -> ApiResult<()>;

    /// Removes a single grant by id within one type's relation.
    async fn revoke_access(&self, ty: ContentType, grant_id: i64) -> ApiResult<()>;

    // --- Bulk Fetch ---
    /// Materializes everything resolution needs in one call. Resolution must
    /// see the complete grant set for a user, so the boundary is
    /// fetch-everything, never paged.
    async fn load_access_snapshot(&self) -> ApiResult<AccessSnapshot>;

    // --- Settings & Stats ---
    async fn get_setting(&self, key: &str) -> ApiResult<Option<PortalSetting>>;
    async fn put_setting(&self, key: &str, value: &str) -> ApiResult<PortalSetting>;
    async fn get_stats(&self) -> ApiResult<DashboardStats>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by
/// PostgreSQL. Table names for the per-type operations come from the
/// `ContentType` enum (static strings, never request input), so the
/// `format!` interpolation below introduces no injection surface; all values
/// are bound parameters.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Deduplicates while preserving first-seen order, so the insert phase writes
// each desired category exactly once.
fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- Categories ---

    async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, filter FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_category(
        &self,
        name: String,
        description: String,
        filter: ContentType,
    ) -> ApiResult<Category> {
        let row = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description, filter) VALUES ($1, $2, $3) \
             RETURNING id, name, description, filter",
        )
        .bind(name)
        .bind(description)
        .bind(filter.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Partial update via COALESCE: only supplied fields change.
    async fn update_category(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
        filter: Option<ContentType>,
    ) -> ApiResult<Category> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories \
             SET name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 filter = COALESCE($4, filter) \
             WHERE id = $1 \
             RETURNING id, name, description, filter",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(filter.map(|f| f.to_string()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("category"))
    }

    async fn delete_category(&self, id: i64) -> ApiResult<()> {
        let res = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound("category"));
        }
        Ok(())
    }

    // --- Audio shape ---

    async fn list_audio(&self, kind: ContentType) -> ApiResult<Vec<AudioItem>> {
        debug_assert!(matches!(kind, ContentType::Audio | ContentType::AudioCloud));
        let sql = format!(
            "SELECT id, title, file_url, category_id FROM {} ORDER BY id",
            kind.content_table()
        );
        Ok(sqlx::query_as::<_, AudioItem>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_audio(&self, kind: ContentType, item: NewAudio) -> ApiResult<AudioItem> {
        debug_assert!(matches!(kind, ContentType::Audio | ContentType::AudioCloud));
        let sql = format!(
            "INSERT INTO {} (title, file_url, category_id) VALUES ($1, $2, $3) \
             RETURNING id, title, file_url, category_id",
            kind.content_table()
        );
        Ok(sqlx::query_as::<_, AudioItem>(&sql)
            .bind(item.title)
            .bind(item.file_url)
            .bind(item.category_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_audio(
        &self,
        kind: ContentType,
        id: i64,
        patch: AudioPatch,
    ) -> ApiResult<AudioItem> {
        debug_assert!(matches!(kind, ContentType::Audio | ContentType::AudioCloud));
        let sql = format!(
            "UPDATE {} \
             SET title = COALESCE($2, title), \
                 file_url = COALESCE($3, file_url), \
                 category_id = COALESCE($4, category_id) \
             WHERE id = $1 \
             RETURNING id, title, file_url, category_id",
            kind.content_table()
        );
        sqlx::query_as::<_, AudioItem>(&sql)
            .bind(id)
            .bind(patch.title)
            .bind(patch.file_url)
            .bind(patch.category_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound("audio item"))
    }

    // --- Pdf shape ---

    async fn list_pdf(&self, kind: ContentType) -> ApiResult<Vec<PdfItem>> {
        debug_assert!(matches!(kind, ContentType::Pdf | ContentType::PdfCloud));
        let sql = format!(
            "SELECT id, title, cover_url, file_url, category_id FROM {} ORDER BY id",
            kind.content_table()
        );
        Ok(sqlx::query_as::<_, PdfItem>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_pdf(&self, kind: ContentType, item: NewPdf) -> ApiResult<PdfItem> {
        debug_assert!(matches!(kind, ContentType::Pdf | ContentType::PdfCloud));
        let sql = format!(
            "INSERT INTO {} (title, cover_url, file_url, category_id) VALUES ($1, $2, $3, $4) \
             RETURNING id, title, cover_url, file_url, category_id",
            kind.content_table()
        );
        Ok(sqlx::query_as::<_, PdfItem>(&sql)
            .bind(item.title)
            .bind(item.cover_url)
            .bind(item.file_url)
            .bind(item.category_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_pdf(&self, kind: ContentType, id: i64, patch: PdfPatch) -> ApiResult<PdfItem> {
        debug_assert!(matches!(kind, ContentType::Pdf | ContentType::PdfCloud));
        let sql = format!(
            "UPDATE {} \
             SET title = COALESCE($2, title), \
                 cover_url = COALESCE($3, cover_url), \
                 file_url = COALESCE($4, file_url), \
                 category_id = COALESCE($5, category_id) \
             WHERE id = $1 \
             RETURNING id, title, cover_url, file_url, category_id",
            kind.content_table()
        );
        sqlx::query_as::<_, PdfItem>(&sql)
            .bind(id)
            .bind(patch.title)
            .bind(patch.cover_url)
            .bind(patch.file_url)
            .bind(patch.category_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound("pdf item"))
    }

    // --- Video shape ---

    async fn list_video(&self) -> ApiResult<Vec<VideoItem>> {
        Ok(sqlx::query_as::<_, VideoItem>(
            "SELECT id, title, video_url, category_id FROM videos ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_video(&self, item: NewVideo) -> ApiResult<VideoItem> {
        Ok(sqlx::query_as::<_, VideoItem>(
            "INSERT INTO videos (title, video_url, category_id) VALUES ($1, $2, $3) \
             RETURNING id, title, video_url, category_id",
        )
        .bind(item.title)
        .bind(item.video_url)
        .bind(item.category_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_video(&self, id: i64, patch: VideoPatch) -> ApiResult<VideoItem> {
        sqlx::query_as::<_, VideoItem>(
            "UPDATE videos \
             SET title = COALESCE($2, title), \
                 video_url = COALESCE($3, video_url), \
                 category_id = COALESCE($4, category_id) \
             WHERE id = $1 \
             RETURNING id, title, video_url, category_id",
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.video_url)
        .bind(patch.category_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("video item"))
    }

    // --- File shape ---

    async fn list_files(&self) -> ApiResult<Vec<FileItem>> {
        Ok(sqlx::query_as::<_, FileItem>(
            "SELECT id, title, cover_url, file_url, file_type, category_id \
             FROM file_cloud_files ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_file(&self, item: NewFile) -> ApiResult<FileItem> {
        Ok(sqlx::query_as::<_, FileItem>(
            "INSERT INTO file_cloud_files (title, cover_url, file_url, file_type, category_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, title, cover_url, file_url, file_type, category_id",
        )
        .bind(item.title)
        .bind(item.cover_url)
        .bind(item.file_url)
        .bind(item.file_type)
        .bind(item.category_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_file(&self, id: i64, patch: FilePatch) -> ApiResult<FileItem> {
        sqlx::query_as::<_, FileItem>(
            "UPDATE file_cloud_files \
             SET title = COALESCE($2, title), \
                 cover_url = COALESCE($3, cover_url), \
                 file_url = COALESCE($4, file_url), \
                 file_type = COALESCE($5, file_type), \
                 category_id = COALESCE($6, category_id) \
             WHERE id = $1 \
             RETURNING id, title, cover_url, file_url, file_type, category_id",
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.cover_url)
        .bind(patch.file_url)
        .bind(patch.file_type)
        .bind(patch.category_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("file item"))
    }

    async fn delete_content(&self, kind: ContentType, id: i64) -> ApiResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.content_table());
        let res = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound("content item"));
        }
        Ok(())
    }

    // --- User Accounts ---

    async fn list_users(&self) -> ApiResult<Vec<UserAccount>> {
        Ok(sqlx::query_as::<_, UserAccount>(
            "SELECT id, username, access_code, name, is_active, created_at \
             FROM users ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_user(&self, id: i64) -> ApiResult<Option<UserAccount>> {
        Ok(sqlx::query_as::<_, UserAccount>(
            "SELECT id, username, access_code, name, is_active, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> ApiResult<Option<UserAccount>> {
        Ok(sqlx::query_as::<_, UserAccount>(
            "SELECT id, username, access_code, name, is_active, created_at \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_user(&self, user: NewUser) -> ApiResult<UserAccount> {
        Ok(sqlx::query_as::<_, UserAccount>(
            "INSERT INTO users (username, access_code, name, is_active) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, username, access_code, name, is_active, created_at",
        )
        .bind(user.username)
        .bind(user.access_code)
        .bind(user.name)
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> ApiResult<UserAccount> {
        sqlx::query_as::<_, UserAccount>(
            "UPDATE users \
             SET username = COALESCE($2, username), \
                 access_code = COALESCE($3, access_code), \
                 name = COALESCE($4, name), \
                 is_active = COALESCE($5, is_active) \
             WHERE id = $1 \
             RETURNING id, username, access_code, name, is_active, created_at",
        )
        .bind(id)
        .bind(patch.username)
        .bind(patch.access_code)
        .bind(patch.name)
        .bind(patch.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("user"))
    }

    /// Deleting a user cascades to their grant rows at the schema level (the
    /// six relations declare ON DELETE CASCADE); this layer issues only the
    /// account delete.
    async fn delete_user(&self, id: i64) -> ApiResult<()> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound("user"));
        }
        Ok(())
    }

    // --- Admin Accounts ---

    async fn list_admins(&self) -> ApiResult<Vec<AdminAccount>> {
        Ok(sqlx::query_as::<_, AdminAccount>(
            "SELECT id, email, access_code, created_at FROM admins ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_admin(&self, id: i64) -> ApiResult<Option<AdminAccount>> {
        Ok(sqlx::query_as::<_, AdminAccount>(
            "SELECT id, email, access_code, created_at FROM admins WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_admin_by_email(&self, email: &str) -> ApiResult<Option<AdminAccount>> {
        Ok(sqlx::query_as::<_, AdminAccount>(
            "SELECT id, email, access_code, created_at FROM admins WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_admin(&self, admin: NewAdmin) -> ApiResult<AdminAccount> {
        Ok(sqlx::query_as::<_, AdminAccount>(
            "INSERT INTO admins (email, access_code) VALUES ($1, $2) \
             RETURNING id, email, access_code, created_at",
        )
        .bind(admin.email)
        .bind(admin.access_code)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_admin(&self, id: i64) -> ApiResult<()> {
        let res = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound("admin"));
        }
        Ok(())
    }

    // --- Access Relation Store ---

    async fn grants_for_type(&self, ty: ContentType) -> ApiResult<Vec<AccessGrant>> {
        let sql = format!(
            "SELECT id, user_id, category_id FROM {} ORDER BY id",
            ty.grant_table()
        );
        Ok(sqlx::query_as::<_, AccessGrant>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn grants_for_user(&self, user_id: i64) -> ApiResult<GrantSets> {
        let mut sets = GrantSets::default();
        for ty in ContentType::TAB_ORDER {
            let sql = format!(
                "SELECT id, user_id, category_id FROM {} WHERE user_id = $1 ORDER BY id",
                ty.grant_table()
            );
            *sets.get_mut(ty) = sqlx::query_as::<_, AccessGrant>(&sql)
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        }
        Ok(sets)
    }

    async fn replace_access(
        &self,
        user_id: i64,
        ty: ContentType,
        category_ids: &[i64],
    ) -> ApiResult<()> {
        // Phase 1: clear the full existing set. Awaiting here guarantees the
        // delete is acknowledged before any insert targets the same
        // uniqueness scope.
        let delete_sql = format!("DELETE FROM {} WHERE user_id = $1", ty.grant_table());
        sqlx::query(&delete_sql)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        // Phase 2: write the deduplicated desired set. A failure from here on
        // leaves the user with zero access for this type: reported loudly,
        // not rolled back; replaying the whole replace is safe.
        let insert_sql = format!(
            "INSERT INTO {} (user_id, category_id) VALUES ($1, $2)",
            ty.grant_table()
        );
        for category_id in dedup_ids(category_ids) {
            sqlx::query(&insert_sql)
                .bind(user_id)
                .bind(category_id)
                .execute(&self.pool)
                .await
                .map_err(|source| ApiError::PartialMutation {
                    user_id,
                    content_type: ty,
                    source,
                })?;
        }
        Ok(())
    }

    async fn revoke_access(&self, ty: ContentType, grant_id: i64) -> ApiResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", ty.grant_table());
        let res = sqlx::query(&sql).bind(grant_id).execute(&self.pool).await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound("access grant"));
        }
        Ok(())
    }

    // --- Bulk Fetch ---

    async fn load_access_snapshot(&self) -> ApiResult<AccessSnapshot> {
        let categories = self.list_categories().await?;

        let library = ContentLibrary {
            audio: self.list_audio(ContentType::Audio).await?,
            audio_cloud: self.list_audio(ContentType::AudioCloud).await?,
            pdf: self.list_pdf(ContentType::Pdf).await?,
            pdf_cloud: self.list_pdf(ContentType::PdfCloud).await?,
            video: self.list_video().await?,
            file_cloud: self.list_files().await?,
        };

        let mut grants = GrantSets::default();
        for ty in ContentType::TAB_ORDER {
            *grants.get_mut(ty) = self.grants_for_type(ty).await?;
        }

        Ok(AccessSnapshot {
            categories,
            library,
            grants,
        })
    }

    // --- Settings & Stats ---

    async fn get_setting(&self, key: &str) -> ApiResult<Option<PortalSetting>> {
        Ok(sqlx::query_as::<_, PortalSetting>(
            "SELECT id, key, value, updated_at FROM portal_settings WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn put_setting(&self, key: &str, value: &str) -> ApiResult<PortalSetting> {
        Ok(sqlx::query_as::<_, PortalSetting>(
            "INSERT INTO portal_settings (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW() \
             RETURNING id, key, value, updated_at",
        )
        .bind(key)
        .bind(value)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Compiles the counters for the administrative dashboard in one call.
    async fn get_stats(&self) -> ApiResult<DashboardStats> {
        let total_users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        let total_admins = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?;
        let total_categories = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        let mut total_content_items = 0i64;
        for ty in ContentType::TAB_ORDER {
            let sql = format!("SELECT COUNT(*) FROM {}", ty.content_table());
            total_content_items += sqlx::query_scalar::<_, i64>(&sql)
                .fetch_one(&self.pool)
                .await?;
        }

        Ok(DashboardStats {
            total_users,
            total_admins,
            total_categories,
            total_content_items,
        })
    }
}
