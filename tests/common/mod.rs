//! Shared test fixtures: a stateful in-memory `Repository` implementation and
//! AppState scaffolding, so handler and API tests run without a live
//! Postgres while still exercising the real replace/resolve contracts.

// Each test binary links this module and uses a different slice of it.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use media_portal::{
    AppState,
    config::AppConfig,
    errors::{ApiError, ApiResult},
    models::{
        AccessGrant, AccessSnapshot, AdminAccount, AudioItem, Category, ContentLibrary,
        ContentType, DashboardStats, FileItem, GrantSets, PdfItem, PortalSetting, UserAccount,
        VideoItem,
    },
    repository::{
        AudioPatch, FilePatch, NewAdmin, NewAudio, NewFile, NewPdf, NewUser, NewVideo, PdfPatch,
        Repository, RepositoryState, UserPatch, VideoPatch,
    },
    storage::MockStorageService,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Store {
    next_id: i64,
    categories: Vec<Category>,
    audio: Vec<AudioItem>,
    audio_cloud: Vec<AudioItem>,
    pdf: Vec<PdfItem>,
    pdf_cloud: Vec<PdfItem>,
    video: Vec<VideoItem>,
    files: Vec<FileItem>,
    users: Vec<UserAccount>,
    admins: Vec<AdminAccount>,
    grants: GrantSets,
    settings: Vec<PortalSetting>,
    // Fault injection: fail the Nth grant insert of the next replace call,
    // to reproduce the partial-mutation failure mode.
    fail_grant_insert_at: Option<usize>,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn audio_list(&mut self, kind: ContentType) -> &mut Vec<AudioItem> {
        match kind {
            ContentType::Audio => &mut self.audio,
            ContentType::AudioCloud => &mut self.audio_cloud,
            other => panic!("not an audio-shaped type: {other}"),
        }
    }

    fn pdf_list(&mut self, kind: ContentType) -> &mut Vec<PdfItem> {
        match kind {
            ContentType::Pdf => &mut self.pdf,
            ContentType::PdfCloud => &mut self.pdf_cloud,
            other => panic!("not a pdf-shaped type: {other}"),
        }
    }
}

/// InMemoryRepo
///
/// Mirrors the Postgres repository's observable behavior: COALESCE-style
/// partial updates, NotFound on zero-row updates/deletes, and the two-phase
/// delete-then-insert access replace (including its partial-failure mode via
/// fault injection).
pub struct InMemoryRepo {
    store: Mutex<Store>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
        }
    }

    /// Arranges for the next replace call to fail before performing its
    /// `at`-th insert (0 = fail before any insert).
    pub fn fail_next_grant_insert_at(&self, at: usize) {
        self.store.lock().unwrap().fail_grant_insert_at = Some(at);
    }

    // --- Seed helpers ---

    pub fn seed_category(&self, name: &str, filter: ContentType) -> Category {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let cat = Category {
            id,
            name: name.to_string(),
            description: String::new(),
            filter: Some(filter.to_string()),
        };
        s.categories.push(cat.clone());
        cat
    }

    pub fn seed_user(&self, username: &str, access_code: &str, is_active: bool) -> UserAccount {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let user = UserAccount {
            id,
            username: username.to_string(),
            access_code: access_code.to_string(),
            name: Some(format!("User {id}")),
            is_active,
            created_at: Utc::now(),
        };
        s.users.push(user.clone());
        user
    }

    pub fn seed_admin(&self, email: &str, access_code: &str) -> AdminAccount {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let admin = AdminAccount {
            id,
            email: email.to_string(),
            access_code: access_code.to_string(),
            created_at: Utc::now(),
        };
        s.admins.push(admin.clone());
        admin
    }

    pub fn seed_audio(&self, kind: ContentType, title: &str, category_id: i64) -> AudioItem {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let item = AudioItem {
            id,
            title: title.to_string(),
            file_url: format!("https://cdn.test/audio/{id}.mp3"),
            category_id,
        };
        s.audio_list(kind).push(item.clone());
        item
    }

    pub fn seed_pdf(&self, kind: ContentType, title: &str, category_id: i64) -> PdfItem {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let item = PdfItem {
            id,
            title: title.to_string(),
            cover_url: format!("https://cdn.test/covers/{id}.jpg"),
            file_url: format!("https://cdn.test/pdf/{id}.pdf"),
            category_id,
        };
        s.pdf_list(kind).push(item.clone());
        item
    }

    pub fn seed_video(&self, title: &str, category_id: i64) -> VideoItem {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let item = VideoItem {
            id,
            title: title.to_string(),
            video_url: format!("https://cdn.test/video/{id}.mp4"),
            category_id,
        };
        s.video.push(item.clone());
        item
    }

    pub fn seed_file(&self, title: &str, category_id: i64) -> FileItem {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let item = FileItem {
            id,
            title: title.to_string(),
            cover_url: format!("https://cdn.test/covers/{id}.jpg"),
            file_url: format!("https://cdn.test/files/{id}.zip"),
            file_type: Some("zip".to_string()),
            category_id,
        };
        s.files.push(item.clone());
        item
    }

    /// Direct grant injection, bypassing the mutator (for resolver-facing
    /// fixtures and duplicate-row scenarios).
    pub fn seed_grant(&self, ty: ContentType, user_id: i64, category_id: i64) -> AccessGrant {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let grant = AccessGrant {
            id,
            user_id,
            category_id,
        };
        s.grants.get_mut(ty).push(grant.clone());
        grant
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for InMemoryRepo {
    // --- Categories ---

    async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        Ok(self.store.lock().unwrap().categories.clone())
    }

    async fn create_category(
        &self,
        name: String,
        description: String,
        filter: ContentType,
    ) -> ApiResult<Category> {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let cat = Category {
            id,
            name,
            description,
            filter: Some(filter.to_string()),
        };
        s.categories.push(cat.clone());
        Ok(cat)
    }

    async fn update_category(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
        filter: Option<ContentType>,
    ) -> ApiResult<Category> {
        let mut s = self.store.lock().unwrap();
        let cat = s
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ApiError::NotFound("category"))?;
        if let Some(name) = name {
            cat.name = name;
        }
        if let Some(description) = description {
            cat.description = description;
        }
        if let Some(filter) = filter {
            cat.filter = Some(filter.to_string());
        }
        Ok(cat.clone())
    }

    async fn delete_category(&self, id: i64) -> ApiResult<()> {
        let mut s = self.store.lock().unwrap();
        let before = s.categories.len();
        s.categories.retain(|c| c.id != id);
        if s.categories.len() == before {
            return Err(ApiError::NotFound("category"));
        }
        Ok(())
    }

    // --- Audio shape ---

    async fn list_audio(&self, kind: ContentType) -> ApiResult<Vec<AudioItem>> {
        Ok(self.store.lock().unwrap().audio_list(kind).clone())
    }

    async fn create_audio(&self, kind: ContentType, item: NewAudio) -> ApiResult<AudioItem> {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let created = AudioItem {
            id,
            title: item.title,
            file_url: item.file_url,
            category_id: item.category_id,
        };
        s.audio_list(kind).push(created.clone());
        Ok(created)
    }

    async fn update_audio(
        &self,
        kind: ContentType,
        id: i64,
        patch: AudioPatch,
    ) -> ApiResult<AudioItem> {
        let mut s = self.store.lock().unwrap();
        let item = s
            .audio_list(kind)
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(ApiError::NotFound("audio item"))?;
        if let Some(title) = patch.title {
            item.title = title;
        }
        if let Some(file_url) = patch.file_url {
            item.file_url = file_url;
        }
        if let Some(category_id) = patch.category_id {
            item.category_id = category_id;
        }
        Ok(item.clone())
    }

    // --- Pdf shape ---

    async fn list_pdf(&self, kind: ContentType) -> ApiResult<Vec<PdfItem>> {
        Ok(self.store.lock().unwrap().pdf_list(kind).clone())
    }

    async fn create_pdf(&self, kind: ContentType, item: NewPdf) -> ApiResult<PdfItem> {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let created = PdfItem {
            id,
            title: item.title,
            cover_url: item.cover_url,
            file_url: item.file_url,
            category_id: item.category_id,
        };
        s.pdf_list(kind).push(created.clone());
        Ok(created)
    }

    async fn update_pdf(&self, kind: ContentType, id: i64, patch: PdfPatch) -> ApiResult<PdfItem> {
        let mut s = self.store.lock().unwrap();
        let item = s
            .pdf_list(kind)
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(ApiError::NotFound("pdf item"))?;
        if let Some(title) = patch.title {
            item.title = title;
        }
        if let Some(cover_url) = patch.cover_url {
            item.cover_url = cover_url;
        }
        if let Some(file_url) = patch.file_url {
            item.file_url = file_url;
        }
        if let Some(category_id) = patch.category_id {
            item.category_id = category_id;
        }
        Ok(item.clone())
    }

    // --- Video shape ---

    async fn list_video(&self) -> ApiResult<Vec<VideoItem>> {
        Ok(self.store.lock().unwrap().video.clone())
    }

    async fn create_video(&self, item: NewVideo) -> ApiResult<VideoItem> {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let created = VideoItem {
            id,
            title: item.title,
            video_url: item.video_url,
            category_id: item.category_id,
        };
        s.video.push(created.clone());
        Ok(created)
    }

    async fn update_video(&self, id: i64, patch: VideoPatch) -> ApiResult<VideoItem> {
        let mut s = self.store.lock().unwrap();
        let item = s
            .video
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(ApiError::NotFound("video item"))?;
        if let Some(title) = patch.title {
            item.title = title;
        }
        if let Some(video_url) = patch.video_url {
            item.video_url = video_url;
        }
        if let Some(category_id) = patch.category_id {
            item.category_id = category_id;
        }
        Ok(item.clone())
    }

    // --- File shape ---

    async fn list_files(&self) -> ApiResult<Vec<FileItem>> {
        Ok(self.store.lock().unwrap().files.clone())
    }

    async fn create_file(&self, item: NewFile) -> ApiResult<FileItem> {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let created = FileItem {
            id,
            title: item.title,
            cover_url: item.cover_url,
            file_url: item.file_url,
            file_type: item.file_type,
            category_id: item.category_id,
        };
        s.files.push(created.clone());
        Ok(created)
    }

    async fn update_file(&self, id: i64, patch: FilePatch) -> ApiResult<FileItem> {
        let mut s = self.store.lock().unwrap();
        let item = s
            .files
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(ApiError::NotFound("file item"))?;
        if let Some(title) = patch.title {
            item.title = title;
        }
        if let Some(cover_url) = patch.cover_url {
            item.cover_url = cover_url;
        }
        if let Some(file_url) = patch.file_url {
            item.file_url = file_url;
        }
        if let Some(file_type) = patch.file_type {
            item.file_type = Some(file_type);
        }
        if let Some(category_id) = patch.category_id {
            item.category_id = category_id;
        }
        Ok(item.clone())
    }

    async fn delete_content(&self, kind: ContentType, id: i64) -> ApiResult<()> {
        let mut s = self.store.lock().unwrap();
        let removed = match kind {
            ContentType::Audio | ContentType::AudioCloud => {
                let list = s.audio_list(kind);
                let before = list.len();
                list.retain(|i| i.id != id);
                list.len() != before
            }
            ContentType::Pdf | ContentType::PdfCloud => {
                let list = s.pdf_list(kind);
                let before = list.len();
                list.retain(|i| i.id != id);
                list.len() != before
            }
            ContentType::Video => {
                let before = s.video.len();
                s.video.retain(|i| i.id != id);
                s.video.len() != before
            }
            ContentType::FileCloud => {
                let before = s.files.len();
                s.files.retain(|i| i.id != id);
                s.files.len() != before
            }
        };
        if !removed {
            return Err(ApiError::NotFound("content item"));
        }
        Ok(())
    }

    // --- Users ---

    async fn list_users(&self) -> ApiResult<Vec<UserAccount>> {
        Ok(self.store.lock().unwrap().users.clone())
    }

    async fn get_user(&self, id: i64) -> ApiResult<Option<UserAccount>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> ApiResult<Option<UserAccount>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> ApiResult<UserAccount> {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let created = UserAccount {
            id,
            username: user.username,
            access_code: user.access_code,
            name: user.name,
            is_active: user.is_active,
            created_at: Utc::now(),
        };
        s.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> ApiResult<UserAccount> {
        let mut s = self.store.lock().unwrap();
        let user = s
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(ApiError::NotFound("user"))?;
        if let Some(username) = patch.username {
            user.username = username;
        }
        if let Some(access_code) = patch.access_code {
            user.access_code = access_code;
        }
        if let Some(name) = patch.name {
            user.name = Some(name);
        }
        if let Some(is_active) = patch.is_active {
            user.is_active = is_active;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> ApiResult<()> {
        let mut s = self.store.lock().unwrap();
        let before = s.users.len();
        s.users.retain(|u| u.id != id);
        if s.users.len() == before {
            return Err(ApiError::NotFound("user"));
        }
        // Store-level cascade: the account takes its grant rows with it.
        for ty in ContentType::TAB_ORDER {
            s.grants.get_mut(ty).retain(|g| g.user_id != id);
        }
        Ok(())
    }

    // --- Admins ---

    async fn list_admins(&self) -> ApiResult<Vec<AdminAccount>> {
        Ok(self.store.lock().unwrap().admins.clone())
    }

    async fn get_admin(&self, id: i64) -> ApiResult<Option<AdminAccount>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .admins
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn find_admin_by_email(&self, email: &str) -> ApiResult<Option<AdminAccount>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .admins
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn create_admin(&self, admin: NewAdmin) -> ApiResult<AdminAccount> {
        let mut s = self.store.lock().unwrap();
        let id = s.next_id();
        let created = AdminAccount {
            id,
            email: admin.email,
            access_code: admin.access_code,
            created_at: Utc::now(),
        };
        s.admins.push(created.clone());
        Ok(created)
    }

    async fn delete_admin(&self, id: i64) -> ApiResult<()> {
        let mut s = self.store.lock().unwrap();
        let before = s.admins.len();
        s.admins.retain(|a| a.id != id);
        if s.admins.len() == before {
            return Err(ApiError::NotFound("admin"));
        }
        Ok(())
    }

    // --- Access Relation Store ---

    async fn grants_for_type(&self, ty: ContentType) -> ApiResult<Vec<AccessGrant>> {
        Ok(self.store.lock().unwrap().grants.get(ty).clone())
    }

    async fn grants_for_user(&self, user_id: i64) -> ApiResult<GrantSets> {
        let s = self.store.lock().unwrap();
        let mut sets = GrantSets::default();
        for ty in ContentType::TAB_ORDER {
            *sets.get_mut(ty) = s
                .grants
                .get(ty)
                .iter()
                .filter(|g| g.user_id == user_id)
                .cloned()
                .collect();
        }
        Ok(sets)
    }

    /// The same two-phase contract as the Postgres mutator: clear first, then
    /// insert the deduplicated set, failing loudly mid-insert when fault
    /// injection says so (the user is left with partial access for the type).
    async fn replace_access(
        &self,
        user_id: i64,
        ty: ContentType,
        category_ids: &[i64],
    ) -> ApiResult<()> {
        let mut s = self.store.lock().unwrap();

        // Phase 1: delete everything for (user, type).
        s.grants.get_mut(ty).retain(|g| g.user_id != user_id);

        // Phase 2: sequential inserts of the deduplicated set.
        let fail_at = s.fail_grant_insert_at.take();
        let mut seen = HashSet::new();
        for (n, category_id) in category_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .enumerate()
        {
            if fail_at == Some(n) {
                return Err(ApiError::PartialMutation {
                    user_id,
                    content_type: ty,
                    source: sqlx::Error::RowNotFound,
                });
            }
            let id = s.next_id();
            s.grants.get_mut(ty).push(AccessGrant {
                id,
                user_id,
                category_id,
            });
        }
        Ok(())
    }

    async fn revoke_access(&self, ty: ContentType, grant_id: i64) -> ApiResult<()> {
        let mut s = self.store.lock().unwrap();
        let list = s.grants.get_mut(ty);
        let before = list.len();
        list.retain(|g| g.id != grant_id);
        if list.len() == before {
            return Err(ApiError::NotFound("access grant"));
        }
        Ok(())
    }

    // --- Bulk Fetch ---

    async fn load_access_snapshot(&self) -> ApiResult<AccessSnapshot> {
        let s = self.store.lock().unwrap();
        Ok(AccessSnapshot {
            categories: s.categories.clone(),
            library: ContentLibrary {
                audio: s.audio.clone(),
                audio_cloud: s.audio_cloud.clone(),
                pdf: s.pdf.clone(),
                pdf_cloud: s.pdf_cloud.clone(),
                video: s.video.clone(),
                file_cloud: s.files.clone(),
            },
            grants: s.grants.clone(),
        })
    }

    // --- Settings & Stats ---

    async fn get_setting(&self, key: &str) -> ApiResult<Option<PortalSetting>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .settings
            .iter()
            .find(|s| s.key == key)
            .cloned())
    }

    async fn put_setting(&self, key: &str, value: &str) -> ApiResult<PortalSetting> {
        let mut s = self.store.lock().unwrap();
        if let Some(existing) = s.settings.iter_mut().find(|s| s.key == key) {
            existing.value = Some(value.to_string());
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }
        let id = s.next_id();
        let setting = PortalSetting {
            id,
            key: key.to_string(),
            value: Some(value.to_string()),
            updated_at: Utc::now(),
        };
        s.settings.push(setting.clone());
        Ok(setting)
    }

    async fn get_stats(&self) -> ApiResult<DashboardStats> {
        let s = self.store.lock().unwrap();
        let total_content_items = (s.audio.len()
            + s.audio_cloud.len()
            + s.pdf.len()
            + s.pdf_cloud.len()
            + s.video.len()
            + s.files.len()) as i64;
        Ok(DashboardStats {
            total_users: s.users.len() as i64,
            total_admins: s.admins.len() as i64,
            total_categories: s.categories.len() as i64,
            total_content_items,
        })
    }
}

/// Builds an AppState around the given in-memory repository, with mock
/// storage and the default test configuration.
pub fn test_state(repo: Arc<InMemoryRepo>) -> AppState {
    AppState {
        repo: repo as RepositoryState,
        storage: Arc::new(MockStorageService::new()),
        config: AppConfig::default(),
    }
}
