use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Content Type Domain ---

/// ContentType
///
/// The six parallel media domains the access model operates over. Each variant
/// maps to one content table and one user-access relation in the persistent
/// store; keeping the mapping on the enum replaces six near-identical code
/// paths with one parameterized path while preserving the per-type storage
/// boundary the external store expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ContentType {
    Audio,
    AudioCloud,
    Pdf,
    PdfCloud,
    Video,
    FileCloud,
}

impl ContentType {
    /// Fixed tab precedence used by the UI: the first type with any granted
    /// category becomes the default tab, so this order must never be derived
    /// alphabetically or from map iteration.
    pub const TAB_ORDER: [ContentType; 6] = [
        ContentType::Audio,
        ContentType::AudioCloud,
        ContentType::Pdf,
        ContentType::PdfCloud,
        ContentType::Video,
        ContentType::FileCloud,
    ];

    /// The table holding this type's content items.
    pub fn content_table(&self) -> &'static str {
        match self {
            ContentType::Audio => "audios",
            ContentType::AudioCloud => "audio_cloud_files",
            ContentType::Pdf => "pdfs",
            ContentType::PdfCloud => "pdf_cloud_files",
            ContentType::Video => "videos",
            ContentType::FileCloud => "file_cloud_files",
        }
    }

    /// The relation holding (user_id, category_id) grants for this type.
    pub fn grant_table(&self) -> &'static str {
        match self {
            ContentType::Audio => "user_audio_access",
            ContentType::AudioCloud => "user_audio_cloud_access",
            ContentType::Pdf => "user_pdf_access",
            ContentType::PdfCloud => "user_pdf_cloud_access",
            ContentType::Video => "user_video_access",
            ContentType::FileCloud => "user_file_cloud_access",
        }
    }

    /// Stable tab identifier consumed by the web client.
    pub fn tab_id(&self) -> &'static str {
        match self {
            ContentType::Audio => "audio",
            ContentType::AudioCloud => "audio-cloud",
            ContentType::Pdf => "pdf",
            ContentType::PdfCloud => "pdf-cloud",
            ContentType::Video => "video",
            ContentType::FileCloud => "files",
        }
    }

    /// Human-readable label used in access summaries.
    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Audio => "audio",
            ContentType::AudioCloud => "cloud audio",
            ContentType::Pdf => "PDF",
            ContentType::PdfCloud => "cloud PDF",
            ContentType::Video => "video",
            ContentType::FileCloud => "file",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentType::Audio => "audio",
            ContentType::AudioCloud => "audio_cloud",
            ContentType::Pdf => "pdf",
            ContentType::PdfCloud => "pdf_cloud",
            ContentType::Video => "video",
            ContentType::FileCloud => "file_cloud",
        };
        f.write_str(name)
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio" => Ok(ContentType::Audio),
            "audio_cloud" => Ok(ContentType::AudioCloud),
            "pdf" => Ok(ContentType::Pdf),
            "pdf_cloud" => Ok(ContentType::PdfCloud),
            "video" => Ok(ContentType::Video),
            "file_cloud" => Ok(ContentType::FileCloud),
            other => Err(format!("unknown content type '{other}'")),
        }
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// Category
///
/// Admin-defined grouping that content items are tagged with. The optional
/// `filter` is a type-hint classifying which content type the category is
/// intended for; it drives admin form pre-selection only and never gates
/// resolution (grants do).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    // Stored as plain text; unknown or absent values fall back to the baseline type.
    pub filter: Option<String>,
}

impl Category {
    /// The content type this category is intended for. Absent (or unparseable)
    /// filters default to the baseline PDF type, matching the admin form default.
    pub fn filter_type(&self) -> ContentType {
        self.filter
            .as_deref()
            .and_then(|f| f.parse().ok())
            .unwrap_or(ContentType::Pdf)
    }
}

/// AudioItem
///
/// One playable audio track. The same shape backs both the `audios` table and
/// its cloud variant `audio_cloud_files`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct AudioItem {
    pub id: i64,
    pub title: String,
    pub file_url: String,
    pub category_id: i64,
}

/// PdfItem
///
/// One viewable/downloadable document with a cover image. Backs `pdfs` and
/// `pdf_cloud_files`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct PdfItem {
    pub id: i64,
    pub title: String,
    pub cover_url: String,
    pub file_url: String,
    pub category_id: i64,
}

/// VideoItem
///
/// One streamable video, referenced by URL only (playback is the client's
/// concern).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct VideoItem {
    pub id: i64,
    pub title: String,
    pub video_url: String,
    pub category_id: i64,
}

/// FileItem
///
/// A generic downloadable file with a cover and an optional free-form type tag
/// (e.g. "zip", "xlsx"). Backs `file_cloud_files`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct FileItem {
    pub id: i64,
    pub title: String,
    pub cover_url: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub category_id: i64,
}

/// UserAccount
///
/// An end-user record. `username` holds the user's phone number; `access_code`
/// is the plaintext-equivalent login code the operator hands out. A user's
/// content access is entirely extensional: it lives in the six grant
/// relations, never on this record.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub access_code: String,
    pub name: Option<String>,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// AdminAccount
///
/// An operator record. Admins bypass access resolution entirely and hold the
/// unrestricted capability.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AdminAccount {
    pub id: i64,
    pub email: String,
    pub access_code: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// AccessGrant
///
/// One (user, category) pair in one of the six per-type relations, meaning
/// "this user may see items in this category for this type". The relation a
/// grant came from is carried by context (the ContentType parameter), not on
/// the row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct AccessGrant {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
}

/// PortalSetting
///
/// A key/value row for operator-editable portal settings (currently the
/// outbound chat button's destination number and prefilled message).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PortalSetting {
    pub id: i64,
    pub key: String,
    pub value: Option<String>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Identity Schemas ---

/// Subject
///
/// The resolved identity an authenticated request acts as. `permissions` is a
/// fixed marker list persisted alongside the session for client use
/// (`["all"]` for admins); the Resolver never consults it, category grants
/// are the sole authority on what a user sees.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Subject {
    pub id: i64,
    pub is_admin: bool,
    pub name: Option<String>,
    pub permissions: Vec<String>,
}

impl Subject {
    /// The fixed permission list every regular user receives.
    pub fn user_permissions() -> Vec<String> {
        ["audio", "pdf", "video", "files"]
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    /// The unrestricted permission marker admins receive.
    pub fn admin_permissions() -> Vec<String> {
        vec!["all".to_string()]
    }
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// End-user credentials: phone number plus the handed-out access code.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub phone: String,
    pub access_code: String,
}

/// AdminLoginRequest
///
/// Operator credentials.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminLoginRequest {
    pub email: String,
    pub access_code: String,
}

/// LoginResponse
///
/// A signed session token plus the resolved subject. The client persists both
/// for session continuity and sends the token as a Bearer header thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub subject: Subject,
}

/// CreateCategoryRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub filter: Option<ContentType>,
}

/// UpdateCategoryRequest
///
/// Partial update payload: only supplied fields change.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCategoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<ContentType>,
}

/// CreateContentRequest
///
/// Superset payload for creating a content item of any of the six types; the
/// admin forms share one modal shape. Which fields are required depends on the
/// target type and is validated in the handler. The media source is either a
/// pasted URL or an object key from the upload pipeline; supplying neither is
/// a validation error, never a silent fallback.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateContentRequest {
    pub title: String,
    pub category_id: i64,

    /// Direct URL to the media file (mutually exclusive with `upload_key`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    /// Object key returned by the presigned upload flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_key: Option<String>,

    /// Cover image URL; required for the PDF and file shapes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Free-form type tag for generic files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

/// UpdateContentRequest
///
/// Partial-update counterpart of [`CreateContentRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

/// CreateUserRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateUserRequest {
    pub username: String,
    pub access_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Defaults to active when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// UpdateUserRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// CreateAdminRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateAdminRequest {
    pub email: String,
    pub access_code: String,
}

/// ReplaceAccessRequest
///
/// The full desired grant set for one (user, content type). An empty list is a
/// legal request and clears the user's access for that type.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ReplaceAccessRequest {
    pub category_ids: Vec<i64>,
}

/// ChatSettingsRequest
///
/// Destination number and prefilled message body for the outbound chat button.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChatSettingsRequest {
    pub number: String,
    #[serde(default)]
    pub message: String,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived upload URL. The media kind
/// constrains the accepted MIME types and the object key prefix.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "lesson-01.mp3")]
    pub filename: String,
    /// The MIME type, used to constrain the upload to the allowed type.
    #[schema(example = "audio/mpeg")]
    pub file_type: String,
    /// Which media pipeline the file belongs to (audio, pdf, video, cover, file).
    pub kind: crate::storage::MediaKind,
}

/// PresignedUrlResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key where the file will land (echoed back in the create call).
    pub resource_key: String,
}

// --- Output Schemas ---

/// ContentItem
///
/// Type-erased content item for endpoints that are generic over the six
/// content types. Serialized untagged: the wire shape is exactly the
/// underlying item's shape.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(untagged)]
#[ts(export)]
pub enum ContentItem {
    Audio(AudioItem),
    Pdf(PdfItem),
    Video(VideoItem),
    File(FileItem),
}

/// GrantSets
///
/// All six grant relations for one scope (one user, or the whole store),
/// keyed by content type.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct GrantSets {
    pub audio: Vec<AccessGrant>,
    pub audio_cloud: Vec<AccessGrant>,
    pub pdf: Vec<AccessGrant>,
    pub pdf_cloud: Vec<AccessGrant>,
    pub video: Vec<AccessGrant>,
    pub file_cloud: Vec<AccessGrant>,
}

impl GrantSets {
    pub fn get(&self, ty: ContentType) -> &Vec<AccessGrant> {
        match ty {
            ContentType::Audio => &self.audio,
            ContentType::AudioCloud => &self.audio_cloud,
            ContentType::Pdf => &self.pdf,
            ContentType::PdfCloud => &self.pdf_cloud,
            ContentType::Video => &self.video,
            ContentType::FileCloud => &self.file_cloud,
        }
    }

    pub fn get_mut(&mut self, ty: ContentType) -> &mut Vec<AccessGrant> {
        match ty {
            ContentType::Audio => &mut self.audio,
            ContentType::AudioCloud => &mut self.audio_cloud,
            ContentType::Pdf => &mut self.pdf,
            ContentType::PdfCloud => &mut self.pdf_cloud,
            ContentType::Video => &mut self.video,
            ContentType::FileCloud => &mut self.file_cloud,
        }
    }
}

/// ContentLibrary
///
/// Fully materialized content collections, one per type. Shapes differ, so
/// this stays an explicit struct rather than a keyed map.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContentLibrary {
    pub audio: Vec<AudioItem>,
    pub audio_cloud: Vec<AudioItem>,
    pub pdf: Vec<PdfItem>,
    pub pdf_cloud: Vec<PdfItem>,
    pub video: Vec<VideoItem>,
    pub file_cloud: Vec<FileItem>,
}

/// AccessSnapshot
///
/// Everything resolution needs, fetched in one bulk operation: resolution
/// requires the complete grant picture for a user (tab availability cannot be
/// derived from a page of grants).
#[derive(Debug, Clone, Default)]
pub struct AccessSnapshot {
    pub categories: Vec<Category>,
    pub library: ContentLibrary,
    pub grants: GrantSets,
}

/// AccessCounts
///
/// Per-type granted-category counts, used for the human-readable access
/// summary shown after login.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct AccessCounts {
    pub audio: usize,
    pub audio_cloud: usize,
    pub pdf: usize,
    pub pdf_cloud: usize,
    pub video: usize,
    pub file_cloud: usize,
}

impl AccessCounts {
    pub fn get(&self, ty: ContentType) -> usize {
        match ty {
            ContentType::Audio => self.audio,
            ContentType::AudioCloud => self.audio_cloud,
            ContentType::Pdf => self.pdf,
            ContentType::PdfCloud => self.pdf_cloud,
            ContentType::Video => self.video,
            ContentType::FileCloud => self.file_cloud,
        }
    }

    pub fn set(&mut self, ty: ContentType, n: usize) {
        match ty {
            ContentType::Audio => self.audio = n,
            ContentType::AudioCloud => self.audio_cloud = n,
            ContentType::Pdf => self.pdf = n,
            ContentType::PdfCloud => self.pdf_cloud = n,
            ContentType::Video => self.video = n,
            ContentType::FileCloud => self.file_cloud = n,
        }
    }

    /// Renders "2 audio, 1 PDF and 3 video categories" style summaries; types
    /// with zero granted categories are omitted.
    pub fn describe(&self) -> String {
        let parts: Vec<String> = ContentType::TAB_ORDER
            .iter()
            .filter(|ty| self.get(**ty) > 0)
            .map(|ty| format!("{} {}", self.get(*ty), ty.label()))
            .collect();

        match parts.len() {
            0 => "no content categories yet".to_string(),
            1 => format!("{} categories", parts[0]),
            _ => {
                let (last, head) = parts.split_last().expect("non-empty");
                format!("{} and {} categories", head.join(", "), last)
            }
        }
    }
}

/// ResolvedAccess
///
/// The computed, per-subject view: exactly which content items are visible per
/// type, which tabs the UI should offer (in fixed precedence order), and the
/// per-type granted-category counts.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ResolvedAccess {
    pub audio: Vec<AudioItem>,
    pub audio_cloud: Vec<AudioItem>,
    pub pdf: Vec<PdfItem>,
    pub pdf_cloud: Vec<PdfItem>,
    pub video: Vec<VideoItem>,
    pub file_cloud: Vec<FileItem>,
    /// Tab identifiers, ordered audio, audio-cloud, pdf, pdf-cloud, video, files.
    pub available_tabs: Vec<String>,
    pub counts: AccessCounts,
}

/// MeResponse
///
/// The authenticated subject plus a one-line description of what they can see.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MeResponse {
    pub subject: Subject,
    pub summary: String,
    pub available_tabs: Vec<String>,
}

/// ChatLinkResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChatLinkResponse {
    pub url: String,
}

/// ChatSettings
///
/// Current chat-button configuration as stored; either half may be unset on a
/// fresh install.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChatSettings {
    pub number: Option<String>,
    pub message: Option<String>,
}

/// DashboardStats
///
/// Output schema for the administrative statistics dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_admins: i64,
    pub total_categories: i64,
    /// Sum of item counts across all six content collections.
    pub total_content_items: i64,
}
