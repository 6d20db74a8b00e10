use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use ts_rs::TS;
use utoipa::ToSchema;

/// MediaKind
///
/// The upload pipelines the portal accepts media through. Each kind pins the
/// object key prefix and the MIME types a presigned upload may carry, so an
/// "audio" upload can never smuggle in an arbitrary binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum MediaKind {
    Audio,
    Pdf,
    Video,
    Cover,
    #[default]
    File,
}

impl MediaKind {
    /// Folder prefix under which objects of this kind are stored.
    pub fn prefix(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Pdf => "pdf",
            MediaKind::Video => "video",
            MediaKind::Cover => "covers",
            MediaKind::File => "files",
        }
    }

    /// Whether a client-declared MIME type is acceptable for this kind.
    /// Generic files are unconstrained; everything else must match its medium.
    pub fn accepts(&self, content_type: &str) -> bool {
        match self {
            MediaKind::Audio => content_type.starts_with("audio/"),
            MediaKind::Pdf => content_type == "application/pdf",
            MediaKind::Video => content_type.starts_with("video/"),
            MediaKind::Cover => content_type.starts_with("image/"),
            MediaKind::File => !content_type.is_empty(),
        }
    }
}

/// sanitize_key_segment
///
/// Strips path separators and anything outside a conservative character set
/// from a client-supplied filename fragment before it becomes part of an
/// object key. `../` traversal and exotic characters come out as plain dashes.
pub fn sanitize_key_segment(raw: &str) -> String {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// StorageService
///
/// The file-transfer boundary: everything the portal needs from object
/// storage. The trait lets handlers run against the real S3 client in
/// production and the in-memory mock in tests without caring which.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Used in the `Env::Local` setup
    /// to provision the bucket in MinIO automatically. No-op in production.
    async fn ensure_bucket_exists(&self);

    /// Generates a temporary, signed URL allowing a client to upload a file
    /// directly to the bucket, constrained to the given content type.
    ///
    /// # Arguments
    /// * `key`: the final object key (prefix + filename) in the bucket.
    /// * `content_type`: the MIME type the upload must carry.
    async fn presigned_upload_url(&self, key: &str, content_type: &str)
    -> Result<String, String>;

    /// The public URL an uploaded object is served from; stored on content
    /// items created from an upload key.
    fn public_url(&self, key: &str) -> String;
}

/// StorageState
///
/// The concrete type used to share the storage layer across the application
/// state.
pub type StorageState = Arc<dyn StorageService>;

/// S3StorageClient
///
/// The real implementation using the AWS SDK. S3 compatibility means the same
/// client speaks to a Dockerized MinIO locally and managed object storage in
/// production. `force_path_style(true)` is required for MinIO-style gateways.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    public_base: String,
}

impl S3StorageClient {
    /// Constructs the S3 client from AppConfig-resolved credentials.
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_base: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            // Path-style addressing (http://endpoint/bucket/key) is required
            // for MinIO and most S3-compatible gateways.
            .force_path_style(true)
            .build();

        let client = s3::Client::from_conf(config);

        Self {
            client,
            bucket_name: bucket.to_string(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// Idempotent bucket creation; safe to call at every startup.
    async fn ensure_bucket_exists(&self) {
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String> {
        // Ten-minute expiry: long enough for a large video over a slow link,
        // short enough that leaked URLs go stale quickly.
        let expires_in = Duration::from_secs(600);

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            // The signed request pins this Content-Type; the upload must match.
            .content_type(content_type)
            .presigned(PresigningConfig::expires_in(expires_in).map_err(|e| e.to_string())?)
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base, self.bucket_name, key)
    }
}

/// MockStorageService
///
/// In-memory stand-in for tests: deterministic fake URLs, optional forced
/// failure, same key sanitization rules as the real pipeline.
pub struct MockStorageService {
    fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { fail: false }
    }

    /// A mock whose presign calls always fail, for error-path tests.
    pub fn new_failing() -> Self {
        Self { fail: true }
    }
}

impl Default for MockStorageService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String> {
        if self.fail {
            return Err("mock storage unavailable".to_string());
        }
        let key = sanitize_key_segment(key);
        Ok(format!(
            "https://storage.test/portal-media/{key}?content-type={content_type}&signature=fake"
        ))
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://storage.test/portal-media/{key}")
    }
}
