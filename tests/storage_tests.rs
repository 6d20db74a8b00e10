use media_portal::storage::{
    MediaKind, MockStorageService, S3StorageClient, StorageService, sanitize_key_segment,
};
use uuid::Uuid;

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn mock_presign_embeds_key_and_fake_signature() {
        let mock = MockStorageService::new();
        let result = mock
            .presigned_upload_url("lesson-01.mp3", "audio/mpeg")
            .await;
        assert!(result.is_ok());

        let url = result.unwrap();
        assert!(url.contains("signature=fake"));
        assert!(url.contains("lesson-01.mp3"));
        assert!(url.contains("content-type=audio/mpeg"));
    }

    #[tokio::test]
    async fn failing_mock_surfaces_error() {
        let mock = MockStorageService::new_failing();
        let result = mock.presigned_upload_url("lesson.mp3", "audio/mpeg").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn mock_sanitizes_traversal_attempts() {
        let mock = MockStorageService::new();
        let url = mock
            .presigned_upload_url("../../etc/passwd", "text/plain")
            .await
            .unwrap();
        assert!(!url.contains(".."));
    }

    #[test]
    fn public_url_is_stable() {
        let mock = MockStorageService::new();
        assert_eq!(
            mock.public_url("pdf/handbook.pdf"),
            "https://storage.test/portal-media/pdf/handbook.pdf"
        );
    }
}

#[cfg(test)]
mod sanitization_tests {
    use super::*;

    #[test]
    fn strips_directories_and_odd_characters() {
        assert_eq!(sanitize_key_segment("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_key_segment("my file (1).mp3"), "my-file--1-.mp3");
        assert_eq!(sanitize_key_segment("C:\\uploads\\report.pdf"), "report.pdf");
        assert_eq!(sanitize_key_segment(""), "file");
        assert_eq!(sanitize_key_segment("..."), "file");
    }
}

#[cfg(test)]
mod media_kind_tests {
    use super::*;

    #[test]
    fn kinds_accept_only_their_medium() {
        assert!(MediaKind::Audio.accepts("audio/mpeg"));
        assert!(!MediaKind::Audio.accepts("video/mp4"));
        assert!(MediaKind::Pdf.accepts("application/pdf"));
        assert!(!MediaKind::Pdf.accepts("application/zip"));
        assert!(MediaKind::Video.accepts("video/mp4"));
        assert!(MediaKind::Cover.accepts("image/jpeg"));
        assert!(!MediaKind::Cover.accepts("audio/mpeg"));
        // Generic files are unconstrained beyond non-emptiness.
        assert!(MediaKind::File.accepts("application/zip"));
        assert!(!MediaKind::File.accepts(""));
    }

    #[test]
    fn prefixes_are_per_kind() {
        assert_eq!(MediaKind::Audio.prefix(), "audio");
        assert_eq!(MediaKind::Cover.prefix(), "covers");
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    #[tokio::test]
    async fn s3_client_construction_does_not_panic() {
        let _client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
            "http://localhost:9000",
        )
        .await;
    }

    #[tokio::test]
    async fn s3_presigned_url_contains_endpoint_and_key() {
        let client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
            "http://localhost:9000",
        )
        .await;

        // Presigning is purely local signature computation; no network needed.
        let key = format!("pdf/{}.pdf", Uuid::new_v4());
        let result = client.presigned_upload_url(&key, "application/pdf").await;
        assert!(result.is_ok());

        let url = result.unwrap();
        assert!(url.contains("localhost:9000"));
        assert!(url.contains(&key));
    }

    #[test]
    fn public_url_joins_base_bucket_and_key() {
        // Construction is async only because of the SDK; use a runtime.
        let rt = tokio::runtime::Runtime::new().unwrap();
        let client = rt.block_on(S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "k",
            "s",
            "media",
            "https://cdn.example.com/",
        ));
        assert_eq!(
            client.public_url("audio/a.mp3"),
            "https://cdn.example.com/media/audio/a.mp3"
        );
    }
}
