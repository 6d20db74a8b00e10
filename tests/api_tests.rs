mod common;

use common::{InMemoryRepo, test_state};
use media_portal::create_router;
use media_portal::models::{ContentType, LoginResponse, ResolvedAccess};
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub repo: Arc<InMemoryRepo>,
}

/// Boots the full router (middleware stack included) on an ephemeral port,
/// backed by the in-memory repository and mock storage.
async fn spawn_app() -> TestApp {
    let repo = Arc::new(InMemoryRepo::new());
    let state = test_state(repo.clone());
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}

#[tokio::test]
async fn health_check_responds() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn protected_routes_reject_anonymous_clients() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for path in ["/me", "/me/access", "/admin/stats", "/admin/users"] {
        let response = client
            .get(format!("{}{}", app.address, path))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401, "{path} must require a session");
    }
}

#[tokio::test]
async fn login_then_resolve_access_end_to_end() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Seed: one user, one granted audio category with two tracks, one
    // ungranted pdf category.
    let user = app.repo.seed_user("6281234567890", "ABC123", true);
    let music = app.repo.seed_category("Music", ContentType::Audio);
    let docs = app.repo.seed_category("Docs", ContentType::Pdf);
    app.repo.seed_audio(ContentType::Audio, "Track 1", music.id);
    app.repo.seed_audio(ContentType::Audio, "Track 2", music.id);
    app.repo.seed_pdf(ContentType::Pdf, "Handbook", docs.id);
    app.repo.seed_grant(ContentType::Audio, user.id, music.id);

    // 1. Wrong code: generic 401.
    let response = client
        .post(format!("{}/auth/login", app.address))
        .json(&serde_json::json!({ "phone": "6281234567890", "access_code": "WRONG" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // 2. Correct code: session token.
    let response = client
        .post(format!("{}/auth/login", app.address))
        .json(&serde_json::json!({ "phone": "6281234567890", "access_code": "ABC123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let login: LoginResponse = response.json().await.unwrap();
    assert_eq!(login.subject.id, user.id);

    // 3. Resolved access through the Bearer session: audio only.
    let response = client
        .get(format!("{}/me/access", app.address))
        .bearer_auth(&login.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let access: ResolvedAccess = response.json().await.unwrap();
    assert_eq!(access.audio.len(), 2);
    assert!(access.pdf.is_empty());
    assert_eq!(access.available_tabs, vec!["audio"]);

    // 4. The user session is not an admin session.
    let response = client
        .get(format!("{}/admin/stats", app.address))
        .bearer_auth(&login.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn admin_edits_access_and_user_view_follows() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let user = app.repo.seed_user("6281234567890", "ABC123", true);
    let admin = app.repo.seed_admin("ops@portal.test", "ROOT");
    let music = app.repo.seed_category("Music", ContentType::Audio);
    app.repo.seed_audio(ContentType::Audio, "Track 1", music.id);

    // Admin session.
    let response = client
        .post(format!("{}/auth/admin/login", app.address))
        .json(&serde_json::json!({ "email": "ops@portal.test", "access_code": "ROOT" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let login: LoginResponse = response.json().await.unwrap();
    assert_eq!(login.subject.id, admin.id);
    assert!(login.subject.is_admin);

    // Grant the music category via the bulk replace endpoint.
    let response = client
        .put(format!(
            "{}/admin/users/{}/access/audio",
            app.address, user.id
        ))
        .bearer_auth(&login.token)
        .json(&serde_json::json!({ "category_ids": [music.id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // The user now sees the track.
    let response = client
        .post(format!("{}/auth/login", app.address))
        .json(&serde_json::json!({ "phone": "6281234567890", "access_code": "ABC123" }))
        .send()
        .await
        .unwrap();
    let user_login: LoginResponse = response.json().await.unwrap();

    let access: ResolvedAccess = client
        .get(format!("{}/me/access", app.address))
        .bearer_auth(&user_login.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(access.audio.len(), 1);
    assert_eq!(access.available_tabs, vec!["audio"]);

    // Clearing the grants removes the tab again.
    let response = client
        .put(format!(
            "{}/admin/users/{}/access/audio",
            app.address, user.id
        ))
        .bearer_auth(&login.token)
        .json(&serde_json::json!({ "category_ids": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let access: ResolvedAccess = client
        .get(format!("{}/me/access", app.address))
        .bearer_auth(&user_login.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(access.audio.is_empty());
    assert!(access.available_tabs.is_empty());
}
