mod common;

use std::sync::Arc;

use common::StubApi;
use vidzpro_core::{
    ApiService, AuthService, FileStore, KeyValueStore, MemoryStore, VidzproError, VideoPager,
    library::{download_certificate, generate_certificate},
    storage::{ACCESS_TOKEN_KEY, is_acknowledged, set_acknowledged},
    types::{ChangePasswordRequest, LoginData, UpdateProfileRequest, Video, VideoId, VideoPage},
};

fn login_data() -> LoginData {
    LoginData {
        user_id: 5,
        name: "Ann".into(),
        email: "ann@example.com".into(),
        access_token: "tok-123".into(),
    }
}

fn page(current: u32, last: u32, ids: &[u64]) -> VideoPage {
    VideoPage {
        current_page: current,
        last_page: last,
        data: ids
            .iter()
            .map(|&id| Video {
                id: VideoId(id),
                video_title: format!("Video {id}"),
                description: String::new(),
                video_url: format!("https://vimeo.com/{id}"),
                video_thumbnail: String::new(),
                assign_date: "2025-01-01".into(),
                is_completed: false,
                completed_date: None,
            })
            .collect(),
    }
}

#[tokio::test]
async fn file_store_survives_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let store = FileStore::new(&path);
    store.set(ACCESS_TOKEN_KEY, "tok-123").await.unwrap();
    set_acknowledged(&store, VideoId(7)).await.unwrap();
    store.remove("never-set").await.unwrap();

    let reopened = FileStore::new(&path);
    assert_eq!(
        reopened.get(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
        Some("tok-123")
    );
    assert!(is_acknowledged(&reopened, VideoId(7)).await);
    assert!(!is_acknowledged(&reopened, VideoId(8)).await);

    reopened.remove(ACCESS_TOKEN_KEY).await.unwrap();
    assert_eq!(FileStore::new(&path).get(ACCESS_TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn corrupt_store_file_is_a_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "not json").unwrap();

    let store = FileStore::new(&path);
    let err = store.get(ACCESS_TOKEN_KEY).await.unwrap_err();
    assert!(matches!(err, VidzproError::Storage { .. }));
    assert!(!is_acknowledged(&store, VideoId(1)).await);
}

#[tokio::test]
async fn login_persists_and_restore_reinstalls_token() {
    let api = Arc::new(StubApi::default());
    api.state.lock().unwrap().login = Some(login_data());
    let store = Arc::new(MemoryStore::new());

    let auth = AuthService::new(Arc::clone(&api), Arc::clone(&store));
    let data = auth.login(" ann@example.com ", "secret1").await.unwrap();
    assert_eq!(data.user_id, 5);
    assert!(api.has_access_token().await);
    assert_eq!(
        store.get(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
        Some("tok-123")
    );

    let fresh_api = Arc::new(StubApi::default());
    let restored = AuthService::new(Arc::clone(&fresh_api), Arc::clone(&store));
    assert!(restored.restore().await);
    assert!(fresh_api.has_access_token().await);

    restored.logout().await.unwrap();
    assert!(!fresh_api.has_access_token().await);
    assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
    assert!(!restored.restore().await);
}

#[tokio::test]
async fn failed_login_stores_nothing() {
    let api = Arc::new(StubApi::default());
    let store = Arc::new(MemoryStore::new());
    let auth = AuthService::new(Arc::clone(&api), Arc::clone(&store));

    let err = auth.login("ann@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, VidzproError::Rejected { .. }));
    assert!(!api.has_access_token().await);
    assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);

    let empty = auth.login("", "").await.unwrap_err();
    assert!(matches!(empty, VidzproError::Validation { field: "credentials", .. }));
}

#[tokio::test]
async fn account_forms_validate_before_calling_backend() {
    let api = Arc::new(StubApi::default());
    let auth = AuthService::new(api, Arc::new(MemoryStore::new()));

    assert!(auth.forgot_password("   ").await.is_err());
    assert_eq!(
        auth.forgot_password(" ann@example.com ").await.unwrap(),
        "Reset link sent to ann@example.com"
    );

    let mismatch = ChangePasswordRequest {
        current_password: "old-pass".into(),
        new_password: "secret1".into(),
        confirm_password: "secret2".into(),
    };
    assert!(auth.change_password(&mismatch).await.is_err());

    let nameless = UpdateProfileRequest {
        first_name: " ".into(),
        last_name: "Smith".into(),
        phone: "5551234567".into(),
    };
    assert!(matches!(
        auth.update_profile(&nameless).await.unwrap_err(),
        VidzproError::Validation { field: "first_name", .. }
    ));

    let profile = UpdateProfileRequest {
        first_name: "Ann".into(),
        ..nameless
    };
    assert_eq!(auth.update_profile(&profile).await.unwrap().name, "Ann Smith");
}

#[tokio::test]
async fn pager_walks_every_page_once() {
    let api = Arc::new(StubApi::default());
    api.state.lock().unwrap().pages = vec![page(1, 3, &[1, 2]), page(2, 3, &[3]), page(3, 3, &[4])];

    let mut pager = VideoPager::new(Arc::clone(&api), "Safety");
    let videos = pager.collect_all().await.unwrap();

    assert_eq!(
        videos.iter().map(|v| v.id.0).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    assert!(!pager.has_more());
    assert_eq!(pager.next_page().await.unwrap(), None);
    assert_eq!(api.state.lock().unwrap().page_requests, vec![1, 2, 3]);
}

#[tokio::test]
async fn certificates_only_for_known_categories() {
    let api = StubApi::default();

    let cert = generate_certificate(&api, "ISOVideos").await.unwrap();
    assert_eq!(cert.file_url, "https://files.example.com/isovideos.pdf");

    let err = generate_certificate(&api, "forklift").await.unwrap_err();
    assert!(matches!(err, VidzproError::Validation { field: "category", .. }));
}

#[tokio::test]
async fn downloaded_certificate_lands_in_the_chosen_dir() {
    let api = StubApi::default();
    let dir = tempfile::tempdir().unwrap();

    let saved = download_certificate(&api, "toolbox", dir.path()).await.unwrap();
    assert_eq!(saved.path, dir.path().join("toolbox.pdf"));
    assert!(saved.bytes > 0);
    assert!(saved.path.exists());

    let err = download_certificate(&api, "forklift", dir.path()).await.unwrap_err();
    assert!(matches!(err, VidzproError::Validation { field: "category", .. }));
}
