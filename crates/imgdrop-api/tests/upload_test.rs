//! Upload endpoint integration tests.
//!
//! Run with: `cargo test -p imgdrop-api --test upload_test`

mod helpers;

use axum_test::multipart::MultipartForm;
use helpers::fixtures::{create_minimal_png, jpeg_bytes, png_bytes};
use helpers::{file_form, setup_test_app, setup_test_app_with, PUBLIC_PREFIX, UPLOAD_PATH};
use serde_json::Value;

fn is_stored_name(name: &str, suffix: &str) -> bool {
    let Some((digest, rest)) = name.split_once('_') else {
        return false;
    };
    digest.len() == 16
        && digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        && rest == suffix
}

#[tokio::test]
async fn test_upload_valid_png() {
    let app = setup_test_app().await;
    let data = png_bytes(89, 7);

    let response = app
        .client()
        .post(UPLOAD_PATH)
        .multipart(file_form("file[]", "test.png", "image/png", data.clone()))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.header("cache-control").to_str().unwrap(),
        "public, max-age=3600"
    );

    let body: Value = response.json();
    assert_eq!(body["msg"], "Success!");
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["errFiles"], serde_json::json!([]));
    let url = body["data"]["succMap"]["test.png"].as_str().unwrap();
    let stored = url.strip_prefix(PUBLIC_PREFIX).unwrap();
    assert!(is_stored_name(stored, "test.png"), "unexpected name {stored}");

    assert_eq!(app.stored_files(), vec![stored.to_string()]);
    assert_eq!(std::fs::read(app.upload_root.join(stored)).unwrap(), data);
}

#[tokio::test]
async fn test_upload_accepts_plain_file_field() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(UPLOAD_PATH)
        .multipart(file_form("file", "pixel.png", "image/png", create_minimal_png()))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["data"]["succMap"]["pixel.png"]
        .as_str()
        .unwrap()
        .ends_with("_pixel.png"));
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = setup_test_app().await;

    let form = MultipartForm::new().add_text("comment", "no file here");
    let response = app.client().post(UPLOAD_PATH).multipart(form).await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["msg"], "No file uploaded.");
    assert_eq!(body["code"], 1);
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_non_multipart_body() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(UPLOAD_PATH)
        .bytes(bytes::Bytes::from(png_bytes(89, 1)))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["msg"], "No file uploaded.");
}

#[tokio::test]
async fn test_upload_extension_content_mismatch() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(UPLOAD_PATH)
        .multipart(file_form("file[]", "photo.png", "image/png", jpeg_bytes(120)))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["msg"], "File extension does not match file content.");
    assert_eq!(body["code"], 1);
    assert!(!app.upload_root.exists());
}

#[tokio::test]
async fn test_upload_path_traversal() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(UPLOAD_PATH)
        .multipart(file_form(
            "file[]",
            "../../etc/passwd.png",
            "image/png",
            png_bytes(89, 1),
        ))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["msg"], "Invalid filename path.");
    assert!(!app.upload_root.exists());
}

#[tokio::test]
async fn test_upload_unsupported_extension() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(UPLOAD_PATH)
        .multipart(file_form("file[]", "notes.txt", "text/plain", b"plain text body".to_vec()))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(
        body["msg"],
        "File type not supported. Allowed types: .gif, .jpeg, .jpg, .png, .webp"
    );
}

#[tokio::test]
async fn test_upload_too_small() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(UPLOAD_PATH)
        .multipart(file_form("file[]", "tiny.png", "image/png", vec![0x89, 0x50]))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["msg"], "File is too small or empty.");
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = setup_test_app_with(|config| config.upload.limits.max_file_size = 100).await;

    let response = app
        .client()
        .post(UPLOAD_PATH)
        .multipart(file_form("file[]", "big.png", "image/png", png_bytes(500, 3)))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["msg"]
        .as_str()
        .unwrap()
        .starts_with("File size exceeds maximum allowed size of"));
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_identical_content_is_deduplicated() {
    let app = setup_test_app().await;
    let data = png_bytes(300, 4);

    let first = app
        .client()
        .post(UPLOAD_PATH)
        .multipart(file_form("file[]", "first.png", "image/png", data.clone()))
        .await;
    assert_eq!(first.status_code(), 200);
    let first: Value = first.json();
    assert_eq!(first["msg"], "Success!");
    let first_url = first["data"]["succMap"]["first.png"].as_str().unwrap().to_string();

    let second = app
        .client()
        .post(UPLOAD_PATH)
        .multipart(file_form("file[]", "second.png", "image/png", data))
        .await;
    assert_eq!(second.status_code(), 200);
    let second: Value = second.json();
    assert_eq!(second["msg"], "File uploaded successfully (deduplicated).");
    assert_eq!(second["code"], 0);
    assert_eq!(second["data"]["succMap"]["second.png"], first_url.as_str());

    assert_eq!(app.stored_files().len(), 1);
}

#[tokio::test]
async fn test_upload_unwritable_root() {
    let blocker_dir = tempfile::tempdir().unwrap();
    let blocker = blocker_dir.path().join("occupied");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let app = setup_test_app_with(|config| config.upload.storage_root = blocker.clone()).await;

    let response = app
        .client()
        .post(UPLOAD_PATH)
        .multipart(file_form("file[]", "test.png", "image/png", png_bytes(89, 2)))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["msg"], "Failed to create upload directory.");
    assert_eq!(body["code"], 1);
    assert!(!body["msg"].as_str().unwrap().contains("occupied"));
}

#[tokio::test]
async fn test_upload_route_rejects_get() {
    let app = setup_test_app().await;

    let response = app.client().get(UPLOAD_PATH).await;

    assert_eq!(response.status_code(), 405);
}

#[tokio::test]
async fn test_stored_upload_is_served() {
    let app = setup_test_app().await;
    let data = png_bytes(128, 9);

    let response = app
        .client()
        .post(UPLOAD_PATH)
        .multipart(file_form("file[]", "served.png", "image/png", data.clone()))
        .await;
    let body: Value = response.json();
    let url = body["data"]["succMap"]["served.png"].as_str().unwrap().to_string();

    let served = app.client().get(&url).await;
    assert_eq!(served.status_code(), 200);
    assert_eq!(served.as_bytes().to_vec(), data);
}

#[cfg(unix)]
#[tokio::test]
async fn test_upload_read_only_root_reports_save_error() {
    use std::os::unix::fs::PermissionsExt;

    let app = setup_test_app().await;
    std::fs::create_dir_all(&app.upload_root).unwrap();
    std::fs::set_permissions(&app.upload_root, std::fs::Permissions::from_mode(0o555)).unwrap();

    // Privileged processes ignore directory permissions.
    let check = app.upload_root.join("write-check");
    if std::fs::write(&check, b"x").is_ok() {
        std::fs::remove_file(&check).unwrap();
        std::fs::set_permissions(&app.upload_root, std::fs::Permissions::from_mode(0o755))
            .unwrap();
        return;
    }

    let response = app
        .client()
        .post(UPLOAD_PATH)
        .multipart(file_form("file[]", "test.png", "image/png", png_bytes(89, 5)))
        .await;

    let leftovers = app.stored_files();
    std::fs::set_permissions(&app.upload_root, std::fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["msg"], "Failed to save uploaded file.");
    assert_eq!(body["code"], 1);
    assert!(leftovers.is_empty(), "leftover files: {leftovers:?}");
}
