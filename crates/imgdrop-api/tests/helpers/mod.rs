//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p imgdrop-api`.

pub mod fixtures;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use imgdrop_api::setup::routes;
use imgdrop_api::{initialize_state, AppState};
use imgdrop_core::{Config, UploadSettings};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const UPLOAD_PATH: &str = "/api/v0/uploads/images";
pub const PUBLIC_PREFIX: &str = "/media/uploads/";

/// Test application: server plus the temporary directory backing the upload root.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub upload_root: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Names of the objects currently in the upload root.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(&self.upload_root) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

/// Setup test app with an isolated upload root.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup test app, letting the caller adjust the configuration first.
pub async fn setup_test_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let upload_root = temp_dir.path().join("uploads");

    let mut config = Config::with_upload(UploadSettings::with_root(
        upload_root.clone(),
        PUBLIC_PREFIX,
    ));
    adjust(&mut config);
    let upload_root = config.upload.storage_root.clone();

    let state = initialize_state(&config)
        .await
        .expect("Failed to initialize state");
    let router = routes::setup_routes(&config, state.clone())
        .await
        .expect("Failed to setup routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        upload_root,
        _temp_dir: temp_dir,
    }
}

/// Multipart form carrying one file under `field`.
pub fn file_form(field: &str, file_name: &str, mime_type: &str, data: Vec<u8>) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name(file_name.to_string())
        .mime_type(mime_type.to_string());
    MultipartForm::new().add_part(field.to_string(), part)
}
