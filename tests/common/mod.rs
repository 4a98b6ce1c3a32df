#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use league_api::config::{AppConfig, StorageBackend};
use league_api::database::Repositories;
use league_api::routes::build_router;
use league_api::services::bootstrap::ensure_single_admin;
use league_api::services::media_service::MediaStore;
use league_api::state::AppState;

pub const ADMIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024;
const BOUNDARY: &str = "league-test-boundary";

pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub uploads: TempDir,
}

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub bytes: Vec<u8>,
}

/// A file part for [`TestApp::multipart`].
pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub data: &'a [u8],
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Repositories::memory()).await
}

/// Like [`spawn_app`] but over caller-provided repositories.
pub async fn spawn_app_with(repos: Repositories) -> TestApp {
    let uploads = TempDir::new().unwrap();
    let config = AppConfig {
        storage_backend: StorageBackend::Memory,
        jwt_secret: "integration-secret".to_string(),
        uploads_dir: uploads.path().to_path_buf(),
        max_upload_bytes: MAX_UPLOAD_BYTES,
        admin_username: ADMIN.to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        seed_demo_data: false,
        bcrypt_cost: 4,
        ..AppConfig::default()
    };

    ensure_single_admin(repos.users.as_ref(), ADMIN, ADMIN_PASSWORD, config.bcrypt_cost)
        .await
        .unwrap();
    let media = MediaStore::new(config.uploads_dir.clone(), config.max_upload_bytes)
        .await
        .unwrap();

    let state = AppState::new(repos, media, config);
    TestApp {
        router: build_router(state.clone()),
        state,
        uploads,
    }
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply { status, body, bytes }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
        let request = builder(Method::GET, uri, token).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Reply {
        let request = builder(Method::DELETE, uri, token).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Value) -> Reply {
        let request = builder(method, uri, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn form(&self, method: Method, uri: &str, token: Option<&str>, body: &str) -> Reply {
        self.raw(method, uri, token, "application/x-www-form-urlencoded", body)
            .await
    }

    /// Request with an arbitrary content type and raw body.
    pub async fn raw(&self, method: Method, uri: &str, token: Option<&str>, content_type: &str, body: &str) -> Reply {
        let request = builder(method, uri, token)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// File names currently in the uploads directory.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.uploads.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        fields: &[(&str, &str)],
        file: Option<FilePart<'_>>,
    ) -> Reply {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some(file) = file {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    BOUNDARY, file.field, file.file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(file.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = builder(method, uri, token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let reply = self
            .json(
                Method::POST,
                "/api/login",
                None,
                serde_json::json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "login failed: {}", reply.body);
        reply.body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN, ADMIN_PASSWORD).await
    }

    /// Registers `username` and returns its token and id.
    pub async fn register(&self, username: &str) -> (String, i64) {
        let reply = self
            .json(
                Method::POST,
                "/api/register",
                None,
                serde_json::json!({ "username": username, "password": "secret" }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "register failed: {}", reply.body);
        (
            reply.body["token"].as_str().unwrap().to_string(),
            reply.body["user"]["id"].as_i64().unwrap(),
        )
    }

    /// Path on disk behind an `/uploads/...` reference.
    pub fn upload_path(&self, public: &str) -> std::path::PathBuf {
        self.uploads
            .path()
            .join(public.strip_prefix("/uploads/").unwrap())
    }
}
