#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use configs::{AppConfig, BootstrapAdmin};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use server::ServerState;

pub const ADMIN_EMAIL: &str = "root@example.com";
pub const ADMIN_PASSWORD: &str = "RootPass123";
pub const JWT_SECRET: &str = "test-secret";
const BOUNDARY: &str = "----bus-admin-test-boundary";

pub struct TestApp {
    pub app: Router,
    pub state: ServerState,
    pub root: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// Router over a fresh SQLite file and upload dir, with one seeded admin.
pub async fn build_app() -> anyhow::Result<TestApp> {
    let root = std::env::temp_dir().join(format!("bus_admin_it_{}", Uuid::new_v4()));
    let mut cfg = AppConfig::default();
    cfg.database.url = format!("sqlite://{}?mode=rwc", root.join("data").join("test.sqlite").display());
    cfg.database.max_connections = 5;
    cfg.auth.jwt_secret = JWT_SECRET.into();
    cfg.auth.bootstrap_admin = Some(BootstrapAdmin {
        name: "Root".into(),
        email: ADMIN_EMAIL.into(),
        password: ADMIN_PASSWORD.into(),
    });
    cfg.uploads.dir = root.join("uploads");
    cfg.normalize_and_validate()?;

    let state = server::startup::prepare_state(&cfg).await?;
    let app = server::startup::build_app(state.clone());
    Ok(TestApp { app, state, root })
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> anyhow::Result<Response<Body>> {
        Ok(self.app.clone().oneshot(req).await?)
    }

    pub async fn login(&self) -> anyhow::Result<String> {
        let resp = self.send(json_request("POST", "/login", &json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}), None)?).await?;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await?;
        Ok(body["token"].as_str().unwrap_or_default().to_string())
    }

    pub async fn stored_files(&self) -> Vec<String> {
        self.state.uploads.list_files().await.unwrap_or_default()
    }
}

pub fn json_request(method: &str, uri: &str, body: &Value, token: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut b = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(t) = token {
        b = b.header("authorization", format!("Bearer {t}"));
    }
    Ok(b.body(Body::from(serde_json::to_vec(body)?))?)
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut b = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        b = b.header("authorization", format!("Bearer {t}"));
    }
    Ok(b.body(Body::empty())?)
}

pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: Vec<u8>,
}

pub fn jpeg(len: usize) -> FilePart<'static> {
    FilePart { field: "busImage", file_name: "bus.jpg", content_type: "image/jpeg", bytes: vec![0xAB; len] }
}

pub fn multipart_request(
    method: &str,
    uri: &str,
    fields: &[(&str, &str)],
    files: Vec<FilePart<'_>>,
    token: Option<&str>,
) -> anyhow::Result<Request<Body>> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes());
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for file in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.field, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut b = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(t) = token {
        b = b.header("authorization", format!("Bearer {t}"));
    }
    Ok(b.body(Body::from(body))?)
}

pub async fn body_json(resp: Response<Body>) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Last path segment of an image URL.
pub fn file_name_of(url: &str) -> String {
    url.rsplit('/').next().unwrap_or_default().to_string()
}
