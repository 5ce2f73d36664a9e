#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use userhub_api::config::{ServerConfig, StoreBackend, StoreConfig};
use userhub_api::router::build_app_router;
use userhub_api::state::AppState;
use userhub_core::migration::{DEFAULT_DATASET, DEFAULT_TABLE};
use userhub_core::session::SESSION_COOKIE_NAME;
use userhub_core::user::{NewUser, User};
use userhub_db::memory::{MemorySessionStore, MemoryUserStore, MemoryWarehouse};
use userhub_db::{UserStore, WarehouseTarget};

/// Build a test `ServerConfig` backed by the in-memory stores.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        session_ttl_mins: 30,
        store: StoreConfig {
            backend: StoreBackend::Memory,
            project_id: None,
            datastore_emulator_host: None,
            bigquery_emulator_host: None,
            dataset: DEFAULT_DATASET.to_string(),
            table: DEFAULT_TABLE.to_string(),
            credentials_file: None,
            access_token: None,
        },
    }
}

pub fn test_target() -> WarehouseTarget {
    WarehouseTarget {
        dataset: DEFAULT_DATASET.to_string(),
        table: DEFAULT_TABLE.to_string(),
    }
}

/// The full router plus handles on the stores behind it.
pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserStore>,
    pub sessions: Arc<MemorySessionStore>,
    pub warehouse: Arc<MemoryWarehouse>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_warehouse(MemoryWarehouse::new(test_target()))
    }

    pub fn with_warehouse(warehouse: MemoryWarehouse) -> Self {
        Self::build(test_config(), warehouse)
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self::build(config, MemoryWarehouse::new(test_target()))
    }

    fn build(config: ServerConfig, warehouse: MemoryWarehouse) -> Self {
        let users = Arc::new(MemoryUserStore::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let warehouse = Arc::new(warehouse);

        let state = AppState::new(
            config,
            users.clone(),
            sessions.clone(),
            warehouse.clone(),
        );

        Self {
            router: build_app_router(state),
            users,
            sessions,
            warehouse,
        }
    }

    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Insert a user straight into the store.
    pub async fn seed_user(&self, name: &str, email: &str, password: &str) -> User {
        self.users
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                ..Default::default()
            })
            .await
            .expect("seeding a user should succeed")
    }

    /// Seed a user, log in through the API and return the `Cookie` header
    /// value carrying the session.
    pub async fn login_cookie(&self) -> String {
        self.seed_user("Admin", "admin@x.com", "secret").await;
        let response = post_json(
            self.app(),
            "/login",
            serde_json::json!({ "email": "admin@x.com", "password": "secret" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        session_cookie(&response).expect("login must set the session cookie")
    }
}

/// The `USER_SESSION_ID=<token>` pair from a response's `Set-Cookie` header.
pub fn session_cookie<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
        .map(str::to_string)
}

/// Read the full response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("reading the body should succeed")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("router is infallible")
}

fn request(method: Method, uri: &str, cookie: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match cookie {
        Some(cookie) => builder.header(COOKIE, cookie),
        None => builder,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, cookie: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, Some(cookie)).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send_json(app, Method::POST, uri, None, body).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    cookie: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send_json(app, Method::POST, uri, Some(cookie), body).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    cookie: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send_json(app, Method::PUT, uri, Some(cookie), body).await
}

pub async fn post_auth(app: Router, uri: &str, cookie: &str) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(cookie)).body(Body::empty()).unwrap()).await
}

pub async fn delete_auth(app: Router, uri: &str, cookie: &str) -> Response<Body> {
    send(app, request(Method::DELETE, uri, Some(cookie)).body(Body::empty()).unwrap()).await
}

async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    let request = request(method, uri, cookie)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Post `file` as the `file` part of a multipart form.
pub async fn post_multipart(app: Router, uri: &str, field: &str, file: Vec<u8>) -> Response<Body> {
    const BOUNDARY: &str = "userhub-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"users.xlsx\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        b"Content-Type: application/vnd.openxmlformats-officedocument.spreadsheetml.sheet\r\n\r\n",
    );
    body.extend_from_slice(&file);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}
