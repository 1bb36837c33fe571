#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

use realtydesk::backend::memory::MemoryBackend;
use realtydesk::config::Config;
use realtydesk::state::SharedState;

pub const PASSWORD: &str = "password123";
pub const INDEX_HTML: &str = "<!doctype html><title>RealtyDesk</title>";

/// A running test server backed by a fresh in-memory backend.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub backend: MemoryBackend,
    pub state: SharedState,
    pub static_dir: PathBuf,
}

/// Value of the `realty_session` cookie set by a response, if any.
pub fn session_cookie(resp: &Response) -> Option<String> {
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|c| c.strip_prefix("realty_session="))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
}

async fn read(resp: Response) -> (Value, StatusCode) {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(json!(null));
    (body, status)
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn cookie_header(session: &str) -> String {
        format!("realty_session={session}")
    }

    /// Register an account; returns (body, status, session cookie).
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> (Value, StatusCode, Option<String>) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({
                "email": email,
                "password": password,
                "name": name,
                "phones": [],
                "experience": 0,
                "city": {},
                "region": {},
            }))
            .send()
            .await
            .expect("register request failed");
        let cookie = session_cookie(&resp);
        let (body, status) = read(resp).await;
        (body, status, cookie)
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode, Option<String>) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let cookie = session_cookie(&resp);
        let (body, status) = read(resp).await;
        (body, status, cookie)
    }

    /// Register a realtor and return their session cookie.
    pub async fn bootstrap(&self, email: &str) -> String {
        let (body, status, cookie) = self.register(email, PASSWORD, "Realtor").await;
        assert_eq!(status, StatusCode::OK, "bootstrap register failed: {body}");
        cookie.expect("register sets the session cookie")
    }

    /// Create a property, return its id.
    pub async fn create_property(&self, session: &str, title: &str, price: f64) -> String {
        let (body, status) = self
            .post_auth("/api/v1/properties", session, &property_json(title, price))
            .await;
        assert_eq!(status, StatusCode::OK, "create property failed: {body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Create a client, return its id.
    pub async fn create_client(&self, session: &str, name: &str) -> String {
        let (body, status) = self
            .post_auth("/api/v1/clients", session, &client_json(name))
            .await;
        assert_eq!(status, StatusCode::OK, "create client failed: {body}");
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn get_auth(&self, path: &str, session: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .header("cookie", Self::cookie_header(session))
            .send()
            .await
            .expect("get request failed");
        read(resp).await
    }

    pub async fn post_auth(&self, path: &str, session: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .header("cookie", Self::cookie_header(session))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        read(resp).await
    }

    pub async fn put_auth(&self, path: &str, session: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .header("cookie", Self::cookie_header(session))
            .json(body)
            .send()
            .await
            .expect("put request failed");
        read(resp).await
    }

    pub async fn delete_auth(&self, path: &str, session: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .header("cookie", Self::cookie_header(session))
            .send()
            .await
            .expect("delete request failed");
        read(resp).await
    }

    /// Upload `data` as the multipart `file` field of a property.
    pub async fn upload_image(
        &self,
        session: &str,
        property_id: &str,
        file_name: &str,
        data: &[u8],
    ) -> (Value, StatusCode) {
        let boundary = "realtydesk-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let resp = self
            .client
            .post(self.url(&format!("/api/v1/properties/{property_id}/images")))
            .header("cookie", Self::cookie_header(session))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .expect("upload request failed");
        read(resp).await
    }
}

pub fn property_json(title: &str, price: f64) -> Value {
    json!({
        "title": title,
        "description": "Bright flat near the park",
        "price": price,
        "priceType": "fixed",
        "category": "apartment",
        "subcategory": "flat",
        "status": "active",
        "featured": false,
        "address": { "street": "Shevchenka 1", "city": "Kyiv", "region": "Kyiv" },
        "details": { "area": 54.5, "rooms": 2, "hasParking": true },
        "amenities": ["balcony"],
        "images": [],
        "contactInfo": { "name": "Olena", "phone": "+380501234567" },
    })
}

pub fn client_json(name: &str) -> Value {
    json!({
        "name": name,
        "phone": "+380671112233",
        "email": "buyer@example.com",
        "status": "potential",
        "interests": {
            "category": "apartment",
            "subcategory": "flat",
            "priceMin": 50000,
            "priceMax": 90000,
            "location": "Podil",
        },
        "notes": "Prefers high floors",
        "interactions": [],
    })
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Config::memory()).await
}

/// Spawn the app on a random port with a throwaway UI bundle.
pub async fn spawn_app_with(mut config: Config) -> TestApp {
    let static_dir = std::env::temp_dir().join(format!("realtydesk-ui-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&static_dir).expect("Failed to create static dir");
    std::fs::write(static_dir.join("index.html"), INDEX_HTML).expect("Failed to write index.html");
    config.static_dir = static_dir.clone();

    let backend = MemoryBackend::new();
    let state = realtydesk::build_state(Arc::new(backend.clone()), config);
    let app = realtydesk::router(state.clone());

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        backend,
        state,
        static_dir,
    }
}

/// Remove the throwaway UI bundle.
pub fn cleanup(app: TestApp) {
    let _ = std::fs::remove_dir_all(&app.static_dir);
}
