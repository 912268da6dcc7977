#![allow(dead_code)]

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use school_api_rust::app::{app, AppState};
use school_api_rust::auth::JwtKeys;
use school_api_rust::authz::AuthzEngine;
use school_api_rust::config::AppConfig;
use school_api_rust::database::Store;

pub const SUPER_EMAIL: &str = "super@admin.com";
pub const SUPER_PASSWORD: &str = "Admin@1234";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    /// Runs the router on its own thread and runtime so it outlives each
    /// test's runtime. Backed by the in-memory store with a seeded superadmin.
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.api.port = port;
        config.api.enable_request_logging = false;

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test server runtime");
            runtime.block_on(async move {
                let engine = AuthzEngine::new(config.load_hierarchy().expect("hierarchy"));
                let keys = JwtKeys::from_config(&config.security);
                let state = AppState::new(Arc::new(engine), Store::memory(), keys);
                state.seed(&config).await.expect("seed superadmin");

                let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await.expect("bind test port");
                axum::serve(listener, app(state, &config)).await.expect("test server");
            });
        });

        Ok(Self { port, base_url })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn test server"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Thin JSON client; every call returns the status and parsed body.
pub struct Api {
    base_url: String,
    client: reqwest::Client,
    token: Option<String>,
}

impl Api {
    pub async fn anonymous() -> Result<Self> {
        let server = ensure_server().await?;
        Ok(Self {
            base_url: server.base_url.clone(),
            client: reqwest::Client::new(),
            token: None,
        })
    }

    pub async fn login(email: &str, password: &str) -> Result<Self> {
        let mut api = Self::anonymous().await?;
        let (status, body) = api
            .post("/auth/login", json!({ "email": email, "password": password }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        api.token = body["data"]["token"].as_str().map(str::to_string);
        Ok(api)
    }

    pub async fn superadmin() -> Result<Self> {
        Self::login(SUPER_EMAIL, SUPER_PASSWORD).await
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(StatusCode, Value)> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let res = request.send().await?;
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(self.client.get(format!("{}{}", self.base_url, path))).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(self.client.post(format!("{}{}", self.base_url, path)).json(&body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(self.client.put(format!("{}{}", self.base_url, path)).json(&body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(self.client.delete(format!("{}{}", self.base_url, path))).await
    }
}

/// A value no other test in the same server will use.
pub fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, uuid::Uuid::new_v4().simple())
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}@example.edu", unique(prefix))
}

pub fn id_of(body: &Value) -> String {
    body["data"]["id"].as_str().unwrap_or_default().to_string()
}

/// Creates a school as superadmin and returns its id.
pub async fn create_school(root: &Api) -> Result<String> {
    let (status, body) = root
        .post(
            "/api/schools",
            json!({
                "name": "Springfield Elementary",
                "address": "19 Plympton Street",
                "email": unique_email("office"),
            }),
        )
        .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "create school failed: {} {}", status, body);
    Ok(id_of(&body))
}

pub async fn create_classroom(api: &Api, school_id: Option<&str>, name: &str) -> Result<String> {
    let mut payload = json!({ "name": name, "capacity": 25, "resources": ["whiteboard"] });
    if let Some(school_id) = school_id {
        payload["school_id"] = json!(school_id);
    }
    let (status, body) = api.post("/api/classrooms", payload).await?;
    anyhow::ensure!(status == StatusCode::CREATED, "create classroom failed: {} {}", status, body);
    Ok(id_of(&body))
}

/// Creates a school administrator for `school_id` and logs in as them.
pub async fn school_admin(root: &Api, school_id: &str) -> Result<Api> {
    let email = unique_email("admin");
    let (status, body) = root
        .post(
            "/api/users",
            json!({
                "username": unique("adm")[..20].to_string(),
                "email": email,
                "password": "Teach@1234",
                "role": "school_admin",
                "school_id": school_id,
            }),
        )
        .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "create school admin failed: {} {}", status, body);
    Api::login(&email, "Teach@1234").await
}
