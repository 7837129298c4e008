#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use code_camp_api::config::{AppConfig, ConfigHandle};
use code_camp_api::database::{seed::seed, InMemoryCampRepository};
use code_camp_api::{app, AppState};

pub const SUPER_USER: &str = "shawnwildermuth";
pub const PASSWORD: &str = "P@ssw0rd!";
pub const CAMP: &str = "ATL2016";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.password_hash_cost = 4;
    config
}

/// Start a server on a free port over a freshly seeded in-memory store
pub async fn spawn_server() -> Result<TestServer> {
    spawn_with(ConfigHandle::fixed(test_config())).await
}

pub async fn spawn_with(config: ConfigHandle) -> Result<TestServer> {
    let state = AppState::new(Arc::new(InMemoryCampRepository::new()), Arc::new(config));
    seed(state.repo.as_ref(), &state.passwords, PASSWORD).await?;

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let router = app(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let server = TestServer {
        port,
        base_url: format!("http://127.0.0.1:{}", port),
        state,
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

/// Bearer token for `username`
pub async fn token_for(server: &TestServer, username: &str, password: &str) -> Result<String> {
    let res = reqwest::Client::new()
        .post(server.url("/api/auth/token"))
        .json(&json!({ "userName": username, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "token request failed: {}", res.status());
    let body: Value = res.json().await?;
    body["token"]
        .as_str()
        .map(str::to_string)
        .context("token missing from response")
}

/// Create an account directly in the store
pub async fn add_user(server: &TestServer, username: &str, claims: &[&str]) -> Result<()> {
    use code_camp_api::database::models::NewUser;

    let password_hash = server.state.passwords.hash(PASSWORD).await?;
    server
        .state
        .repo
        .add_user(NewUser {
            username: username.to_string(),
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
            claims: claims.iter().map(|c| c.to_string()).collect(),
        })
        .await?;
    Ok(())
}

pub fn camp_body(moniker: &str) -> Value {
    json!({
        "moniker": moniker,
        "name": "Atlanta Code Camp 2017",
        "description": "The second annual Atlanta code camp",
        "eventDate": "2017-10-14T00:00:00Z",
        "length": 2,
        "locationAddress1": "100 Peachtree St",
        "locationCityTown": "Atlanta",
        "locationStateProvince": "GA",
        "locationPostalCode": "30303",
        "locationCountry": "USA"
    })
}

pub fn speaker_body(name: &str) -> Value {
    json!({
        "name": name,
        "companyName": "Contoso",
        "twitterName": "speaker",
        "gitHubName": "speaker",
        "bio": "Builds web services"
    })
}

pub fn talk_body(title: &str) -> Value {
    json!({
        "title": title,
        "abstract": "A tour of building HTTP services",
        "category": "Web",
        "level": 200,
        "startingTime": "2016-10-18T10:00:00Z",
        "room": "Room 2"
    })
}
