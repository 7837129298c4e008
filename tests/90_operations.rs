mod common;

use std::path::PathBuf;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::Value;

use code_camp_api::config::ConfigHandle;
use common::spawn_with;

fn scratch_config(name: &str, contents: &str) -> Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("codecamp-{}-{}.yaml", name, std::process::id()));
    std::fs::write(&path, contents)?;
    Ok(path)
}

const SETTINGS: &str = "\
security:
  password_hash_cost: 4
cors:
  camp_writer_origins:
    - http://wildermuth.com
";

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    let server = common::spawn_server().await?;
    let res = reqwest::get(server.url("/health")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn reload_picks_up_file_changes() -> Result<()> {
    let path = scratch_config("reload", SETTINGS)?;
    let server = spawn_with(ConfigHandle::load(Some(path.clone()))?).await?;
    let client = reqwest::Client::new();
    let reload = server.url("/api/operations/reloadConfig");

    std::fs::write(
        &path,
        format!("{}sessions:\n  lifetime_minutes: 45\n", SETTINGS),
    )?;
    let res = client.request(Method::OPTIONS, &reload).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body, "Configuration Reloaded");
    assert_eq!(server.state.config.snapshot().sessions.lifetime_minutes, 45);

    std::fs::write(&path, "sessions: [not, a, mapping")?;
    let res = client.request(Method::OPTIONS, &reload).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body, "Could not reload configuration");
    // The last good configuration stays live
    assert_eq!(server.state.config.snapshot().sessions.lifetime_minutes, 45);

    let _ = std::fs::remove_file(&path);
    Ok(())
}

#[tokio::test]
async fn reload_without_a_file_revalidates() -> Result<()> {
    let server = common::spawn_server().await?;
    let res = reqwest::Client::new()
        .request(Method::OPTIONS, server.url("/api/operations/reloadConfig"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}
