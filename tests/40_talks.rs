mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{add_user, camp_body, speaker_body, spawn_server, talk_body, token_for, TestServer, CAMP, PASSWORD, SUPER_USER};

/// (speaker id, first talk id) from the seed data
async fn seeded_talk(server: &TestServer) -> Result<(i64, i64)> {
    let speakers: Value = reqwest::get(server.url(&format!("/api/camps/{}/speakers?ver=1.0&includeTalks=true", CAMP)))
        .await?
        .json()
        .await?;
    let speaker = &speakers[0];
    Ok((
        speaker["id"].as_i64().expect("speaker id"),
        speaker["talks"][0]["id"].as_i64().expect("talk id"),
    ))
}

#[tokio::test]
async fn list_and_get_talks() -> Result<()> {
    let server = spawn_server().await?;
    let (speaker_id, talk_id) = seeded_talk(&server).await?;

    let talks: Vec<Value> = reqwest::get(server.url(&format!("/api/camps/{}/speakers/{}/talks", CAMP, speaker_id)))
        .await?
        .json()
        .await?;
    assert_eq!(talks.len(), 2);

    let url = server.url(&format!("/api/camps/{}/speakers/{}/talks/{}", CAMP, speaker_id, talk_id));
    let talk: Value = reqwest::get(&url).await?.json().await?;
    assert_eq!(talk["url"], url);
    assert!(talk["abstract"].is_string());
    Ok(())
}

#[tokio::test]
async fn talk_under_wrong_speaker_is_a_bad_request() -> Result<()> {
    let server = spawn_server().await?;
    let (speaker_id, talk_id) = seeded_talk(&server).await?;

    let speakers: Value = reqwest::get(server.url(&format!("/api/camps/{}/speakers?ver=1.0", CAMP)))
        .await?
        .json()
        .await?;
    let other = speakers
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .find(|id| *id != speaker_id)
        .unwrap();

    let res = reqwest::get(server.url(&format!("/api/camps/{}/speakers/{}/talks/{}", CAMP, other, talk_id))).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn create_requires_version_two() -> Result<()> {
    let server = spawn_server().await?;
    let token = token_for(&server, SUPER_USER, PASSWORD).await?;
    let (speaker_id, _) = seeded_talk(&server).await?;
    let client = reqwest::Client::new();
    let base = server.url(&format!("/api/camps/{}/speakers/{}/talks", CAMP, speaker_id));

    let res = client.post(&base).bearer_auth(&token).json(&talk_body("Default Version Talk")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "UNSUPPORTED_API_VERSION");

    let res = client
        .post(format!("{}?ver=2.0", base))
        .bearer_auth(&token)
        .json(&talk_body("Version Two Talk"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    assert!(url_points_at_talk(&created));
    assert_eq!(created["level"], 200);
    Ok(())
}

fn url_points_at_talk(created: &Value) -> bool {
    created["url"]
        .as_str()
        .is_some_and(|u| u.ends_with(&format!("/talks/{}", created["id"])))
}

#[tokio::test]
async fn update_applies_partial_body() -> Result<()> {
    let server = spawn_server().await?;
    let token = token_for(&server, SUPER_USER, PASSWORD).await?;
    let (speaker_id, talk_id) = seeded_talk(&server).await?;
    let url = server.url(&format!("/api/camps/{}/speakers/{}/talks/{}", CAMP, speaker_id, talk_id));

    let before: Value = reqwest::get(&url).await?.json().await?;
    let res = reqwest::Client::new()
        .put(&url)
        .bearer_auth(&token)
        .json(&json!({ "room": "Main Hall" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let after: Value = res.json().await?;
    assert_eq!(after["room"], "Main Hall");
    assert_eq!(after["title"], before["title"]);
    assert_eq!(after["level"], before["level"]);
    Ok(())
}

#[tokio::test]
async fn delete_needs_super_user() -> Result<()> {
    let server = spawn_server().await?;
    add_user(&server, "dave", &[]).await?;
    let plain = token_for(&server, "dave", PASSWORD).await?;
    let admin = token_for(&server, SUPER_USER, PASSWORD).await?;
    let (speaker_id, talk_id) = seeded_talk(&server).await?;
    let url = server.url(&format!("/api/camps/{}/speakers/{}/talks/{}", CAMP, speaker_id, talk_id));
    let client = reqwest::Client::new();

    let res = client.delete(&url).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.delete(&url).bearer_auth(&plain).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.delete(&url).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(&url).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn list_checks_speaker_scope_even_without_talks() -> Result<()> {
    let server = spawn_server().await?;
    let token = token_for(&server, SUPER_USER, PASSWORD).await?;
    let client = reqwest::Client::new();

    let res = client.post(server.url("/api/camps")).json(&camp_body("NYC2017")).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = client
        .post(server.url("/api/camps/NYC2017/speakers"))
        .bearer_auth(&token)
        .json(&speaker_body("New York Speaker"))
        .send()
        .await?
        .json()
        .await?;
    let id = created["id"].as_i64().unwrap();

    let res = client
        .get(server.url(&format!("/api/camps/NYC2017/speakers/{}/talks", id)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let talks: Vec<Value> = res.json().await?;
    assert!(talks.is_empty());

    let res = client
        .get(server.url(&format!("/api/camps/{}/speakers/{}/talks", CAMP, id)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn list_for_unknown_speaker_is_not_found() -> Result<()> {
    let server = spawn_server().await?;
    let res = reqwest::get(server.url(&format!("/api/camps/{}/speakers/99999/talks", CAMP))).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}
