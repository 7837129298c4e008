//! Wire representations. Output models are what handlers return; `*Input`
//! models are request bodies with every field optional so one type serves
//! both create and partial update.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampModel {
    pub url: String,
    pub moniker: String,
    pub name: String,
    pub event_date: DateTime<Utc>,
    pub length: i32,
    pub description: String,
    pub location_address1: String,
    pub location_address2: String,
    pub location_address3: String,
    pub location_city_town: String,
    pub location_state_province: String,
    pub location_postal_code: String,
    pub location_country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speakers: Option<Vec<SpeakerModel>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerModel {
    pub url: String,
    pub id: i32,
    pub name: String,
    pub company_name: String,
    pub phone_number: String,
    pub website_url: String,
    pub twitter_name: String,
    #[serde(rename = "gitHubName")]
    pub github_name: String,
    pub bio: String,
    pub head_shot_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub talks: Option<Vec<TalkModel>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkModel {
    pub url: String,
    pub id: i32,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub category: String,
    pub level: i32,
    pub prerequisites: String,
    pub starting_time: DateTime<Utc>,
    pub room: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampInput {
    pub moniker: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub event_date: Option<DateTime<Utc>>,
    pub length: Option<i32>,
    pub description: Option<String>,
    pub location_address1: Option<String>,
    pub location_address2: Option<String>,
    pub location_address3: Option<String>,
    pub location_city_town: Option<String>,
    pub location_state_province: Option<String>,
    pub location_postal_code: Option<String>,
    pub location_country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerInput {
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub phone_number: Option<String>,
    pub website_url: Option<String>,
    pub twitter_name: Option<String>,
    #[serde(alias = "gitHubName")]
    pub github_name: Option<String>,
    pub bio: Option<String>,
    pub head_shot_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkInput {
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub category: Option<String>,
    pub level: Option<i32>,
    pub prerequisites: Option<String>,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub starting_time: Option<DateTime<Utc>>,
    pub room: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialModel {
    #[serde(alias = "username")]
    pub user_name: String,
    pub password: String,
}

/// `{ count, results }`
#[derive(Debug, Serialize)]
pub struct CountedList<T> {
    pub count: usize,
    pub results: Vec<T>,
}

/// `{ currentTime, count, results }`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampedList<T> {
    pub current_time: DateTime<Utc>,
    pub count: usize,
    pub results: Vec<T>,
}

/// Accepts RFC 3339, a zone-less `YYYY-MM-DDTHH:MM:SS` (read as UTC) or a bare date
fn flexible_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(text) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_datetime(&text)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("'{}' is not a recognised date", text)))
}

pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
