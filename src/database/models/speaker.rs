use serde::{Deserialize, Serialize};

use super::talk::Talk;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speaker {
    pub id: i32,
    pub camp_id: i32,
    /// Moniker of the owning camp, joined on read
    pub camp_moniker: String,
    pub name: String,
    pub company_name: String,
    pub phone_number: String,
    pub website_url: String,
    pub twitter_name: String,
    pub github_name: String,
    pub bio: String,
    pub head_shot_url: String,
    /// Username of the account that created the speaker
    pub owner: Option<String>,
    /// `None` unless the talks were eagerly loaded
    pub talks: Option<Vec<Talk>>,
}

impl Speaker {
    pub fn is_owned_by(&self, username: &str) -> bool {
        match &self.owner {
            Some(owner) => owner == username,
            None => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSpeaker {
    pub camp_id: i32,
    pub name: String,
    pub company_name: String,
    pub phone_number: String,
    pub website_url: String,
    pub twitter_name: String,
    pub github_name: String,
    pub bio: String,
    pub head_shot_url: String,
    pub owner: Option<String>,
}

impl NewSpeaker {
    pub fn into_speaker(self, id: i32, camp_moniker: String) -> Speaker {
        Speaker {
            id,
            camp_id: self.camp_id,
            camp_moniker,
            name: self.name,
            company_name: self.company_name,
            phone_number: self.phone_number,
            website_url: self.website_url,
            twitter_name: self.twitter_name,
            github_name: self.github_name,
            bio: self.bio,
            head_shot_url: self.head_shot_url,
            owner: self.owner,
            talks: None,
        }
    }
}
