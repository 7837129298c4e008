use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Talk {
    pub id: i32,
    pub speaker_id: i32,
    /// Moniker of the camp the speaker belongs to, joined on read
    pub camp_moniker: String,
    pub title: String,
    pub abstract_text: String,
    pub category: String,
    pub level: i32,
    pub prerequisites: String,
    pub starting_time: DateTime<Utc>,
    pub room: String,
}

#[derive(Debug, Clone)]
pub struct NewTalk {
    pub speaker_id: i32,
    pub title: String,
    pub abstract_text: String,
    pub category: String,
    pub level: i32,
    pub prerequisites: String,
    pub starting_time: DateTime<Utc>,
    pub room: String,
}

impl NewTalk {
    pub fn into_talk(self, id: i32, camp_moniker: String) -> Talk {
        Talk {
            id,
            speaker_id: self.speaker_id,
            camp_moniker,
            title: self.title,
            abstract_text: self.abstract_text,
            category: self.category,
            level: self.level,
            prerequisites: self.prerequisites,
            starting_time: self.starting_time,
            room: self.room,
        }
    }
}
