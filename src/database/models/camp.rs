use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::speaker::Speaker;

/// Street address of a camp venue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address1: String,
    pub address2: String,
    pub address3: String,
    pub city_town: String,
    pub state_province: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camp {
    pub id: i32,
    pub moniker: String,
    pub name: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub length: i32,
    pub location: Location,
    /// `None` unless the speakers were eagerly loaded
    pub speakers: Option<Vec<Speaker>>,
}

/// Camp fields prior to insert; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewCamp {
    pub moniker: String,
    pub name: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub length: i32,
    pub location: Location,
}

impl NewCamp {
    pub fn into_camp(self, id: i32) -> Camp {
        Camp {
            id,
            moniker: self.moniker,
            name: self.name,
            description: self.description,
            event_date: self.event_date,
            length: self.length,
            location: self.location,
            speakers: None,
        }
    }
}
