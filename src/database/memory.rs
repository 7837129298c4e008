use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Camp, NewCamp, NewSpeaker, NewTalk, NewUser, Speaker, Talk, User,
};
use crate::database::repository::CampRepository;

#[derive(Default)]
struct Store {
    camps: BTreeMap<i32, Camp>,
    speakers: BTreeMap<i32, Speaker>,
    talks: BTreeMap<i32, Talk>,
    users: BTreeMap<i32, User>,
    next_id: i32,
}

impl Store {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn camp_moniker(&self, camp_id: i32) -> Option<&str> {
        self.camps.get(&camp_id).map(|c| c.moniker.as_str())
    }

    fn camp_id(&self, moniker: &str) -> Option<i32> {
        self.camps.values().find(|c| c.moniker == moniker).map(|c| c.id)
    }

    /// Speaker with its camp moniker refreshed from the owning camp
    fn speaker(&self, id: i32) -> Option<Speaker> {
        let mut speaker = self.speakers.get(&id)?.clone();
        if let Some(moniker) = self.camp_moniker(speaker.camp_id) {
            speaker.camp_moniker = moniker.to_string();
        }
        Some(speaker)
    }

    fn talk(&self, id: i32) -> Option<Talk> {
        let mut talk = self.talks.get(&id)?.clone();
        if let Some(speaker) = self.speaker(talk.speaker_id) {
            talk.camp_moniker = speaker.camp_moniker;
        }
        Some(talk)
    }

    fn talks_of(&self, speaker_id: i32) -> Vec<Talk> {
        self.talks
            .values()
            .filter(|t| t.speaker_id == speaker_id)
            .filter_map(|t| self.talk(t.id))
            .collect()
    }

    fn speakers_of(&self, camp_id: i32, with_talks: bool) -> Vec<Speaker> {
        self.speakers
            .values()
            .filter(|s| s.camp_id == camp_id)
            .filter_map(|s| self.speaker(s.id))
            .map(|mut s| {
                if with_talks {
                    s.talks = Some(self.talks_of(s.id));
                }
                s
            })
            .collect()
    }

    fn remove_speaker(&mut self, id: i32) -> bool {
        if self.speakers.remove(&id).is_none() {
            return false;
        }
        self.talks.retain(|_, t| t.speaker_id != id);
        true
    }
}

/// Process-local store used when no database is configured, and by tests.
///
/// Mirrors the Postgres schema: unique camp monikers, unique usernames,
/// foreign-key checks on insert and cascading deletes.
#[derive(Default)]
pub struct InMemoryCampRepository {
    store: RwLock<Store>,
}

impl InMemoryCampRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampRepository for InMemoryCampRepository {
    async fn get_all_camps(&self) -> Result<Vec<Camp>, DatabaseError> {
        let store = self.store.read().await;
        let mut camps: Vec<Camp> = store.camps.values().cloned().collect();
        camps.sort_by(|a, b| b.event_date.cmp(&a.event_date).then(a.id.cmp(&b.id)));
        Ok(camps)
    }

    async fn get_camp_by_moniker(&self, moniker: &str) -> Result<Option<Camp>, DatabaseError> {
        let store = self.store.read().await;
        Ok(store.camps.values().find(|c| c.moniker == moniker).cloned())
    }

    async fn get_camp_by_moniker_with_speakers(&self, moniker: &str) -> Result<Option<Camp>, DatabaseError> {
        let store = self.store.read().await;
        let Some(mut camp) = store.camps.values().find(|c| c.moniker == moniker).cloned() else {
            return Ok(None);
        };
        camp.speakers = Some(store.speakers_of(camp.id, false));
        Ok(Some(camp))
    }

    async fn add_camp(&self, camp: NewCamp) -> Result<Camp, DatabaseError> {
        let mut store = self.store.write().await;
        if store.camp_id(&camp.moniker).is_some() {
            return Err(DatabaseError::Duplicate(format!(
                "Camp moniker '{}' already exists",
                camp.moniker
            )));
        }
        let id = store.next_id();
        let camp = camp.into_camp(id);
        store.camps.insert(id, camp.clone());
        Ok(camp)
    }

    async fn update_camp(&self, camp: &Camp) -> Result<bool, DatabaseError> {
        let mut store = self.store.write().await;
        let Some(stored) = store.camps.get_mut(&camp.id) else {
            return Ok(false);
        };
        stored.name = camp.name.clone();
        stored.description = camp.description.clone();
        stored.event_date = camp.event_date;
        stored.length = camp.length;
        stored.location = camp.location.clone();
        Ok(true)
    }

    async fn delete_camp(&self, id: i32) -> Result<bool, DatabaseError> {
        let mut store = self.store.write().await;
        if store.camps.remove(&id).is_none() {
            return Ok(false);
        }
        let orphaned: Vec<i32> = store
            .speakers
            .values()
            .filter(|s| s.camp_id == id)
            .map(|s| s.id)
            .collect();
        for speaker_id in orphaned {
            store.remove_speaker(speaker_id);
        }
        Ok(true)
    }

    async fn get_speakers_by_moniker(&self, moniker: &str) -> Result<Vec<Speaker>, DatabaseError> {
        let store = self.store.read().await;
        Ok(store
            .camp_id(moniker)
            .map(|id| store.speakers_of(id, false))
            .unwrap_or_default())
    }

    async fn get_speakers_by_moniker_with_talks(&self, moniker: &str) -> Result<Vec<Speaker>, DatabaseError> {
        let store = self.store.read().await;
        Ok(store
            .camp_id(moniker)
            .map(|id| store.speakers_of(id, true))
            .unwrap_or_default())
    }

    async fn get_speaker(&self, id: i32) -> Result<Option<Speaker>, DatabaseError> {
        Ok(self.store.read().await.speaker(id))
    }

    async fn get_speaker_with_talks(&self, id: i32) -> Result<Option<Speaker>, DatabaseError> {
        let store = self.store.read().await;
        Ok(store.speaker(id).map(|mut s| {
            s.talks = Some(store.talks_of(id));
            s
        }))
    }

    async fn add_speaker(&self, speaker: NewSpeaker) -> Result<Speaker, DatabaseError> {
        let mut store = self.store.write().await;
        let moniker = store
            .camp_moniker(speaker.camp_id)
            .map(str::to_string)
            .ok_or_else(|| DatabaseError::MissingParent(format!("Camp {} does not exist", speaker.camp_id)))?;
        let id = store.next_id();
        let speaker = speaker.into_speaker(id, moniker);
        store.speakers.insert(id, speaker.clone());
        Ok(speaker)
    }

    async fn update_speaker(&self, speaker: &Speaker) -> Result<bool, DatabaseError> {
        let mut store = self.store.write().await;
        let Some(stored) = store.speakers.get_mut(&speaker.id) else {
            return Ok(false);
        };
        stored.name = speaker.name.clone();
        stored.company_name = speaker.company_name.clone();
        stored.phone_number = speaker.phone_number.clone();
        stored.website_url = speaker.website_url.clone();
        stored.twitter_name = speaker.twitter_name.clone();
        stored.github_name = speaker.github_name.clone();
        stored.bio = speaker.bio.clone();
        stored.head_shot_url = speaker.head_shot_url.clone();
        Ok(true)
    }

    async fn delete_speaker(&self, id: i32) -> Result<bool, DatabaseError> {
        Ok(self.store.write().await.remove_speaker(id))
    }

    async fn get_talks(&self, speaker_id: i32) -> Result<Vec<Talk>, DatabaseError> {
        Ok(self.store.read().await.talks_of(speaker_id))
    }

    async fn get_talk(&self, id: i32) -> Result<Option<Talk>, DatabaseError> {
        Ok(self.store.read().await.talk(id))
    }

    async fn add_talk(&self, talk: NewTalk) -> Result<Talk, DatabaseError> {
        let mut store = self.store.write().await;
        let moniker = store
            .speaker(talk.speaker_id)
            .map(|s| s.camp_moniker)
            .ok_or_else(|| DatabaseError::MissingParent(format!("Speaker {} does not exist", talk.speaker_id)))?;
        let id = store.next_id();
        let talk = talk.into_talk(id, moniker);
        store.talks.insert(id, talk.clone());
        Ok(talk)
    }

    async fn update_talk(&self, talk: &Talk) -> Result<bool, DatabaseError> {
        let mut store = self.store.write().await;
        let Some(stored) = store.talks.get_mut(&talk.id) else {
            return Ok(false);
        };
        stored.title = talk.title.clone();
        stored.abstract_text = talk.abstract_text.clone();
        stored.category = talk.category.clone();
        stored.level = talk.level;
        stored.prerequisites = talk.prerequisites.clone();
        stored.starting_time = talk.starting_time;
        stored.room = talk.room.clone();
        Ok(true)
    }

    async fn delete_talk(&self, id: i32) -> Result<bool, DatabaseError> {
        Ok(self.store.write().await.talks.remove(&id).is_some())
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let store = self.store.read().await;
        Ok(store.users.values().find(|u| u.username == username).cloned())
    }

    async fn add_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut store = self.store.write().await;
        if store.users.values().any(|u| u.username == user.username) {
            return Err(DatabaseError::Duplicate(format!("User '{}' already exists", user.username)));
        }
        let id = store.next_id();
        let user = user.into_user(id);
        store.users.insert(id, user.clone());
        Ok(user)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Location;
    use chrono::{TimeZone, Utc};

    fn new_camp(moniker: &str) -> NewCamp {
        NewCamp {
            moniker: moniker.into(),
            name: "Atlanta Code Camp".into(),
            description: "A day of sessions for local developers".into(),
            event_date: Utc.with_ymd_and_hms(2016, 10, 1, 0, 0, 0).unwrap(),
            length: 1,
            location: Location::default(),
        }
    }

    fn new_speaker(camp_id: i32) -> NewSpeaker {
        NewSpeaker {
            camp_id,
            name: "Shawn Wildermuth".into(),
            company_name: String::new(),
            phone_number: String::new(),
            website_url: String::new(),
            twitter_name: String::new(),
            github_name: String::new(),
            bio: String::new(),
            head_shot_url: String::new(),
            owner: None,
        }
    }

    fn new_talk(speaker_id: i32) -> NewTalk {
        NewTalk {
            speaker_id,
            title: "Intro to axum".into(),
            abstract_text: "Routing, extractors and middleware".into(),
            category: "Web".into(),
            level: 100,
            prerequisites: String::new(),
            starting_time: Utc.with_ymd_and_hms(2016, 10, 1, 14, 0, 0).unwrap(),
            room: "A".into(),
        }
    }

    #[tokio::test]
    async fn duplicate_moniker_is_rejected() {
        let repo = InMemoryCampRepository::new();
        repo.add_camp(new_camp("ATL2016")).await.unwrap();
        let err = repo.add_camp(new_camp("ATL2016")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate(_)));
    }

    #[tokio::test]
    async fn speaker_requires_existing_camp() {
        let repo = InMemoryCampRepository::new();
        let err = repo.add_speaker(new_speaker(42)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::MissingParent(_)));
    }

    #[tokio::test]
    async fn nested_rows_carry_the_camp_moniker() {
        let repo = InMemoryCampRepository::new();
        let camp = repo.add_camp(new_camp("ATL2016")).await.unwrap();
        let speaker = repo.add_speaker(new_speaker(camp.id)).await.unwrap();
        let talk = repo.add_talk(new_talk(speaker.id)).await.unwrap();

        assert_eq!(speaker.camp_moniker, "ATL2016");
        assert_eq!(talk.camp_moniker, "ATL2016");

        let loaded = repo.get_speaker_with_talks(speaker.id).await.unwrap().unwrap();
        assert_eq!(loaded.talks.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_camp_cascades() {
        let repo = InMemoryCampRepository::new();
        let camp = repo.add_camp(new_camp("ATL2016")).await.unwrap();
        let speaker = repo.add_speaker(new_speaker(camp.id)).await.unwrap();
        let talk = repo.add_talk(new_talk(speaker.id)).await.unwrap();

        assert!(repo.delete_camp(camp.id).await.unwrap());
        assert!(repo.get_speaker(speaker.id).await.unwrap().is_none());
        assert!(repo.get_talk(talk.id).await.unwrap().is_none());
        assert!(!repo.delete_camp(camp.id).await.unwrap());
    }

    #[tokio::test]
    async fn update_of_missing_row_reports_false() {
        let repo = InMemoryCampRepository::new();
        let camp = new_camp("ATL2016").into_camp(99);
        assert!(!repo.update_camp(&camp).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_moniker_lists_no_speakers() {
        let repo = InMemoryCampRepository::new();
        assert!(repo.get_speakers_by_moniker("NOPE").await.unwrap().is_empty());
    }
}
