use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{Camp, NewCamp, NewSpeaker, NewTalk, NewUser, Speaker, Talk, User};

/// Persistence gateway for camp data and user credentials.
///
/// Every write is its own unit of work. Updates and deletes report whether a
/// row was affected; callers treat `false` as a failed save.
#[async_trait]
pub trait CampRepository: Send + Sync {
    async fn get_all_camps(&self) -> Result<Vec<Camp>, DatabaseError>;
    async fn get_camp_by_moniker(&self, moniker: &str) -> Result<Option<Camp>, DatabaseError>;
    async fn get_camp_by_moniker_with_speakers(&self, moniker: &str) -> Result<Option<Camp>, DatabaseError>;
    async fn add_camp(&self, camp: NewCamp) -> Result<Camp, DatabaseError>;
    async fn update_camp(&self, camp: &Camp) -> Result<bool, DatabaseError>;
    async fn delete_camp(&self, id: i32) -> Result<bool, DatabaseError>;

    async fn get_speakers_by_moniker(&self, moniker: &str) -> Result<Vec<Speaker>, DatabaseError>;
    async fn get_speakers_by_moniker_with_talks(&self, moniker: &str) -> Result<Vec<Speaker>, DatabaseError>;
    async fn get_speaker(&self, id: i32) -> Result<Option<Speaker>, DatabaseError>;
    async fn get_speaker_with_talks(&self, id: i32) -> Result<Option<Speaker>, DatabaseError>;
    async fn add_speaker(&self, speaker: NewSpeaker) -> Result<Speaker, DatabaseError>;
    async fn update_speaker(&self, speaker: &Speaker) -> Result<bool, DatabaseError>;
    async fn delete_speaker(&self, id: i32) -> Result<bool, DatabaseError>;

    async fn get_talks(&self, speaker_id: i32) -> Result<Vec<Talk>, DatabaseError>;
    async fn get_talk(&self, id: i32) -> Result<Option<Talk>, DatabaseError>;
    async fn add_talk(&self, talk: NewTalk) -> Result<Talk, DatabaseError>;
    async fn update_talk(&self, talk: &Talk) -> Result<bool, DatabaseError>;
    async fn delete_talk(&self, id: i32) -> Result<bool, DatabaseError>;

    async fn get_user(&self, username: &str) -> Result<Option<User>, DatabaseError>;
    async fn add_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    /// Cheap round trip to the store
    async fn health_check(&self) -> Result<(), DatabaseError>;
}
