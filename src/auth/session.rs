use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Server-side cookie sessions. Only a digest of each id is kept, so a
/// dump of the map cannot be replayed as cookies.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

fn digest(id: &str) -> String {
    let hash = Sha256::digest(id.as_bytes());
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session and return the opaque id for the cookie
    pub async fn create(&self, username: &str, lifetime: Duration) -> String {
        let id = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let now = Utc::now();
        let session = Session {
            username: username.to_string(),
            created_at: now,
            expires_at: now + lifetime,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(digest(&id), session);
        id
    }

    /// Live session for `id`; expired entries are dropped on sight
    pub async fn resolve(&self, id: &str) -> Option<Session> {
        let key = digest(id);
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(&key) {
                Some(session) if session.expires_at > now => return Some(session.clone()),
                None => return None,
                Some(_) => {}
            }
        }
        self.sessions.write().await.remove(&key);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_session_resolves_to_user() {
        let store = SessionStore::new();
        let id = store.create("alice", Duration::minutes(20)).await;
        let session = store.resolve(&id).await.unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(session.expires_at - session.created_at, Duration::minutes(20));
    }

    #[tokio::test]
    async fn expired_session_is_dropped() {
        let store = SessionStore::new();
        let id = store.create("alice", Duration::seconds(-1)).await;
        assert!(store.resolve(&id).await.is_none());
        assert!(store.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_id_does_not_resolve() {
        let store = SessionStore::new();
        store.create("alice", Duration::minutes(20)).await;
        assert!(store.resolve("made-up").await.is_none());
    }

    #[tokio::test]
    async fn raw_ids_are_not_stored() {
        let store = SessionStore::new();
        let id = store.create("alice", Duration::minutes(20)).await;
        assert!(!store.sessions.read().await.contains_key(&id));
    }
}
