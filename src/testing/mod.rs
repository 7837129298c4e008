//! Fixtures for in-crate router tests
use std::sync::Arc;

use crate::app::AppState;
use crate::config::{AppConfig, ConfigHandle};
use crate::database::seed::seed;
use crate::database::InMemoryCampRepository;

pub const TEST_PASSWORD: &str = "P@ssw0rd!";

/// Development config with the cheapest bcrypt cost
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.password_hash_cost = 4;
    config
}

/// App state over a freshly seeded in-memory store
pub async fn test_state() -> AppState {
    let config = Arc::new(ConfigHandle::fixed(test_config()));
    let state = AppState::new(Arc::new(InMemoryCampRepository::new()), config);
    seed(state.repo.as_ref(), &state.passwords, TEST_PASSWORD)
        .await
        .expect("seed in-memory store");
    state
}
