// Route handlers. Each resource module pairs with a router in `app.rs`.
pub mod auth;
pub mod camps;
pub mod operations;
pub mod speakers;
pub mod talks;

use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::versioning::{ApiVersion, RequestedVersion, VersionTable};

/// `?includeSpeakers=` / `?includeTalks=` on get and list endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludeQuery {
    #[serde(default)]
    pub include_speakers: bool,
    #[serde(default)]
    pub include_talks: bool,
}

/// Pick the version to serve for this request against `table`
pub(crate) fn negotiate<T>(
    state: &AppState,
    requested: RequestedVersion,
    table: &VersionTable<T>,
) -> Result<ApiVersion, ApiError> {
    let config = state.config.snapshot();
    let default = ApiVersion::parse(&config.versioning.default_version).unwrap_or(ApiVersion::V1_1);
    requested.resolve(table, default)
}

/// A write that touched no row is reported the way a failed save is
pub(crate) fn ensure_saved(saved: bool, what: &str) -> Result<(), ApiError> {
    if saved {
        Ok(())
    } else {
        tracing::warn!("Could not save {} to the database", what);
        Err(ApiError::bad_request(format!("Could not save {}", what)))
    }
}
