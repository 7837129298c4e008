use axum::extract::State;
use tracing::info;

use crate::api::mapper::{apply_talk_input, new_talk, talk_to_model};
use crate::api::models::{TalkInput, TalkModel};
use crate::api::{JsonBody, LinkContext, PathParams, Validate, ValidationMode};
use crate::app::AppState;
use crate::database::models::{Speaker, Talk};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequireSuperUser, RequireUser};
use crate::versioning::{ApiVersion, RequestedVersion, VersionTable};

use super::{ensure_saved, negotiate};

pub static VERSIONS: VersionTable<()> = VersionTable::new(&[
    (ApiVersion::V1_0, ()),
    (ApiVersion::V1_1, ()),
    (ApiVersion::V2_0, ()),
]);

/// Talk creation only exists from 2.0 on
pub static CREATE_VERSIONS: VersionTable<()> = VersionTable::new(&[(ApiVersion::V2_0, ())]);

async fn load_speaker(state: &AppState, moniker: &str, speaker_id: i32) -> Result<Speaker, ApiError> {
    let speaker = state.repo.get_speaker(speaker_id).await?.ok_or_else(|| {
        ApiError::not_found(format!("Could not find a speaker with the id {} for camp {}", speaker_id, moniker))
    })?;
    if speaker.camp_moniker != moniker {
        return Err(ApiError::bad_request(format!("Speaker is not from the camp {}", moniker)));
    }
    Ok(speaker)
}

/// Talk by id, checked against both the camp and the speaker in the path
async fn load_scoped(state: &AppState, moniker: &str, speaker_id: i32, id: i32) -> Result<Talk, ApiError> {
    let talk = state
        .repo
        .get_talk(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Could not find a talk with the id {}", id)))?;
    if talk.speaker_id != speaker_id || talk.camp_moniker != moniker {
        return Err(ApiError::bad_request("That talk is not from the speaker and camp supplied"));
    }
    Ok(talk)
}

/// GET /api/camps/:moniker/speakers/:speaker_id/talks
pub async fn list(
    State(state): State<AppState>,
    PathParams((moniker, speaker_id)): PathParams<(String, i32)>,
    version: RequestedVersion,
    links: LinkContext,
) -> ApiResult<Vec<TalkModel>> {
    negotiate(&state, version, &VERSIONS)?;
    load_speaker(&state, &moniker, speaker_id).await?;

    let talks = state.repo.get_talks(speaker_id).await?;
    if talks.iter().any(|t| t.camp_moniker != moniker) {
        return Err(ApiError::bad_request("Invalid talks for the speaker selected"));
    }

    Ok(ApiResponse::success(
        talks.iter().map(|t| talk_to_model(t, &links)).collect(),
    ))
}

/// GET /api/camps/:moniker/speakers/:speaker_id/talks/:id
pub async fn get(
    State(state): State<AppState>,
    PathParams((moniker, speaker_id, id)): PathParams<(String, i32, i32)>,
    version: RequestedVersion,
    links: LinkContext,
) -> ApiResult<TalkModel> {
    negotiate(&state, version, &VERSIONS)?;
    let talk = load_scoped(&state, &moniker, speaker_id, id).await?;
    Ok(ApiResponse::success(talk_to_model(&talk, &links)))
}

/// POST /api/camps/:moniker/speakers/:speaker_id/talks - version 2.0 only
pub async fn create(
    State(state): State<AppState>,
    PathParams((moniker, speaker_id)): PathParams<(String, i32)>,
    RequireUser(user): RequireUser,
    version: RequestedVersion,
    links: LinkContext,
    JsonBody(input): JsonBody<TalkInput>,
) -> ApiResult<TalkModel> {
    negotiate(&state, version, &CREATE_VERSIONS)?;
    input.validate(ValidationMode::Create)?;

    let speaker = match load_speaker(&state, &moniker, speaker_id).await {
        Ok(speaker) => speaker,
        Err(ApiError::NotFound(_)) => return Err(ApiError::bad_request("Could not find speaker")),
        Err(e) => return Err(e),
    };

    let talk = state.repo.add_talk(new_talk(input, speaker.id)?).await?;
    info!("User {} added talk {} for speaker {}", user.username, talk.id, speaker.id);

    let model = talk_to_model(&talk, &links);
    Ok(ApiResponse::created(model.url.clone(), model))
}

/// PUT /api/camps/:moniker/speakers/:speaker_id/talks/:id
pub async fn update(
    State(state): State<AppState>,
    PathParams((moniker, speaker_id, id)): PathParams<(String, i32, i32)>,
    RequireUser(user): RequireUser,
    version: RequestedVersion,
    links: LinkContext,
    JsonBody(input): JsonBody<TalkInput>,
) -> ApiResult<TalkModel> {
    negotiate(&state, version, &VERSIONS)?;
    input.validate(ValidationMode::Update)?;

    let mut talk = load_scoped(&state, &moniker, speaker_id, id).await?;
    apply_talk_input(&mut talk, input);
    ensure_saved(state.repo.update_talk(&talk).await?, "talk")?;
    info!("User {} updated talk {}", user.username, id);

    Ok(ApiResponse::success(talk_to_model(&talk, &links)))
}

/// DELETE /api/camps/:moniker/speakers/:speaker_id/talks/:id - SuperUsers policy
pub async fn delete(
    State(state): State<AppState>,
    PathParams((moniker, speaker_id, id)): PathParams<(String, i32, i32)>,
    RequireSuperUser(user): RequireSuperUser,
    version: RequestedVersion,
    links: LinkContext,
) -> ApiResult<TalkModel> {
    negotiate(&state, version, &VERSIONS)?;

    let talk = load_scoped(&state, &moniker, speaker_id, id).await?;
    ensure_saved(state.repo.delete_talk(talk.id).await?, "talk")?;
    info!("User {} deleted talk {}", user.username, id);

    Ok(ApiResponse::success(talk_to_model(&talk, &links)))
}
