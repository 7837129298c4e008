use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use tracing::info;

use crate::api::mapper::{apply_speaker_input, new_speaker, speaker_to_model, speakers_to_models};
use crate::api::models::{CountedList, SpeakerInput, SpeakerModel, TimestampedList};
use crate::api::{JsonBody, LinkContext, PathParams, QueryParams, Validate, ValidationMode};
use crate::app::AppState;
use crate::database::models::Speaker;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, RequireUser};
use crate::versioning::{ApiVersion, RequestedVersion, VersionTable};

use super::{ensure_saved, negotiate, IncludeQuery};

type ListShape = fn(Vec<SpeakerModel>) -> Response;

static LIST_SHAPES: [(ApiVersion, ListShape); 3] = [
    (ApiVersion::V1_0, bare_list as ListShape),
    (ApiVersion::V1_1, list_with_count as ListShape),
    (ApiVersion::V2_0, list_with_time as ListShape),
];

/// Response shape of the speakers list per API version
pub static VERSIONS: VersionTable<ListShape> = VersionTable::new(&LIST_SHAPES);

fn bare_list(speakers: Vec<SpeakerModel>) -> Response {
    Json(speakers).into_response()
}

fn list_with_count(speakers: Vec<SpeakerModel>) -> Response {
    Json(CountedList {
        count: speakers.len(),
        results: speakers,
    })
    .into_response()
}

fn list_with_time(speakers: Vec<SpeakerModel>) -> Response {
    Json(TimestampedList {
        current_time: Utc::now(),
        count: speakers.len(),
        results: speakers,
    })
    .into_response()
}

/// Load a speaker by id and make sure it belongs to the camp in the path
async fn load_scoped(state: &AppState, moniker: &str, id: i32, with_talks: bool) -> Result<Speaker, ApiError> {
    let speaker = if with_talks {
        state.repo.get_speaker_with_talks(id).await?
    } else {
        state.repo.get_speaker(id).await?
    };
    let speaker = speaker.ok_or_else(|| {
        ApiError::not_found(format!("Could not find a speaker with the id {} for camp {}", id, moniker))
    })?;
    if speaker.camp_moniker != moniker {
        return Err(ApiError::bad_request(format!("Speaker is not from the camp {}", moniker)));
    }
    Ok(speaker)
}

fn ensure_owner(speaker: &Speaker, user: &CurrentUser) -> Result<(), ApiError> {
    if speaker.is_owned_by(&user.username) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Only the user who added this speaker may change it"))
    }
}

/// GET /api/camps/:moniker/speakers - shape depends on the negotiated version
pub async fn list(
    State(state): State<AppState>,
    PathParams(moniker): PathParams<String>,
    QueryParams(query): QueryParams<IncludeQuery>,
    version: RequestedVersion,
    links: LinkContext,
) -> Result<Response, ApiError> {
    let version = negotiate(&state, version, &VERSIONS)?;
    let shape = VERSIONS
        .select(version)
        .ok_or_else(|| ApiError::unsupported_api_version(format!("API version {} is not supported", version)))?;

    let speakers = if query.include_talks {
        state.repo.get_speakers_by_moniker_with_talks(&moniker).await?
    } else {
        state.repo.get_speakers_by_moniker(&moniker).await?
    };

    Ok(shape(speakers_to_models(&speakers, &links)))
}

/// GET /api/camps/:moniker/speakers/:speaker_id
pub async fn get(
    State(state): State<AppState>,
    PathParams((moniker, id)): PathParams<(String, i32)>,
    QueryParams(query): QueryParams<IncludeQuery>,
    version: RequestedVersion,
    links: LinkContext,
) -> ApiResult<SpeakerModel> {
    negotiate(&state, version, &VERSIONS)?;
    let speaker = load_scoped(&state, &moniker, id, query.include_talks).await?;
    Ok(ApiResponse::success(speaker_to_model(&speaker, &links)))
}

/// POST /api/camps/:moniker/speakers - the caller becomes the owner
pub async fn create(
    State(state): State<AppState>,
    PathParams(moniker): PathParams<String>,
    RequireUser(user): RequireUser,
    version: RequestedVersion,
    links: LinkContext,
    JsonBody(input): JsonBody<SpeakerInput>,
) -> ApiResult<SpeakerModel> {
    negotiate(&state, version, &VERSIONS)?;
    input.validate(ValidationMode::Create)?;

    let camp = state
        .repo
        .get_camp_by_moniker(&moniker)
        .await?
        .ok_or_else(|| ApiError::bad_request("Could not find camp"))?;

    let speaker = state
        .repo
        .add_speaker(new_speaker(input, camp.id, Some(user.username.clone()))?)
        .await?;
    info!("User {} added speaker {} to camp {}", user.username, speaker.id, moniker);

    let model = speaker_to_model(&speaker, &links);
    Ok(ApiResponse::created(model.url.clone(), model))
}

/// PUT /api/camps/:moniker/speakers/:speaker_id - owner only
pub async fn update(
    State(state): State<AppState>,
    PathParams((moniker, id)): PathParams<(String, i32)>,
    RequireUser(user): RequireUser,
    version: RequestedVersion,
    links: LinkContext,
    JsonBody(input): JsonBody<SpeakerInput>,
) -> ApiResult<SpeakerModel> {
    negotiate(&state, version, &VERSIONS)?;
    input.validate(ValidationMode::Update)?;

    info!("Updating the speaker record {}", id);
    let mut speaker = load_scoped(&state, &moniker, id, false).await?;
    ensure_owner(&speaker, &user)?;

    apply_speaker_input(&mut speaker, input);
    ensure_saved(state.repo.update_speaker(&speaker).await?, "speaker")?;

    Ok(ApiResponse::success(speaker_to_model(&speaker, &links)))
}

/// DELETE /api/camps/:moniker/speakers/:speaker_id - owner only; talks go with it
pub async fn delete(
    State(state): State<AppState>,
    PathParams((moniker, id)): PathParams<(String, i32)>,
    RequireUser(user): RequireUser,
    version: RequestedVersion,
    links: LinkContext,
) -> ApiResult<SpeakerModel> {
    negotiate(&state, version, &VERSIONS)?;

    let speaker = load_scoped(&state, &moniker, id, false).await?;
    ensure_owner(&speaker, &user)?;

    ensure_saved(state.repo.delete_speaker(speaker.id).await?, "speaker")?;
    info!("User {} deleted speaker {}", user.username, id);

    Ok(ApiResponse::success(speaker_to_model(&speaker, &links)))
}
