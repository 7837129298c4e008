use axum::extract::State;
use tracing::info;

use crate::api::mapper::{apply_camp_input, camp_to_model, new_camp};
use crate::api::models::{CampInput, CampModel};
use crate::api::{JsonBody, LinkContext, PathParams, QueryParams, Validate, ValidationMode};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::versioning::{ApiVersion, RequestedVersion, VersionTable};

use super::{ensure_saved, negotiate, IncludeQuery};

pub static VERSIONS: VersionTable<()> = VersionTable::new(&[(ApiVersion::V1_1, ())]);

fn not_found(moniker: &str) -> ApiError {
    ApiError::not_found(format!("Camp {} was not found", moniker))
}

/// GET /api/camps - every camp, newest first
pub async fn list(
    State(state): State<AppState>,
    version: RequestedVersion,
    links: LinkContext,
) -> ApiResult<Vec<CampModel>> {
    negotiate(&state, version, &VERSIONS)?;
    let camps = state.repo.get_all_camps().await?;
    Ok(ApiResponse::success(
        camps.iter().map(|c| camp_to_model(c, &links)).collect(),
    ))
}

/// GET /api/camps/:moniker - one camp, optionally with its speakers
pub async fn get(
    State(state): State<AppState>,
    PathParams(moniker): PathParams<String>,
    QueryParams(query): QueryParams<IncludeQuery>,
    version: RequestedVersion,
    links: LinkContext,
) -> ApiResult<CampModel> {
    negotiate(&state, version, &VERSIONS)?;

    let camp = if query.include_speakers {
        state.repo.get_camp_by_moniker_with_speakers(&moniker).await?
    } else {
        state.repo.get_camp_by_moniker(&moniker).await?
    };

    let camp = camp.ok_or_else(|| not_found(&moniker))?;
    Ok(ApiResponse::success(camp_to_model(&camp, &links)))
}

/// POST /api/camps
pub async fn create(
    State(state): State<AppState>,
    version: RequestedVersion,
    links: LinkContext,
    JsonBody(input): JsonBody<CampInput>,
) -> ApiResult<CampModel> {
    negotiate(&state, version, &VERSIONS)?;
    input.validate(ValidationMode::Create)?;

    info!("Creating a new Code Camp");
    let camp = state.repo.add_camp(new_camp(input)?).await?;
    info!("Created camp {} (id {})", camp.moniker, camp.id);

    let model = camp_to_model(&camp, &links);
    Ok(ApiResponse::created(model.url.clone(), model))
}

/// PUT /api/camps/:moniker - partial update; the moniker itself is fixed
pub async fn update(
    State(state): State<AppState>,
    PathParams(moniker): PathParams<String>,
    version: RequestedVersion,
    links: LinkContext,
    JsonBody(input): JsonBody<CampInput>,
) -> ApiResult<CampModel> {
    negotiate(&state, version, &VERSIONS)?;
    input.validate(ValidationMode::Update)?;

    info!("Updating the Code Camp record {}", moniker);
    let mut camp = state
        .repo
        .get_camp_by_moniker(&moniker)
        .await?
        .ok_or_else(|| not_found(&moniker))?;

    apply_camp_input(&mut camp, input)?;
    ensure_saved(state.repo.update_camp(&camp).await?, "camp")?;

    Ok(ApiResponse::success(camp_to_model(&camp, &links)))
}

/// DELETE /api/camps/:moniker - removes the camp with its speakers and talks
pub async fn delete(
    State(state): State<AppState>,
    PathParams(moniker): PathParams<String>,
    version: RequestedVersion,
    links: LinkContext,
) -> ApiResult<CampModel> {
    negotiate(&state, version, &VERSIONS)?;

    let camp = state
        .repo
        .get_camp_by_moniker(&moniker)
        .await?
        .ok_or_else(|| not_found(&moniker))?;

    ensure_saved(state.repo.delete_camp(camp.id).await?, "camp")?;
    info!("Deleted camp {}", moniker);

    Ok(ApiResponse::success(camp_to_model(&camp, &links)))
}
