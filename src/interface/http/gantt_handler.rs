use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    application::LoadOutcome,
    application::dto::{HealthResponse, PresetRequest, PresetResponse, SyncRequest, SyncResponse},
    domain::errors::DomainError,
    domain::gantt::MemberId,
    domain::preset,
    interface::http::problem::{ApiProblem, ApiResult},
    state::AppState,
};

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Deserialize)]
pub struct LoadQuery {
    #[serde(default)]
    preset: Option<String>,
}

pub async fn load(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LoadQuery>,
) -> ApiResult<Response> {
    let correlation_id = request_correlation_id(&headers);
    let member = member_id(&headers, correlation_id.clone())?;

    let outcome = state
        .gantt_service
        .load(member, query.preset.as_deref())
        .await
        .map_err(|error| ApiProblem::from_domain_with_correlation(error, correlation_id))?;

    Ok(match outcome {
        LoadOutcome::Seeded(raw) => Json(raw).into_response(),
        LoadOutcome::Existing(envelope) => Json(envelope).into_response(),
    })
}

pub async fn sync(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SyncRequest>,
) -> ApiResult<Json<SyncResponse>> {
    let correlation_id = request_correlation_id(&headers);
    let member = member_id(&headers, correlation_id.clone())?;

    state
        .gantt_service
        .sync(member, request)
        .await
        .map_err(|error| ApiProblem::from_domain_with_correlation(error, correlation_id))?;

    Ok(Json(SyncResponse { success: true }))
}

pub async fn resolve_preset(
    Json(request): Json<PresetRequest>,
) -> ApiResult<Json<PresetResponse>> {
    let answers: [&str; 3] = [
        &request.answers[0],
        &request.answers[1],
        &request.answers[2],
    ];
    let preset_id = preset::assign_preset(request.role, answers).map(str::to_string);
    let template_ready = preset_id
        .as_deref()
        .is_some_and(preset::template_ready);

    Ok(Json(PresetResponse {
        preset_id,
        template_ready,
    }))
}

fn request_correlation_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn member_id(headers: &HeaderMap, correlation_id: Option<String>) -> ApiResult<MemberId> {
    headers
        .get("x-member-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<MemberId>().ok())
        .ok_or_else(|| {
            ApiProblem::from_domain_with_correlation(
                DomainError::validation("x-member-id header must carry a numeric member id"),
                correlation_id,
            )
        })
}
