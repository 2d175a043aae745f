// src/handlers/policies.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        extract::{Filters, Valid},
    },
    models::policy::{Policy, PolicyFilters, PolicyListResponse, PolicyPayload, PolicyStatusPayload},
};

// POST /api/policies
#[utoipa::path(
    post,
    path = "/api/policies",
    tag = "Policies",
    request_body = PolicyPayload,
    responses(
        (status = 201, description = "Apólice emitida", body = Policy),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado"),
        (status = 502, description = "Falha no cálculo remoto do prêmio")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_policy(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Valid(payload): Valid<PolicyPayload>,
) -> Result<impl IntoResponse, AppError> {
    let policy = app_state
        .policy_service
        .create_policy(&caller, payload, &app_state.request_token())
        .await?;
    Ok((StatusCode::CREATED, Json(policy)))
}

// GET /api/policies
#[utoipa::path(
    get,
    path = "/api/policies",
    tag = "Policies",
    params(PolicyFilters),
    responses(
        (status = 200, description = "Página de apólices", body = PolicyListResponse),
        (status = 400, description = "Filtro ou ordenação inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_policies(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Filters(filters): Filters<PolicyFilters>,
) -> Result<Json<PolicyListResponse>, AppError> {
    let page = app_state
        .policy_service
        .list_policies(&caller, filters)
        .await?;
    Ok(Json(page))
}

// GET /api/policies/{id}
#[utoipa::path(
    get,
    path = "/api/policies/{id}",
    tag = "Policies",
    params(("id" = Uuid, Path, description = "ID da apólice")),
    responses(
        (status = 200, description = "Apólice", body = Policy),
        (status = 404, description = "Apólice não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_policy(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Policy>, AppError> {
    Ok(Json(app_state.policy_service.get_policy(&caller, id).await?))
}

// PUT /api/policies/{id}
#[utoipa::path(
    put,
    path = "/api/policies/{id}",
    tag = "Policies",
    params(("id" = Uuid, Path, description = "ID da apólice")),
    request_body = PolicyPayload,
    responses(
        (status = 200, description = "Apólice atualizada", body = Policy),
        (status = 404, description = "Apólice não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_policy(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Valid(payload): Valid<PolicyPayload>,
) -> Result<Json<Policy>, AppError> {
    let policy = app_state
        .policy_service
        .update_policy(&caller, id, payload, &app_state.request_token())
        .await?;
    Ok(Json(policy))
}

// PATCH /api/policies/{id}/status
#[utoipa::path(
    patch,
    path = "/api/policies/{id}/status",
    tag = "Policies",
    params(("id" = Uuid, Path, description = "ID da apólice")),
    request_body = PolicyStatusPayload,
    responses((status = 200, description = "Status alterado", body = Policy)),
    security(("api_jwt" = []))
)]
pub async fn set_policy_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Valid(payload): Valid<PolicyStatusPayload>,
) -> Result<Json<Policy>, AppError> {
    let policy = app_state
        .policy_service
        .set_status(&caller, id, payload.status)
        .await?;
    Ok(Json(policy))
}
