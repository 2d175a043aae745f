// src/handlers/claims.rs

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
    models::claim::{
        Claim, ClaimDocumentPayload, ClaimFilters, ClaimListResponse, ClaimPayload,
        ReviewClaimPayload,
    },
};

// POST /api/claims
#[utoipa::path(
    post,
    path = "/api/claims",
    tag = "Claims",
    request_body = ClaimPayload,
    responses(
        (status = 201, description = "Sinistro aberto como Submitted", body = Claim),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Apólice não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_claim(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Valid(payload): Valid<ClaimPayload>,
) -> Result<impl IntoResponse, AppError> {
    let claim = app_state.claim_service.create_claim(&caller, payload).await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

// GET /api/claims
#[utoipa::path(
    get,
    path = "/api/claims",
    tag = "Claims",
    params(ClaimFilters),
    responses(
        (status = 200, description = "Página de sinistros", body = ClaimListResponse),
        (status = 400, description = "Filtro ou ordenação inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_claims(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Filters(filters): Filters<ClaimFilters>,
) -> Result<Json<ClaimListResponse>, AppError> {
    Ok(Json(app_state.claim_service.list_claims(&caller, filters).await?))
}

// GET /api/claims/{id}
#[utoipa::path(
    get,
    path = "/api/claims/{id}",
    tag = "Claims",
    params(("id" = Uuid, Path, description = "ID do sinistro")),
    responses(
        (status = 200, description = "Sinistro", body = Claim),
        (status = 404, description = "Sinistro não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_claim(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Claim>, AppError> {
    Ok(Json(app_state.claim_service.get_claim(&caller, id).await?))
}

// PUT /api/claims/{id}
#[utoipa::path(
    put,
    path = "/api/claims/{id}",
    tag = "Claims",
    params(("id" = Uuid, Path, description = "ID do sinistro")),
    request_body = ClaimPayload,
    responses(
        (status = 200, description = "Sinistro atualizado", body = Claim),
        (status = 409, description = "O sinistro já saiu de Submitted")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_claim(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Valid(payload): Valid<ClaimPayload>,
) -> Result<Json<Claim>, AppError> {
    let claim = app_state
        .claim_service
        .update_claim(&caller, id, payload)
        .await?;
    Ok(Json(claim))
}

// POST /api/claims/{id}/review
#[utoipa::path(
    post,
    path = "/api/claims/{id}/review",
    tag = "Claims",
    params(("id" = Uuid, Path, description = "ID do sinistro")),
    request_body = ReviewClaimPayload,
    responses(
        (status = 200, description = "Análise registrada", body = Claim),
        (status = 400, description = "Valor aprovado ausente ou acima do reclamado"),
        (status = 409, description = "Transição de status inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn review_claim(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Valid(payload): Valid<ReviewClaimPayload>,
) -> Result<Json<Claim>, AppError> {
    let claim = app_state
        .claim_service
        .review_claim(&caller, id, payload)
        .await?;
    Ok(Json(claim))
}

// POST /api/claims/{id}/pay
#[utoipa::path(
    post,
    path = "/api/claims/{id}/pay",
    tag = "Claims",
    params(("id" = Uuid, Path, description = "ID do sinistro")),
    responses(
        (status = 200, description = "Sinistro marcado como pago", body = Claim),
        (status = 409, description = "Só sinistros aprovados podem ser pagos")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_claim_paid(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Claim>, AppError> {
    Ok(Json(app_state.claim_service.mark_paid(&caller, id).await?))
}

// POST /api/claims/{id}/documents
#[utoipa::path(
    post,
    path = "/api/claims/{id}/documents",
    tag = "Claims",
    params(("id" = Uuid, Path, description = "ID do sinistro")),
    request_body = ClaimDocumentPayload,
    responses((status = 200, description = "Documento anexado", body = Claim)),
    security(("api_jwt" = []))
)]
pub async fn add_claim_document(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Valid(payload): Valid<ClaimDocumentPayload>,
) -> Result<Json<Claim>, AppError> {
    let claim = app_state
        .claim_service
        .add_document(&caller, id, &payload.url)
        .await?;
    Ok(Json(claim))
}

// DELETE /api/claims/{id}/documents
#[utoipa::path(
    delete,
    path = "/api/claims/{id}/documents",
    tag = "Claims",
    params(("id" = Uuid, Path, description = "ID do sinistro")),
    request_body = ClaimDocumentPayload,
    responses((status = 200, description = "Documento removido", body = Claim)),
    security(("api_jwt" = []))
)]
pub async fn remove_claim_document(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Valid(payload): Valid<ClaimDocumentPayload>,
) -> Result<Json<Claim>, AppError> {
    let claim = app_state
        .claim_service
        .remove_document(&caller, id, &payload.url)
        .await?;
    Ok(Json(claim))
}
