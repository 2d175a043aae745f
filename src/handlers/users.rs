// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        extract::{Filters, Valid},
    },
    models::auth::{UpdateProfilePayload, UpdateRolePayload, User},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub items: Vec<User>,
    pub total: i64,
}

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses((status = 200, description = "Perfil do usuário atual", body = User)),
    security(("api_jwt" = []))
)]
pub async fn get_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<User>, AppError> {
    Ok(Json(app_state.user_service.get_user(caller.id).await?))
}

// PUT /api/users/me
#[utoipa::path(
    put,
    path = "/api/users/me",
    tag = "Users",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Perfil atualizado", body = User),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Valid(payload): Valid<UpdateProfilePayload>,
) -> Result<Json<User>, AppError> {
    let user = app_state
        .user_service
        .update_profile(caller.id, payload)
        .await?;
    Ok(Json(user))
}

// GET /api/admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    params(UserListParams),
    responses(
        (status = 200, description = "Usuários da agência", body = UserListResponse),
        (status = 403, description = "Apenas admins")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    Filters(params): Filters<UserListParams>,
) -> Result<Json<UserListResponse>, AppError> {
    let (items, total) = app_state
        .user_service
        .list_users(params.page, params.page_size)
        .await?;
    Ok(Json(UserListResponse { items, total }))
}

// PUT /api/admin/users/{id}/role
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/role",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = UpdateRolePayload,
    responses(
        (status = 200, description = "Papel alterado", body = User),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Valid(payload): Valid<UpdateRolePayload>,
) -> Result<Json<User>, AppError> {
    let user = app_state
        .user_service
        .set_role(caller.id, id, payload.role)
        .await?;
    Ok(Json(user))
}
