// src/handlers/customers.rs

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
    models::customer::{
        Customer, CustomerFilters, CustomerListResponse, CustomerPayload, CustomerStatusPayload,
    },
};

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Cliente cadastrado", body = Customer),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "NRC/Passaporte já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Valid(payload): Valid<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state
        .customer_service
        .create_customer(&caller, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    params(CustomerFilters),
    responses(
        (status = 200, description = "Página de clientes; `lastDoc` continua a listagem", body = CustomerListResponse),
        (status = 400, description = "Filtro ou ordenação inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Filters(filters): Filters<CustomerFilters>,
) -> Result<Json<CustomerListResponse>, AppError> {
    let page = app_state
        .customer_service
        .list_customers(&caller, filters)
        .await?;
    Ok(Json(page))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, AppError> {
    Ok(Json(app_state.customer_service.get_customer(&caller, id).await?))
}

// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = CustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Valid(payload): Valid<CustomerPayload>,
) -> Result<Json<Customer>, AppError> {
    let customer = app_state
        .customer_service
        .update_customer(&caller, id, payload)
        .await?;
    Ok(Json(customer))
}

// PATCH /api/customers/{id}/status
#[utoipa::path(
    patch,
    path = "/api/customers/{id}/status",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = CustomerStatusPayload,
    responses((status = 200, description = "Status alterado", body = Customer)),
    security(("api_jwt" = []))
)]
pub async fn set_customer_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Valid(payload): Valid<CustomerStatusPayload>,
) -> Result<Json<Customer>, AppError> {
    let customer = app_state
        .customer_service
        .set_status(&caller, id, payload.status)
        .await?;
    Ok(Json(customer))
}
