// src/handlers/premium.rs

use axum::{extract::State, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::extract::Valid,
    models::premium::{PremiumCalculationInput, PremiumQuoteResponse},
};

// POST /api/premium/calculate
#[utoipa::path(
    post,
    path = "/api/premium/calculate",
    tag = "Premium",
    request_body = PremiumCalculationInput,
    responses(
        (status = 200, description = "Composição do prêmio com valores formatados", body = PremiumQuoteResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 502, description = "A função remota falhou")
    ),
    security(("api_jwt" = []))
)]
pub async fn calculate_premium(
    State(app_state): State<AppState>,
    Valid(input): Valid<PremiumCalculationInput>,
) -> Result<Json<PremiumQuoteResponse>, AppError> {
    let breakdown = app_state
        .premium_service
        .calculate_premium(&input, &app_state.request_token())
        .await?;
    Ok(Json(breakdown.into()))
}
