// src/services/premium_service.rs

use tokio_util::sync::CancellationToken;

use crate::{
    common::error::AppError,
    models::premium::{PremiumBreakdown, PremiumCalculationInput},
    services::functions_client::FunctionsClient,
};

pub const CALCULATE_PREMIUM_FN: &str = "calculatePremium";

#[derive(Clone)]
pub struct PremiumService {
    functions: FunctionsClient,
}

impl PremiumService {
    pub fn new(functions: FunctionsClient) -> Self {
        Self { functions }
    }

    /// O cálculo é da função remota. Qualquer falha volta para o chamador,
    /// sem nova tentativa e sem valor local de reserva.
    pub async fn calculate_premium(
        &self,
        input: &PremiumCalculationInput,
        cancel: &CancellationToken,
    ) -> Result<PremiumBreakdown, AppError> {
        self.functions
            .call(CALCULATE_PREMIUM_FN, input, cancel)
            .await
            .inspect_err(|e| tracing::error!("Erro ao calcular o prêmio: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::test_support::{quote_input, spawn_fake_functions, unreachable_functions},
        services::functions_client::FunctionsClient,
    };
    use axum::{routing::post, Json, Router};
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use std::time::Duration;

    #[tokio::test]
    async fn remote_total_is_returned_untouched() {
        let base = spawn_fake_functions(Router::new().route(
            "/calculatePremium",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["data"]["vehicleType"], "car");
                Json(json!({ "result": {
                    "basePremium": 3000.0,
                    "taxes": { "vat": 480.0, "levy": 90.0 },
                    "fees": { "adminFee": 150.0, "stampDuty": 30.0 },
                    "adjustments": {},
                    "total": 3333.33
                }}))
            }),
        ))
        .await;
        let functions = FunctionsClient::new(&base, "k", Duration::from_secs(5)).unwrap();

        let breakdown = PremiumService::new(functions)
            .calculate_premium(&quote_input(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(breakdown.total, Decimal::new(333333, 2));
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let result = PremiumService::new(unreachable_functions())
            .calculate_premium(&quote_input(), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(AppError::RemoteCall(_))));
    }
}
