// src/services/car_analysis_service.rs

use tokio_util::sync::CancellationToken;

use crate::{
    common::error::AppError,
    models::car_analysis::{CarAnalysisResult, CarPhotoAnalysisInput},
    services::functions_client::FunctionsClient,
};

pub const ANALYZE_CAR_PHOTO_FN: &str = "analyzeCarPhoto";

#[derive(Clone)]
pub struct CarAnalysisService {
    functions: FunctionsClient,
}

impl CarAnalysisService {
    pub fn new(functions: FunctionsClient) -> Self {
        Self { functions }
    }

    /// Como no prêmio, a análise é da função remota: falhas voltam ao chamador.
    pub async fn analyze_car_photo(
        &self,
        input: &CarPhotoAnalysisInput,
        cancel: &CancellationToken,
    ) -> Result<CarAnalysisResult, AppError> {
        tracing::info!(photo_len = input.photo_base64.len(), "Analisando foto de veículo");

        let analysis: CarAnalysisResult = self
            .functions
            .call(ANALYZE_CAR_PHOTO_FN, input, cancel)
            .await
            .inspect_err(|e| tracing::error!("Erro ao analisar a foto: {}", e))?;

        if !analysis.identifies_the_car() {
            return Err(AppError::RemoteCall(format!(
                "{ANALYZE_CAR_PHOTO_FN}: marca ou modelo não identificados"
            )));
        }
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::{spawn_fake_functions, unreachable_functions};
    use axum::{routing::post, Json, Router};
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn input() -> CarPhotoAnalysisInput {
        CarPhotoAnalysisInput {
            photo_base64: "/9j/4AAQSkZJRg==".into(),
            preferred_budget: None,
            preferred_body_type: Some("SUV".into()),
        }
    }

    fn analysis(make: &str) -> Value {
        json!({
            "carDetails": {
                "make": make,
                "model": "RAV4",
                "estimatedYear": 2018,
                "bodyType": "SUV",
                "condition": "Bom",
                "estimatedValue": 320000.0
            },
            "insuranceRecommendation": {
                "recommendedCoverage": "Comprehensive",
                "estimatedPremium": 12800.0,
                "coverageDetails": "Cobertura total com franquia padrão"
            },
            "marketplaceRecommendations": {
                "similarListings": [],
                "marketplaces": [{
                    "name": "Used Cars Zambia",
                    "url": "https://www.usedcars.co.zm/",
                    "description": "Classificados de usados"
                }]
            }
        })
    }

    async fn service_returning(result: Value) -> CarAnalysisService {
        let base = spawn_fake_functions(Router::new().route(
            "/analyzeCarPhoto",
            post(move |Json(body): Json<Value>| async move {
                assert_eq!(body["data"]["preferredBodyType"], "SUV");
                Json(json!({ "result": result }))
            }),
        ))
        .await;
        CarAnalysisService::new(FunctionsClient::new(&base, "k", Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn analysis_comes_back_as_sent_by_the_remote() {
        let service = service_returning(analysis("Toyota")).await;

        let result = service
            .analyze_car_photo(&input(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.car_details.make, "Toyota");
        assert_eq!(result.insurance_recommendation.estimated_premium, Decimal::new(12800, 0));
        assert_eq!(result.marketplace_recommendations.marketplaces.len(), 1);
    }

    #[tokio::test]
    async fn unidentified_car_is_a_remote_failure() {
        let service = service_returning(analysis("  ")).await;

        let result = service.analyze_car_photo(&input(), &CancellationToken::new()).await;
        assert!(matches!(result, Err(AppError::RemoteCall(_))));
    }

    #[tokio::test]
    async fn unreachable_remote_is_a_remote_failure() {
        let service = CarAnalysisService::new(unreachable_functions());

        let result = service.analyze_car_photo(&input(), &CancellationToken::new()).await;
        assert!(matches!(result, Err(AppError::RemoteCall(_))));
    }
}
