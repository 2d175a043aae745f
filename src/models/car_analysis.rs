// src/models/car_analysis.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    common::error::{rule_error, AppError},
    models::{
        rules::{positive_amount, trim_option},
        Schema,
    },
};

/// Foto de até 5 MiB, já em base64.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_PHOTO_BASE64_LEN: usize = MAX_PHOTO_BYTES.div_ceil(3) * 4;

/// Entrada da função remota `analyzeCarPhoto`.
#[derive(Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarPhotoAnalysisInput {
    /// Base64 puro; um prefixo `data:image/...;base64,` é removido.
    pub photo_base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "positive_amount"))]
    #[schema(value_type = Option<f64>, example = 350000.0)]
    pub preferred_budget: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "SUV")]
    pub preferred_body_type: Option<String>,
}

// A foto não vai para os logs
impl std::fmt::Debug for CarPhotoAnalysisInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarPhotoAnalysisInput")
            .field("photo_base64_len", &self.photo_base64.len())
            .field("preferred_budget", &self.preferred_budget)
            .field("preferred_body_type", &self.preferred_body_type)
            .finish()
    }
}

impl Schema for CarPhotoAnalysisInput {
    fn validated(mut self) -> Result<Self, AppError> {
        let photo = self.photo_base64.trim();
        let photo = match photo.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => photo,
        };
        self.photo_base64 = photo.to_string();
        trim_option(&mut self.preferred_body_type);

        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if let Some(problem) = photo_problem(&self.photo_base64) {
            errors.add("photo_base64", problem);
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(AppError::ValidationError(errors))
        }
    }
}

fn photo_problem(photo: &str) -> Option<validator::ValidationError> {
    if photo.is_empty() {
        return Some(rule_error("required", "A foto é obrigatória."));
    }
    if photo.len() > MAX_PHOTO_BASE64_LEN {
        return Some(rule_error("too_large", "A foto deve ter no máximo 5 MB."));
    }
    let is_base64 = photo
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'\n' | b'\r'));
    if !is_base64 {
        return Some(rule_error("invalid_base64", "A foto deve estar em base64."));
    }
    None
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarDetails {
    pub make: String,
    pub model: String,
    pub estimated_year: i32,
    pub body_type: String,
    pub condition: String,
    #[schema(value_type = f64)]
    pub estimated_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceRecommendation {
    pub recommended_coverage: String,
    #[schema(value_type = f64)]
    pub estimated_premium: Decimal,
    pub coverage_details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MarketplaceListing {
    pub platform: String,
    pub url: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Marketplace {
    pub name: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceRecommendations {
    #[serde(default)]
    pub similar_listings: Vec<MarketplaceListing>,
    #[serde(default)]
    pub marketplaces: Vec<Marketplace>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarAnalysisResult {
    pub car_details: CarDetails,
    pub insurance_recommendation: InsuranceRecommendation,
    #[serde(default)]
    pub marketplace_recommendations: MarketplaceRecommendations,
}

impl CarAnalysisResult {
    /// Uma análise sem marca ou modelo não identificou o carro.
    pub fn identifies_the_car(&self) -> bool {
        !self.car_details.make.trim().is_empty() && !self.car_details.model.trim().is_empty()
    }
}
