// src/models/premium.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        format::{calculate_percentage, format_currency},
    },
    models::{
        policy::{PolicyType, VehicleUsage},
        rules::positive_amount,
        Schema,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Car,
    Truck,
    Motorcycle,
}

/// Entrada da função remota `calculatePremium`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PremiumCalculationInput {
    #[validate(custom(function = "positive_amount"))]
    #[schema(value_type = f64, example = 250000.0)]
    pub vehicle_value: Decimal,
    pub vehicle_type: VehicleType,
    pub usage: VehicleUsage,
    pub coverage_type: PolicyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 18, message = "O condutor deve ter pelo menos 18 anos."))]
    pub driver_age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_history: Option<u32>,
    pub vehicle_age: u32,
}

impl Schema for PremiumCalculationInput {
    fn validated(self) -> Result<Self, AppError> {
        self.validate()?;
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PremiumTaxes {
    #[schema(value_type = f64)]
    pub vat: Decimal,
    #[schema(value_type = f64)]
    pub levy: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PremiumFees {
    #[schema(value_type = f64)]
    pub admin_fee: Decimal,
    #[schema(value_type = f64)]
    pub stamp_duty: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PremiumAdjustments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub age_discount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub no_claims_bonus: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub vehicle_age_loading: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub usage_loading: Option<Decimal>,
}

/// Resposta da função remota. O `total` é a autoridade: nunca é recalculado aqui.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PremiumBreakdown {
    #[schema(value_type = f64)]
    pub base_premium: Decimal,
    pub taxes: PremiumTaxes,
    pub fees: PremiumFees,
    #[serde(default)]
    pub adjustments: PremiumAdjustments,
    #[schema(value_type = f64)]
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownLine {
    pub label: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub formatted: String,
    /// Participação no total; ausente quando o total é zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share: Option<String>,
}

impl PremiumBreakdown {
    /// Linhas prontas para exibição, na ordem do recibo.
    pub fn display_lines(&self) -> Vec<BreakdownLine> {
        let adjustments = &self.adjustments;
        let optional = [
            ("Age discount", adjustments.age_discount),
            ("No claims bonus", adjustments.no_claims_bonus),
            ("Vehicle age loading", adjustments.vehicle_age_loading),
            ("Usage loading", adjustments.usage_loading),
        ];

        let mut lines = vec![self.line("Base premium", self.base_premium)];
        lines.extend(
            optional
                .into_iter()
                .filter_map(|(label, amount)| amount.map(|amount| self.line(label, amount))),
        );
        lines.push(self.line("VAT", self.taxes.vat));
        lines.push(self.line("Levy", self.taxes.levy));
        lines.push(self.line("Admin fee", self.fees.admin_fee));
        lines.push(self.line("Stamp duty", self.fees.stamp_duty));
        lines
    }

    fn line(&self, label: &str, amount: Decimal) -> BreakdownLine {
        BreakdownLine {
            label: label.to_string(),
            amount,
            formatted: format_currency(Some(amount)),
            share: calculate_percentage(amount, self.total).ok(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PremiumQuoteResponse {
    pub breakdown: PremiumBreakdown,
    pub lines: Vec<BreakdownLine>,
    pub total_formatted: String,
}

impl From<PremiumBreakdown> for PremiumQuoteResponse {
    fn from(breakdown: PremiumBreakdown) -> Self {
        Self {
            lines: breakdown.display_lines(),
            total_formatted: format_currency(Some(breakdown.total)),
            breakdown,
        }
    }
}
