// src/models/policy.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        error::{field_error, rule_error, AppError},
        format::CURRENCY_CODE,
    },
    models::{
        premium::PremiumCalculationInput,
        query::{SortField, SortOrder},
        rules::{positive_amount, trim_in_place, trim_option, vehicle_year},
        Schema,
    },
};

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "policy_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    Comprehensive,
    ThirdParty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "policy_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    Active,
    Expired,
    Cancelled,
    #[default]
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VehicleUsage {
    Private,
    Commercial,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Partial,
    /// Só aparece em registros antigos; novas gravações não aceitam.
    Failed,
}

fn writable_payment_status(status: &PaymentStatus) -> Result<(), ValidationError> {
    if *status == PaymentStatus::Failed {
        return Err(rule_error(
            "legacy_status",
            "O status de pagamento 'failed' não é mais aceito.",
        ));
    }
    Ok(())
}

// --- OBJETOS EMBUTIDOS (JSONB) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[validate(length(min = 1, message = "A matrícula é obrigatória."))]
    #[schema(example = "ABC 1234")]
    pub registration_number: String,
    #[validate(length(min = 1, message = "A marca é obrigatória."))]
    #[schema(example = "Toyota")]
    pub make: String,
    #[validate(length(min = 1, message = "O modelo é obrigatório."))]
    #[schema(example = "Corolla")]
    pub model: String,
    #[validate(custom(function = "vehicle_year"))]
    #[schema(example = 2019)]
    pub year: i32,
    #[validate(length(min = 1, message = "O número do motor é obrigatório."))]
    pub engine_number: String,
    #[validate(length(min = 1, message = "O número do chassi é obrigatório."))]
    pub chassis_number: String,
    #[validate(custom(function = "positive_amount"))]
    #[schema(value_type = f64, example = 250000.0)]
    pub value: Decimal,
    pub usage: VehicleUsage,
}

impl Vehicle {
    fn normalize(&mut self) {
        trim_in_place(&mut self.make);
        trim_in_place(&mut self.model);
        trim_in_place(&mut self.engine_number);
        trim_in_place(&mut self.chassis_number);
        self.registration_number = self.registration_number.trim().to_uppercase();
    }
}

fn default_currency() -> String {
    CURRENCY_CODE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Premium {
    #[validate(custom(function = "positive_amount"))]
    #[schema(value_type = f64, example = 4500.0)]
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3, message = "A moeda deve ser um código ISO de 3 letras."))]
    pub currency: String,
    #[serde(default)]
    #[validate(custom(function = "writable_payment_status"))]
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = Date)]
    pub next_payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    pub name: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

// --- APÓLICE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub policy_type: PolicyType,
    pub status: PolicyStatus,
    pub customer_id: Uuid,
    #[schema(example = "POL-LX3K2J9A-7QZ1B")]
    pub policy_number: String,
    #[schema(value_type = Vehicle)]
    pub vehicle: Json<Vehicle>,
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub end_date: NaiveDate,
    #[schema(value_type = Premium)]
    pub premium: Json<Premium>,
    #[schema(value_type = Vec<PolicyDocument>)]
    pub documents: Json<Vec<PolicyDocument>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub agent_id: Uuid,
}

/// Emissão e edição de apólice. Existe um único formato, com datas de calendário.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyPayload {
    #[serde(rename = "type")]
    pub policy_type: PolicyType,
    #[serde(default)]
    pub status: PolicyStatus,
    pub customer_id: Uuid,
    /// Gerado automaticamente quando ausente.
    #[serde(default)]
    pub policy_number: Option<String>,
    #[validate(nested)]
    pub vehicle: Vehicle,
    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2026-01-01")]
    pub end_date: NaiveDate,
    #[validate(nested)]
    pub premium: Premium,
    /// Quando presente, o valor do prêmio vem do cálculo remoto.
    #[serde(default)]
    #[validate(nested)]
    pub quote: Option<PremiumCalculationInput>,
}

impl Schema for PolicyPayload {
    fn validated(mut self) -> Result<Self, AppError> {
        trim_option(&mut self.policy_number);
        self.policy_number = self.policy_number.map(|n| n.to_uppercase());
        self.vehicle.normalize();
        self.premium.currency = self.premium.currency.trim().to_uppercase();
        trim_option(&mut self.premium.payment_method);

        let mut errors = match self.validate() {
            Ok(()) => validator::ValidationErrors::new(),
            Err(errors) => errors,
        };
        if self.end_date <= self.start_date {
            errors.add(
                "end_date",
                rule_error("end_before_start", "A data de fim deve ser posterior à data de início."),
            );
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(AppError::ValidationError(errors))
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatusPayload {
    pub status: PolicyStatus,
}

impl Schema for PolicyStatusPayload {
    fn validated(self) -> Result<Self, AppError> {
        Ok(self)
    }
}

// --- LISTAGEM ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicySortField {
    PolicyNumber,
    Type,
    Status,
    StartDate,
    EndDate,
    PremiumAmount,
    CreatedAt,
    UpdatedAt,
}

impl SortField for PolicySortField {
    const ENTITY: &'static str = "policy";
    const FIELDS: &'static [(&'static str, Self)] = &[
        ("policyNumber", Self::PolicyNumber),
        ("type", Self::Type),
        ("status", Self::Status),
        ("startDate", Self::StartDate),
        ("endDate", Self::EndDate),
        ("premium.amount", Self::PremiumAmount),
        ("createdAt", Self::CreatedAt),
        ("updatedAt", Self::UpdatedAt),
    ];

    fn column(self) -> &'static str {
        match self {
            Self::PolicyNumber => "policy_number",
            Self::Type => "policy_type",
            Self::Status => "status",
            Self::StartDate => "start_date",
            Self::EndDate => "end_date",
            Self::PremiumAmount => "(premium->>'amount')::numeric",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PolicyFilters {
    /// Procura no número da apólice, matrícula, marca e modelo
    pub search_term: Option<String>,
    pub status: Option<PolicyStatus>,
    #[serde(rename = "type")]
    pub policy_type: Option<PolicyType>,
    pub customer_id: Option<Uuid>,
    /// Vigência começando a partir desta data
    #[param(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    /// Vigência terminando até esta data
    #[param(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PolicyQuery {
    pub search_term: Option<String>,
    pub status: Option<PolicyStatus>,
    pub policy_type: Option<PolicyType>,
    pub customer_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort_by: Option<PolicySortField>,
    pub sort_order: SortOrder,
    pub page: Option<i64>,
    pub page_size: i64,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyListResponse {
    pub items: Vec<Policy>,
    pub total: i64,
}

/// Usado pelo serviço quando o número vem do cliente.
pub fn ensure_policy_number(number: &str) -> Result<(), AppError> {
    let valid = number.len() <= 40
        && number
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(field_error(
            "policy_number",
            "invalid_format",
            "O número da apólice só pode ter letras, dígitos e '-'.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::error::validation_details, models::rules::max_vehicle_year};
    use serde_json::{json, Value};

    fn payload() -> Value {
        json!({
            "type": "comprehensive",
            "customerId": "7b0c1c52-3f7e-4d0a-9a55-1f1b2e3c4d5e",
            "vehicle": {
                "registrationNumber": "abc 1234",
                "make": "Toyota",
                "model": "Corolla",
                "year": 2019,
                "engineNumber": "1NZ-123456",
                "chassisNumber": "NZE141-000123",
                "value": 250000,
                "usage": "private"
            },
            "startDate": "2025-01-01",
            "endDate": "2026-01-01",
            "premium": { "amount": 4500, "paymentStatus": "pending" }
        })
    }

    fn details(raw: Value) -> std::collections::BTreeMap<String, Vec<String>> {
        let policy: PolicyPayload = serde_json::from_value(raw).unwrap();
        match policy.validated() {
            Err(AppError::ValidationError(errors)) => validation_details(&errors),
            other => panic!("esperava erro de validação, veio {other:?}"),
        }
    }

    #[test]
    fn valid_policy_gets_defaults() {
        let policy: PolicyPayload = serde_json::from_value(payload()).unwrap();
        let policy = policy.validated().unwrap();

        assert_eq!(policy.status, PolicyStatus::Pending);
        assert_eq!(policy.premium.currency, "ZMW");
        assert_eq!(policy.vehicle.registration_number, "ABC 1234");
    }

    #[test]
    fn end_date_not_after_start_date_is_reported_on_end_date() {
        for end in ["2025-01-01", "2024-12-31"] {
            let mut raw = payload();
            raw["endDate"] = json!(end);
            assert!(details(raw).contains_key("endDate"));
        }
    }

    #[test]
    fn vehicle_year_out_of_range_is_reported_on_nested_path() {
        for year in [1899, max_vehicle_year() + 1] {
            let mut raw = payload();
            raw["vehicle"]["year"] = json!(year);
            assert!(details(raw).contains_key("vehicle.year"));
        }
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let mut raw = payload();
        raw["vehicle"]["value"] = json!(0);
        raw["premium"]["amount"] = json!(-10);
        let details = details(raw);

        assert!(details.contains_key("vehicle.value"));
        assert!(details.contains_key("premium.amount"));
    }

    #[test]
    fn legacy_failed_payment_status_reads_but_does_not_write() {
        let stored: Premium =
            serde_json::from_value(json!({ "amount": 10, "currency": "ZMW", "paymentStatus": "failed" }))
                .unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Failed);

        let mut raw = payload();
        raw["premium"]["paymentStatus"] = json!("failed");
        assert!(details(raw).contains_key("premium.paymentStatus"));
    }

    #[test]
    fn unknown_policy_type_is_a_shape_error() {
        let mut raw = payload();
        raw["type"] = json!("fire");
        assert!(serde_json::from_value::<PolicyPayload>(raw).is_err());
    }

    #[test]
    fn nested_premium_sort_field_maps_to_json_column() {
        let field = PolicySortField::parse("premium.amount").unwrap();
        assert_eq!(field.column(), "(premium->>'amount')::numeric");
        assert!(PolicySortField::parse("vehicle").is_err());
    }

    #[test]
    fn client_policy_numbers_are_checked() {
        assert!(ensure_policy_number("POL-LX3K2J9A-7QZ1B").is_ok());
        assert!(ensure_policy_number("pol 1").is_err());
    }
}
