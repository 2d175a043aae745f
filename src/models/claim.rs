// src/models/claim.rs

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    common::error::{rule_error, AppError},
    models::{
        query::{SortField, SortOrder},
        rules::{document_urls, positive_amount, trim_in_place},
        Schema,
    },
};

// --- STATUS E FLUXO DE ANÁLISE ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "claim_status")]
pub enum ClaimStatus {
    #[default]
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Paid,
}

impl ClaimStatus {
    /// Submitted -> UnderReview -> Approved | Rejected; Approved -> Paid.
    /// UnderReview -> UnderReview só atualiza as notas.
    pub fn can_transition_to(self, next: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (self, next),
            (Submitted, UnderReview)
                | (UnderReview, UnderReview)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (Approved, Paid)
        )
    }

    pub fn transition_to(self, next: ClaimStatus) -> Result<ClaimStatus, AppError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::InvalidStatusTransition {
                from: format!("{self:?}"),
                to: format!("{next:?}"),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "damage_type")]
pub enum DamageType {
    Vehicle,
    Property,
    Personal,
}

// --- LOCAL ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLocation {
    #[validate(length(min = 1, message = "O endereço é obrigatório."))]
    pub address: String,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude fora do intervalo [-90, 90]."))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude fora do intervalo [-180, 180]."))]
    pub longitude: f64,
}

// --- SINISTRO ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub policy_id: Uuid,
    #[schema(value_type = String, format = Date)]
    pub incident_date: NaiveDate,
    #[schema(value_type = ClaimLocation)]
    pub location: Json<ClaimLocation>,
    pub description: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub damage_type: DamageType,
    pub documents: Vec<String>,
    pub status: ClaimStatus,
    #[schema(value_type = Option<f64>)]
    pub approved_amount: Option<Decimal>,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub agent_id: Option<Uuid>,
}

/// Abertura e edição de sinistro. O status nunca vem do cliente.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPayload {
    pub customer_id: Uuid,
    pub policy_id: Uuid,
    #[schema(value_type = String, format = Date, example = "2025-03-14")]
    pub incident_date: NaiveDate,
    #[validate(nested)]
    pub location: ClaimLocation,
    #[validate(length(min = 10, message = "A descrição deve ter no mínimo 10 caracteres."))]
    pub description: String,
    #[validate(custom(function = "positive_amount"))]
    #[schema(value_type = f64, example = 12000.0)]
    pub amount: Decimal,
    pub damage_type: DamageType,
    #[serde(default)]
    #[validate(custom(function = "document_urls"))]
    pub documents: Vec<String>,
}

impl Schema for ClaimPayload {
    fn validated(mut self) -> Result<Self, AppError> {
        trim_in_place(&mut self.description);
        trim_in_place(&mut self.location.address);
        self.documents.iter_mut().for_each(trim_in_place);
        let mut seen = HashSet::new();
        self.documents.retain(|url| seen.insert(url.clone()));

        self.validate()?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewClaimPayload {
    pub status: ClaimStatus,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub approved_amount: Option<Decimal>,
    #[validate(length(min = 1, message = "As notas da análise são obrigatórias."))]
    pub review_notes: String,
}

impl Schema for ReviewClaimPayload {
    fn validated(mut self) -> Result<Self, AppError> {
        trim_in_place(&mut self.review_notes);

        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        match (self.status, self.approved_amount) {
            (ClaimStatus::Approved, None) => errors.add(
                "approved_amount",
                rule_error("required", "O valor aprovado é obrigatório ao aprovar."),
            ),
            (ClaimStatus::Approved, Some(amount)) if amount <= Decimal::ZERO => errors.add(
                "approved_amount",
                rule_error("must_be_positive", "O valor aprovado deve ser maior que 0."),
            ),
            (status, Some(_)) if status != ClaimStatus::Approved => errors.add(
                "approved_amount",
                rule_error(
                    "only_when_approved",
                    "O valor aprovado só pode ser definido ao aprovar.",
                ),
            ),
            _ => {}
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(AppError::ValidationError(errors))
        }
    }
}

impl ReviewClaimPayload {
    /// Regras que dependem do sinistro gravado: a transição e o teto do valor aprovado.
    pub fn check_against(&self, claim: &Claim) -> Result<(), AppError> {
        claim.status.transition_to(self.status)?;

        if let Some(approved) = self.approved_amount {
            if approved > claim.amount {
                let mut errors = ValidationErrors::new();
                errors.add(
                    "approved_amount",
                    rule_error(
                        "exceeds_claimed",
                        "O valor aprovado não pode exceder o valor reclamado.",
                    ),
                );
                return Err(AppError::ValidationError(errors));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDocumentPayload {
    #[validate(url(message = "O documento deve ser uma URL válida."))]
    pub url: String,
}

impl Schema for ClaimDocumentPayload {
    fn validated(mut self) -> Result<Self, AppError> {
        trim_in_place(&mut self.url);
        self.validate()?;
        Ok(self)
    }
}

// --- LISTAGEM ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimSortField {
    IncidentDate,
    Amount,
    ApprovedAmount,
    DamageType,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl SortField for ClaimSortField {
    const ENTITY: &'static str = "claim";
    const FIELDS: &'static [(&'static str, Self)] = &[
        ("incidentDate", Self::IncidentDate),
        ("amount", Self::Amount),
        ("approvedAmount", Self::ApprovedAmount),
        ("damageType", Self::DamageType),
        ("status", Self::Status),
        ("createdAt", Self::CreatedAt),
        ("updatedAt", Self::UpdatedAt),
    ];

    fn column(self) -> &'static str {
        match self {
            Self::IncidentDate => "incident_date",
            Self::Amount => "amount",
            Self::ApprovedAmount => "approved_amount",
            Self::DamageType => "damage_type",
            Self::Status => "status",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ClaimFilters {
    /// Procura na descrição e no endereço do incidente
    pub search_term: Option<String>,
    pub status: Option<ClaimStatus>,
    pub damage_type: Option<DamageType>,
    pub policy_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    #[param(value_type = Option<String>, format = Date)]
    pub incident_from: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date)]
    pub incident_to: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ClaimQuery {
    pub search_term: Option<String>,
    pub status: Option<ClaimStatus>,
    pub damage_type: Option<DamageType>,
    pub policy_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub incident_from: Option<NaiveDate>,
    pub incident_to: Option<NaiveDate>,
    pub sort_by: Option<ClaimSortField>,
    pub sort_order: SortOrder,
    pub page: Option<i64>,
    pub page_size: i64,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimListResponse {
    pub items: Vec<Claim>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::validation_details;
    use serde_json::json;

    fn claim(status: ClaimStatus, amount: i64) -> Claim {
        let now = Utc::now();
        Claim {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            policy_id: Uuid::new_v4(),
            incident_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            location: Json(ClaimLocation {
                address: "Great East Road".into(),
                latitude: -15.4,
                longitude: 28.3,
            }),
            description: "Colisão traseira no semáforo".into(),
            amount: Decimal::new(amount, 0),
            damage_type: DamageType::Vehicle,
            documents: vec![],
            status,
            approved_amount: None,
            review_notes: None,
            created_at: now,
            updated_at: now,
            created_by: Uuid::new_v4(),
            agent_id: None,
        }
    }

    fn review(raw: serde_json::Value) -> Result<ReviewClaimPayload, AppError> {
        serde_json::from_value::<ReviewClaimPayload>(raw)
            .unwrap()
            .validated()
    }

    #[test]
    fn only_workflow_edges_are_allowed() {
        use ClaimStatus::*;
        assert!(Submitted.can_transition_to(UnderReview));
        assert!(UnderReview.can_transition_to(Approved));
        assert!(UnderReview.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Paid));

        assert!(!Submitted.can_transition_to(Approved));
        assert!(!Rejected.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Submitted));
        assert!(matches!(
            Rejected.transition_to(Approved),
            Err(AppError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn approving_requires_a_positive_amount() {
        assert!(review(json!({ "status": "Approved", "reviewNotes": "ok" })).is_err());
        assert!(
            review(json!({ "status": "Approved", "approvedAmount": 0, "reviewNotes": "ok" }))
                .is_err()
        );
        assert!(
            review(json!({ "status": "Approved", "approvedAmount": 500, "reviewNotes": "ok" }))
                .is_ok()
        );
    }

    #[test]
    fn approved_amount_outside_approval_is_rejected() {
        let Err(AppError::ValidationError(errors)) = review(
            json!({ "status": "Rejected", "approvedAmount": 10, "reviewNotes": "fraude" }),
        ) else {
            panic!("esperava erro de validação");
        };
        assert!(validation_details(&errors).contains_key("approvedAmount"));
    }

    #[test]
    fn blank_review_notes_are_rejected() {
        assert!(review(json!({ "status": "UnderReview", "reviewNotes": "   " })).is_err());
    }

    #[test]
    fn approved_amount_cannot_exceed_the_claim() {
        let payload = review(
            json!({ "status": "Approved", "approvedAmount": 1500, "reviewNotes": "ok" }),
        )
        .unwrap();

        assert!(payload.check_against(&claim(ClaimStatus::UnderReview, 1000)).is_err());
        assert!(payload.check_against(&claim(ClaimStatus::UnderReview, 2000)).is_ok());
        assert!(matches!(
            payload.check_against(&claim(ClaimStatus::Submitted, 2000)),
            Err(AppError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn claim_payload_checks_location_and_documents() {
        let raw = json!({
            "customerId": Uuid::new_v4(),
            "policyId": Uuid::new_v4(),
            "incidentDate": "2025-03-14",
            "location": { "address": "", "latitude": 91.0, "longitude": 28.3 },
            "description": "curta",
            "amount": 100,
            "damageType": "Vehicle",
            "documents": ["not a url"]
        });
        let Err(AppError::ValidationError(errors)) =
            serde_json::from_value::<ClaimPayload>(raw).unwrap().validated()
        else {
            panic!("esperava erro de validação");
        };
        let details = validation_details(&errors);

        for path in ["location.address", "location.latitude", "description", "documents"] {
            assert!(details.contains_key(path), "faltou {path}");
        }
    }

    #[test]
    fn repeated_documents_are_kept_once_in_order() {
        let raw = json!({
            "customerId": Uuid::new_v4(),
            "policyId": Uuid::new_v4(),
            "incidentDate": "2025-03-14",
            "location": { "address": "Cairo Road", "latitude": -15.4, "longitude": 28.3 },
            "description": "Colisão lateral no cruzamento",
            "amount": 100,
            "damageType": "Vehicle",
            "documents": ["https://a.example/1.jpg", "https://a.example/2.jpg", " https://a.example/1.jpg"]
        });
        let payload = serde_json::from_value::<ClaimPayload>(raw)
            .unwrap()
            .validated()
            .unwrap();

        assert_eq!(
            payload.documents,
            ["https://a.example/1.jpg", "https://a.example/2.jpg"]
        );
    }
}
