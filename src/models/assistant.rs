// src/models/assistant.rs
//
// Perguntas ao assistente da agência (RAG) e a resposta normalizada.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    common::error::{rule_error, AppError},
    models::{rules::trim_option, Schema},
};

/// Sobre o que é a pergunta. Cada escopo tem a sua função remota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QueryScope {
    #[default]
    General,
    Customers,
    Claims,
    Policies,
    Documents,
}

impl QueryScope {
    pub fn function_name(self) -> &'static str {
        match self {
            QueryScope::General => "askQuestion",
            QueryScope::Customers => "queryCustomerRAG",
            QueryScope::Claims => "queryClaimsRAG",
            QueryScope::Policies => "queryPoliciesRAG",
            QueryScope::Documents => "queryDocumentsRAG",
        }
    }

    /// Valor de `metadata.queryType` quando a função remota não informa.
    pub fn query_type(self) -> &'static str {
        match self {
            QueryScope::General => "general",
            QueryScope::Customers => "customer",
            QueryScope::Claims => "claim",
            QueryScope::Policies => "policy",
            QueryScope::Documents => "document",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub start: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2025-03-31")]
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl QueryFilters {
    fn normalize(&mut self) {
        for value in [
            &mut self.customer_id,
            &mut self.policy_id,
            &mut self.claim_id,
            &mut self.document_id,
            &mut self.status,
            &mut self.kind,
        ] {
            trim_option(value);
        }
    }

    fn is_empty(&self) -> bool {
        *self == QueryFilters::default()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    #[validate(length(min = 1, max = 2000, message = "A pergunta deve ter entre 1 e 2000 caracteres."))]
    #[schema(example = "Quais apólices do cliente Mwila vencem este mês?")]
    pub query: String,
    #[serde(default)]
    pub scope: QueryScope,
    #[serde(default)]
    pub filters: Option<QueryFilters>,
}

impl Schema for QuestionPayload {
    fn validated(mut self) -> Result<Self, AppError> {
        self.query = self.query.trim().to_string();
        if let Some(filters) = &mut self.filters {
            filters.normalize();
        }
        self.filters = self.filters.filter(|f| !f.is_empty());

        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        let range = self.filters.as_ref().and_then(|f| f.date_range.as_ref());
        if range.is_some_and(|r| r.end < r.start) {
            errors.add(
                "filters",
                rule_error("end_before_start", "dateRange.end não pode ser anterior a dateRange.start."),
            );
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(AppError::ValidationError(errors))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NumberedRef {
    pub id: String,
    pub number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MatchedEntities {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customers: Vec<NamedRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<NumberedRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<NumberedRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<NamedRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadata {
    pub query_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_entities: Option<MatchedEntities>,
}

/// Resposta do assistente. Como na geração de conteúdo, falhas viram
/// `success: false` com `error` e `details`, nunca um erro HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(value_type = Vec<Object>)]
    pub sources: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_items_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<QueryMetadata>,
}

impl QueryResponse {
    pub fn failed(scope: QueryScope, details: impl ToString) -> Self {
        Self {
            success: false,
            answer: None,
            error: Some(format!(
                "Falha ao consultar o assistente ({}).",
                scope.query_type()
            )),
            details: Some(details.to_string()),
            sources: Vec::new(),
            similar_items_count: None,
            metadata: None,
        }
    }

    /// Garante `metadata.queryType`; o que a função remota mandou prevalece.
    pub fn tagged(mut self, scope: QueryScope) -> Self {
        if self.metadata.is_none() {
            self.metadata = Some(QueryMetadata {
                query_type: scope.query_type().to_string(),
                matched_entities: None,
            });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::validation_details;
    use serde_json::json;

    fn payload(raw: serde_json::Value) -> Result<QuestionPayload, AppError> {
        serde_json::from_value::<QuestionPayload>(raw)
            .unwrap()
            .validated()
    }

    #[test]
    fn scope_defaults_to_general_question() {
        let question = payload(json!({ "query": "  O que cobre a apólice de terceiros?  " })).unwrap();
        assert_eq!(question.scope, QueryScope::General);
        assert_eq!(question.scope.function_name(), "askQuestion");
        assert_eq!(question.query, "O que cobre a apólice de terceiros?");
        assert!(question.filters.is_none());
    }

    #[test]
    fn blank_filters_are_dropped() {
        let question = payload(json!({
            "query": "sinistros pendentes",
            "scope": "claims",
            "filters": { "status": "  ", "customerId": "" }
        }))
        .unwrap();
        assert!(question.filters.is_none());
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let Err(AppError::ValidationError(errors)) = payload(json!({
            "query": "documentos do trimestre",
            "scope": "documents",
            "filters": { "dateRange": { "start": "2025-03-31", "end": "2025-01-01" } }
        })) else {
            panic!("esperava erro de validação");
        };
        assert!(validation_details(&errors).contains_key("filters"));
    }

    #[test]
    fn remote_metadata_wins_over_the_scope_tag() {
        let remote: QueryResponse = serde_json::from_value(json!({
            "success": true,
            "answer": "Duas apólices.",
            "metadata": { "queryType": "policy-number" }
        }))
        .unwrap();
        let tagged = remote.tagged(QueryScope::Policies);
        assert_eq!(tagged.metadata.unwrap().query_type, "policy-number");

        let bare = QueryResponse::failed(QueryScope::Claims, "timeout").tagged(QueryScope::Claims);
        assert_eq!(bare.metadata.unwrap().query_type, "claim");
    }
}
