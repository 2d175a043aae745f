// src/services/assistant_service.rs

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    models::assistant::{QueryFilters, QueryResponse, QuestionPayload},
    services::functions_client::FunctionsClient,
};

// O que vai para a função remota: a pergunta e quem perguntou
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoteQuery<'a> {
    query: &'a str,
    user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<&'a QueryFilters>,
}

#[derive(Clone)]
pub struct AssistantService {
    functions: FunctionsClient,
}

impl AssistantService {
    pub fn new(functions: FunctionsClient) -> Self {
        Self { functions }
    }

    /// Pergunta ao assistente do escopo pedido. Nunca devolve erro:
    /// falhas viram `success: false` com `error` e `details`.
    pub async fn ask(
        &self,
        user_id: Uuid,
        question: &QuestionPayload,
        cancel: &CancellationToken,
    ) -> QueryResponse {
        let scope = question.scope;
        let remote = RemoteQuery {
            query: &question.query,
            user_id: user_id.to_string(),
            filters: question.filters.as_ref(),
        };

        let response = match self
            .functions
            .call::<_, QueryResponse>(scope.function_name(), &remote, cancel)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(scope = scope.query_type(), "Erro ao consultar o assistente: {}", e);
                QueryResponse::failed(scope, e)
            }
        };
        response.tagged(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::test_support::{spawn_fake_functions, unreachable_functions},
        models::assistant::QueryScope,
    };
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn question(scope: QueryScope) -> QuestionPayload {
        QuestionPayload {
            query: "Quais sinistros estão em análise?".into(),
            scope,
            filters: Some(QueryFilters {
                status: Some("UnderReview".into()),
                ..Default::default()
            }),
        }
    }

    #[tokio::test]
    async fn scope_picks_the_remote_function_and_tags_the_answer() {
        let base = spawn_fake_functions(Router::new().route(
            "/queryClaimsRAG",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["data"]["filters"]["status"], "UnderReview");
                assert!(body["data"]["userId"].as_str().is_some_and(|id| !id.is_empty()));
                Json(json!({ "result": {
                    "success": true,
                    "answer": "Dois sinistros.",
                    "similarItemsCount": 2
                }}))
            }),
        ))
        .await;
        let service = AssistantService::new(
            FunctionsClient::new(&base, "k", Duration::from_secs(5)).unwrap(),
        );

        let response = service
            .ask(Uuid::new_v4(), &question(QueryScope::Claims), &CancellationToken::new())
            .await;

        assert!(response.success);
        assert_eq!(response.answer.as_deref(), Some("Dois sinistros."));
        assert_eq!(response.similar_items_count, Some(2));
        assert_eq!(response.metadata.unwrap().query_type, "claim");
    }

    #[tokio::test]
    async fn remote_reported_failure_is_passed_through() {
        let base = spawn_fake_functions(Router::new().route(
            "/askQuestion",
            post(|| async {
                Json(json!({ "result": {
                    "success": false,
                    "error": "Failed to generate response",
                    "details": "No content received from AI"
                }}))
            }),
        ))
        .await;
        let service = AssistantService::new(
            FunctionsClient::new(&base, "k", Duration::from_secs(5)).unwrap(),
        );

        let response = service
            .ask(Uuid::new_v4(), &question(QueryScope::General), &CancellationToken::new())
            .await;

        assert!(!response.success);
        assert_eq!(response.details.as_deref(), Some("No content received from AI"));
    }

    #[tokio::test]
    async fn transport_failure_becomes_an_unsuccessful_answer() {
        let service = AssistantService::new(unreachable_functions());

        let response = service
            .ask(Uuid::new_v4(), &question(QueryScope::Policies), &CancellationToken::new())
            .await;

        assert!(!response.success);
        assert!(response.answer.is_none());
        assert!(response.error.is_some());
        assert!(response.details.is_some_and(|d| d.contains("queryPoliciesRAG")));
    }
}
