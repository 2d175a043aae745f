// src/services/functions_client.rs
//
// Cliente das funções remotas ("callable"): POST {base}/{nome} com {"data": ...};
// sucesso volta como {"result": ...}, falha como {"error": {"status", "message"}}.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::common::error::AppError;

#[derive(Serialize)]
struct CallableRequest<'a, T> {
    data: &'a T,
}

#[derive(Deserialize)]
struct CallableResponse<R> {
    result: Option<R>,
    error: Option<CallableError>,
}

#[derive(Debug, Deserialize)]
pub struct CallableError {
    #[serde(default)]
    pub status: Option<String>,
    pub message: String,
}

impl CallableError {
    pub fn describe(&self, function: &str) -> String {
        match &self.status {
            Some(status) => format!("{function}: {status}: {}", self.message),
            None => format!("{function}: {}", self.message),
        }
    }
}

#[derive(Clone)]
pub struct FunctionsClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl FunctionsClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Falha ao criar o cliente HTTP: {e}"))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, function: &str) -> String {
        format!("{}/{}", self.base_url, function)
    }

    /// Uma chamada, sem nova tentativa. O token cancela a espera a qualquer momento.
    pub async fn call<T, R>(
        &self,
        function: &str,
        data: &T,
        cancel: &CancellationToken,
    ) -> Result<R, AppError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            result = self.send_and_decode(function, data) => result,
        }
    }

    async fn send_and_decode<T, R>(&self, function: &str, data: &T) -> Result<R, AppError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let response = self.send(function, data).await?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(function, e))?;

        let envelope: CallableResponse<R> = serde_json::from_slice(&body).map_err(|e| {
            AppError::RemoteCall(format!("{function}: resposta inválida ({status}): {e}"))
        })?;

        match (envelope.result, envelope.error) {
            (_, Some(error)) => Err(AppError::RemoteCall(error.describe(function))),
            (Some(result), None) if status.is_success() => Ok(result),
            _ => Err(AppError::RemoteCall(format!(
                "{function}: resposta sem resultado ({status})"
            ))),
        }
    }

    /// Abre a resposta em streaming; o corpo fica para o chamador consumir.
    pub async fn open_stream<T>(&self, function: &str, data: &T) -> Result<Response, AppError>
    where
        T: Serialize,
    {
        let response = self.send(function, data).await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.bytes().await.unwrap_or_default();
        Err(AppError::RemoteCall(describe_failure(function, status, &body)))
    }

    async fn send<T>(&self, function: &str, data: &T) -> Result<Response, AppError>
    where
        T: Serialize,
    {
        tracing::debug!(function, "Chamando função remota");
        self.http
            .post(self.url(function))
            .bearer_auth(&self.api_key)
            .json(&CallableRequest { data })
            .send()
            .await
            .map_err(|e| transport_error(function, e))
    }
}

fn transport_error(function: &str, error: reqwest::Error) -> AppError {
    let kind = if error.is_timeout() {
        "tempo esgotado"
    } else if error.is_connect() {
        "falha de conexão"
    } else {
        "erro de transporte"
    };
    AppError::RemoteCall(format!("{function}: {kind}: {error}"))
}

fn describe_failure(function: &str, status: StatusCode, body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorOnly {
        error: CallableError,
    }

    match serde_json::from_slice::<ErrorOnly>(body) {
        Ok(envelope) => envelope.error.describe(function),
        Err(_) => format!("{function}: status {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::spawn_fake_functions;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    fn client(base_url: &str) -> FunctionsClient {
        FunctionsClient::new(base_url, "chave-de-teste", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn result_envelope_is_unwrapped() {
        let base = spawn_fake_functions(Router::new().route(
            "/echo",
            post(|Json(body): Json<Value>| async move { Json(json!({ "result": body["data"] })) }),
        ))
        .await;

        let echoed: Value = client(&base)
            .call("echo", &json!({ "n": 7 }), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(echoed, json!({ "n": 7 }));
    }

    #[tokio::test]
    async fn error_envelope_becomes_remote_call_error() {
        let base = spawn_fake_functions(Router::new().route(
            "/boom",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": { "status": "INVALID_ARGUMENT", "message": "vehicleValue" } })),
                )
            }),
        ))
        .await;

        let result: Result<Value, _> = client(&base)
            .call("boom", &json!({}), &CancellationToken::new())
            .await;
        match result {
            Err(AppError::RemoteCall(message)) => {
                assert!(message.contains("INVALID_ARGUMENT"));
                assert!(message.contains("vehicleValue"));
            }
            other => panic!("esperava RemoteCall, veio {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_token_wins_before_any_request() {
        let token = CancellationToken::new();
        token.cancel();

        let result: Result<Value, _> = client("http://127.0.0.1:9").call("x", &json!({}), &token).await;
        assert!(matches!(result, Err(AppError::Cancelled)));
    }
}
