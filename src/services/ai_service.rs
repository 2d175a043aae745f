// src/services/ai_service.rs

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{
    common::error::AppError,
    models::ai::{GenerationRequest, GenerationResult, StreamChunk},
    services::functions_client::{CallableError, FunctionsClient},
};

pub const GENERATE_CONTENT_FN: &str = "generateAIContent";
pub const GENERATE_CONTENT_STREAM_FN: &str = "generateAIContentStream";

#[derive(Deserialize)]
struct GeneratedText {
    text: String,
}

// Uma linha do NDJSON: ou um pedaço de texto, ou o erro que encerrou a geração
#[derive(Deserialize)]
#[serde(untagged)]
enum StreamLine {
    Chunk(StreamChunk),
    Failure { error: CallableError },
}

#[derive(Clone)]
pub struct AiService {
    functions: FunctionsClient,
}

impl AiService {
    pub fn new(functions: FunctionsClient) -> Self {
        Self { functions }
    }

    /// Geração em uma chamada. Nunca devolve erro: falhas viram `success: false`.
    pub async fn generate_content(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        match self
            .functions
            .call::<_, GeneratedText>(GENERATE_CONTENT_FN, request, cancel)
            .await
        {
            Ok(generated) => GenerationResult::ok(generated.text),
            Err(e) => {
                tracing::error!("Erro ao gerar conteúdo: {}", e);
                GenerationResult::failed(e)
            }
        }
    }

    /// Mesma chamada única, com o texto inteiro entregue a `on_chunk` uma só vez.
    pub async fn generate_content_stream(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
        mut on_chunk: impl FnMut(&str),
    ) -> GenerationResult {
        let result = self.generate_content(request, cancel).await;
        if result.success {
            on_chunk(&result.text);
        }
        result
    }

    /// Streaming de verdade: cada linha `{"text": ...}` da função remota vira um item.
    /// A sequência é preguiçosa, finita e não recomeça; o token interrompe a leitura.
    pub fn stream_content(
        &self,
        request: GenerationRequest,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<String, AppError>> + Send + use<> {
        let functions = self.functions.clone();

        try_stream! {
            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AppError::Cancelled),
                response = functions.open_stream(GENERATE_CONTENT_STREAM_FN, &request) => response,
            };
            let response = opened?;
            let mut body = Box::pin(response.bytes_stream());
            let mut buffer: Vec<u8> = Vec::new();

            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(AppError::Cancelled),
                    next = body.next() => Ok(next),
                };
                let Some(bytes) = next? else {
                    break;
                };
                let bytes = bytes.map_err(|e| {
                    AppError::RemoteCall(format!("{GENERATE_CONTENT_STREAM_FN}: {e}"))
                })?;
                buffer.extend_from_slice(&bytes);

                while let Some(end) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=end).collect();
                    if let Some(text) = parse_line(&line)? {
                        yield text;
                    }
                }
            }

            // Última linha sem '\n' no fim
            if let Some(text) = parse_line(&buffer)? {
                yield text;
            }
        }
    }
}

fn parse_line(line: &[u8]) -> Result<Option<String>, AppError> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return Ok(None);
    }

    match serde_json::from_slice::<StreamLine>(line) {
        Ok(StreamLine::Chunk(chunk)) if chunk.text.is_empty() => Ok(None),
        Ok(StreamLine::Chunk(chunk)) => Ok(Some(chunk.text)),
        Ok(StreamLine::Failure { error }) => {
            Err(AppError::RemoteCall(error.describe(GENERATE_CONTENT_STREAM_FN)))
        }
        Err(e) => Err(AppError::RemoteCall(format!(
            "{GENERATE_CONTENT_STREAM_FN}: linha inválida: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::{spawn_fake_functions, unreachable_functions};
    use axum::{body::Body, routing::post, Json, Router};
    use futures::TryStreamExt;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            max_tokens: None,
            temperature: None,
        }
    }

    async fn service_with(router: Router) -> AiService {
        let base = spawn_fake_functions(router).await;
        AiService::new(FunctionsClient::new(&base, "k", Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn transport_failure_becomes_unsuccessful_result() {
        let result = unreachable_ai()
            .generate_content(&request("olá"), &CancellationToken::new())
            .await;

        assert!(!result.success);
        assert_eq!(result.text, "");
        assert!(result.error.is_some_and(|e| !e.is_empty()));
    }

    fn unreachable_ai() -> AiService {
        AiService::new(unreachable_functions())
    }

    #[tokio::test]
    async fn on_chunk_receives_the_whole_text_exactly_once() {
        let service = service_with(Router::new().route(
            "/generateAIContent",
            post(|Json(body): Json<Value>| async move {
                let prompt = body["data"]["prompt"].as_str().unwrap_or_default().to_string();
                Json(json!({ "result": { "text": format!("eco: {prompt}") } }))
            }),
        ))
        .await;

        let mut chunks = Vec::new();
        let result = service
            .generate_content_stream(&request("apólice"), &CancellationToken::new(), |chunk| {
                chunks.push(chunk.to_string())
            })
            .await;

        assert!(result.success);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], result.text);
        assert_eq!(result.text, "eco: apólice");
    }

    #[tokio::test]
    async fn failed_generation_does_not_call_on_chunk() {
        let mut calls = 0;
        let result = unreachable_ai()
            .generate_content_stream(&request("x"), &CancellationToken::new(), |_| calls += 1)
            .await;

        assert!(!result.success);
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn ndjson_lines_are_streamed_in_order() {
        let service = service_with(Router::new().route(
            "/generateAIContentStream",
            post(|| async { Body::from("{\"text\":\"a\"}\n\n{\"text\":\"b\"}") }),
        ))
        .await;

        let chunks: Vec<String> = service
            .stream_content(request("x"), CancellationToken::new())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn error_line_ends_the_stream_with_an_error() {
        let service = service_with(Router::new().route(
            "/generateAIContentStream",
            post(|| async {
                Body::from("{\"text\":\"a\"}\n{\"error\":{\"status\":\"INTERNAL\",\"message\":\"quota\"}}\n")
            }),
        ))
        .await;

        let items: Vec<_> = service
            .stream_content(request("x"), CancellationToken::new())
            .collect()
            .await;
        assert!(matches!(items.as_slice(), [Ok(a), Err(AppError::RemoteCall(_))] if a == "a"));
    }

    #[tokio::test]
    async fn cancelled_stream_yields_cancelled() {
        let token = CancellationToken::new();
        token.cancel();

        let items: Vec<_> = unreachable_ai()
            .stream_content(request("x"), token)
            .collect()
            .await;
        assert!(matches!(items.as_slice(), [Err(AppError::Cancelled)]));
    }
}
