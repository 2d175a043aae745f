// src/handlers/ai.rs

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{stream, Stream, StreamExt};
use serde_json::json;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, extract::Valid},
    models::{
        ai::{GenerationRequest, GenerationResult, StreamChunk},
        assistant::{QueryResponse, QuestionPayload},
        car_analysis::{CarAnalysisResult, CarPhotoAnalysisInput},
    },
};

// POST /api/ai/generate
#[utoipa::path(
    post,
    path = "/api/ai/generate",
    tag = "AI",
    request_body = GenerationRequest,
    responses(
        (status = 200, description = "Texto gerado; falhas remotas vêm com success = false", body = GenerationResult)
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_content(
    State(app_state): State<AppState>,
    Valid(request): Valid<GenerationRequest>,
) -> Json<GenerationResult> {
    Json(
        app_state
            .ai_service
            .generate_content(&request, &app_state.request_token())
            .await,
    )
}

// POST /api/ai/generate-stream
//
// Variante de chamada única: um evento `chunk` com o texto inteiro e um `result`.
#[utoipa::path(
    post,
    path = "/api/ai/generate-stream",
    tag = "AI",
    request_body = GenerationRequest,
    responses(
        (status = 200, description = "text/event-stream com `chunk` (no máximo um) e `result`", body = String, content_type = "text/event-stream")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_content_stream(
    State(app_state): State<AppState>,
    Valid(request): Valid<GenerationRequest>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let mut chunks = Vec::new();
    let result = app_state
        .ai_service
        .generate_content_stream(&request, &app_state.request_token(), |text| {
            chunks.push(text.to_string())
        })
        .await;

    let events = chunks
        .into_iter()
        .map(|text| Event::default().event("chunk").json_data(StreamChunk { text }))
        .chain(std::iter::once(Event::default().event("result").json_data(&result)));

    Sse::new(stream::iter(events))
}

// POST /api/ai/stream
#[utoipa::path(
    post,
    path = "/api/ai/stream",
    tag = "AI",
    request_body = GenerationRequest,
    responses(
        (status = 200, description = "text/event-stream: vários `chunk`, depois `done` ou `error`", body = String, content_type = "text/event-stream")
    ),
    security(("api_jwt" = []))
)]
pub async fn stream_content(
    State(app_state): State<AppState>,
    Valid(request): Valid<GenerationRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Se o cliente desconectar, o stream é descartado e a leitura remota para junto
    let chunks = app_state
        .ai_service
        .stream_content(request, app_state.request_token());

    let events = async_stream::stream! {
        let mut chunks = std::pin::pin!(chunks);
        while let Some(item) = chunks.next().await {
            match item {
                Ok(text) => yield Ok::<Event, Infallible>(chunk_event(text)),
                Err(e) => {
                    tracing::warn!("Streaming de IA interrompido: {}", e);
                    yield Ok(error_event(&e.to_string()));
                    return;
                }
            }
        }
        yield Ok(Event::default().event("done").data("[DONE]"));
    };

    Sse::new(events).keep_alive(KeepAlive::default())
}

// POST /api/ai/ask
#[utoipa::path(
    post,
    path = "/api/ai/ask",
    tag = "AI",
    request_body = QuestionPayload,
    responses(
        (status = 200, description = "Resposta do assistente; falhas remotas vêm com success = false", body = QueryResponse),
        (status = 400, description = "Pergunta ou filtros inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn ask_question(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Valid(question): Valid<QuestionPayload>,
) -> Json<QueryResponse> {
    Json(
        app_state
            .assistant_service
            .ask(caller.id, &question, &app_state.request_token())
            .await,
    )
}

// POST /api/ai/analyze-car
#[utoipa::path(
    post,
    path = "/api/ai/analyze-car",
    tag = "AI",
    request_body = CarPhotoAnalysisInput,
    responses(
        (status = 200, description = "Veículo identificado, recomendação de seguro e anúncios parecidos", body = CarAnalysisResult),
        (status = 400, description = "Foto ausente, grande demais ou fora do base64"),
        (status = 502, description = "A função remota falhou ou não identificou o carro")
    ),
    security(("api_jwt" = []))
)]
pub async fn analyze_car_photo(
    State(app_state): State<AppState>,
    Valid(input): Valid<CarPhotoAnalysisInput>,
) -> Result<Json<CarAnalysisResult>, AppError> {
    let analysis = app_state
        .car_analysis_service
        .analyze_car_photo(&input, &app_state.request_token())
        .await?;
    Ok(Json(analysis))
}

fn chunk_event(text: String) -> Event {
    Event::default()
        .event("chunk")
        .json_data(StreamChunk { text })
        .unwrap_or_else(|e| error_event(&e.to_string()))
}

fn error_event(message: &str) -> Event {
    Event::default()
        .event("error")
        .data(json!({ "success": false, "error": message }).to_string())
}
