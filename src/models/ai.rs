// src/models/ai.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{common::error::AppError, models::Schema};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[validate(length(min = 1, message = "O prompt é obrigatório."))]
    #[schema(example = "Resuma as coberturas da apólice POL-LX3K2J9A-7QZ1B.")]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 65535, message = "maxTokens deve estar entre 1 e 65535."))]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 2.0, message = "temperature deve estar entre 0 e 2."))]
    pub temperature: Option<f32>,
}

impl Schema for GenerationRequest {
    fn validated(mut self) -> Result<Self, AppError> {
        self.prompt = self.prompt.trim().to_string();
        self.validate()?;
        Ok(self)
    }
}

/// Resultado normalizado da geração. Falhas viram `success: false`, nunca erro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub text: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResult {
    pub fn ok(text: String) -> Self {
        Self {
            text,
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        let message = error.to_string();
        Self {
            text: String::new(),
            success: false,
            error: Some(if message.is_empty() {
                "Falha desconhecida na geração de conteúdo.".to_string()
            } else {
                message
            }),
        }
    }
}

/// Uma linha do NDJSON de `generateAIContentStream`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StreamChunk {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_always_carry_a_message() {
        let failed = GenerationResult::failed("");
        assert!(!failed.success);
        assert!(failed.text.is_empty());
        assert!(!failed.error.unwrap().is_empty());
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let request = GenerationRequest {
            prompt: "   ".into(),
            max_tokens: None,
            temperature: Some(0.7),
        };
        assert!(request.validated().is_err());
    }
}
