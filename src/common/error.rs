// src/common/error.rs

use std::borrow::Cow;
use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    #[error("Campo de ordenação inválido: '{0}'")]
    InvalidSortField(String),

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Divisão por zero ao calcular percentagem")]
    DivisionByZero,

    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Registro duplicado: {0}")]
    UniqueConstraintViolation(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Falha na chamada remota: {0}")]
    RemoteCall(String),

    #[error("Operação cancelada")]
    Cancelled,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Falhas que valem uma nova tentativa numa leitura idempotente.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::DatabaseError(
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::WorkerCrashed
            )
        )
    }
}

/// Erro de validação para um único campo, fora do derive.
pub fn field_error(field: &'static str, code: &'static str, message: impl Into<String>) -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add(field, rule_error(code, message));
    AppError::ValidationError(errors)
}

pub fn rule_error(code: &'static str, message: impl Into<String>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message.into()));
    error
}

/// Achata os erros do `validator` em caminho -> mensagens.
/// Os caminhos aninhados usam '.' e saem em camelCase (ex: `vehicle.year`).
pub fn validation_details(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut details = BTreeMap::new();
    collect_details(errors, None, &mut details);
    details
}

fn collect_details(
    errors: &ValidationErrors,
    prefix: Option<&str>,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let name = to_camel_case(&field.to_string());
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name,
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors.iter().map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                });
                out.entry(path).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(inner) => collect_details(inner, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_details(inner, Some(&format!("{path}.{index}")), out);
                }
            }
        }
    }
}

fn to_camel_case(field: &str) -> String {
    if field.starts_with("__") {
        return field.to_string();
    }
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(errors) => {
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": validation_details(&errors),
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            // O contrato das funções remotas: { success: false, error }
            AppError::RemoteCall(message) => {
                tracing::warn!("Chamada remota falhou: {}", message);
                let body = Json(json!({ "success": false, "error": message }));
                return (StatusCode::BAD_GATEWAY, body).into_response();
            }
            ref e @ AppError::InvalidSortField(_) => (StatusCode::BAD_REQUEST, e.to_string()),
            ref e @ AppError::InvalidStatusTransition { .. } => {
                (StatusCode::CONFLICT, e.to_string())
            }
            ref e @ AppError::DivisionByZero => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            ref e @ AppError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string())
            }
            ref e @ AppError::UniqueConstraintViolation(_) => (StatusCode::CONFLICT, e.to_string()),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string())
            }
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Sessão inválida ou ausente.".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Você não tem permissão para realizar esta ação.".to_string(),
            ),
            AppError::Cancelled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "A operação foi cancelada.".to_string(),
            ),

            // Todos os outros erros viram 500 e são registrados com detalhe.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Inner {
        #[validate(range(min = 1900, message = "ano inválido"))]
        year: i32,
    }

    #[derive(Validate)]
    struct Outer {
        #[validate(length(min = 2, message = "curto demais"))]
        first_name: String,
        #[validate(nested)]
        vehicle: Inner,
    }

    #[test]
    fn nested_errors_are_flattened_with_camel_case_paths() {
        let value = Outer {
            first_name: "A".into(),
            vehicle: Inner { year: 1800 },
        };
        let errors = value.validate().unwrap_err();
        let details = validation_details(&errors);

        assert_eq!(details["firstName"], vec!["curto demais".to_string()]);
        assert_eq!(details["vehicle.year"], vec!["ano inválido".to_string()]);
    }

    #[test]
    fn field_error_keeps_code_and_message() {
        let AppError::ValidationError(errors) = field_error("end_date", "end_before_start", "x")
        else {
            panic!("esperava erro de validação");
        };
        let details = validation_details(&errors);
        assert_eq!(details["endDate"], vec!["x".to_string()]);
    }

    #[test]
    fn only_pool_and_io_failures_are_transient() {
        assert!(AppError::DatabaseError(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!AppError::DatabaseError(sqlx::Error::RowNotFound).is_transient());
        assert!(!AppError::NotFound("Apólice").is_transient());
    }
}
