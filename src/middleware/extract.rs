// src/middleware/extract.rs

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::{
    common::error::{field_error, AppError},
    models::Schema,
};

/// Corpo JSON já normalizado e validado pelo `Schema` do tipo.
/// Campos com formato errado ou enums desconhecidos também viram 400 com `details`.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Schema,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| field_error("body", "invalid_body", rejection.body_text()))?;
        Ok(Valid(payload.validated()?))
    }
}

/// Query string dos filtros de listagem.
pub struct Filters<T>(pub T);

impl<S, T> FromRequestParts<S> for Filters<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(filters) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| field_error("query", "invalid_query", rejection.body_text()))?;
        Ok(Filters(filters))
    }
}
