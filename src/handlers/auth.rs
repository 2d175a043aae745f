// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::{expired_session_cookie, session_cookie, AuthenticatedUser},
        extract::Valid,
    },
    models::auth::{
        AuthResponse, ForgotPasswordPayload, MessageResponse, ResetPasswordPayload, SignInPayload,
        SignUpPayload, User,
    },
};

// POST /api/auth/signup
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignUpPayload,
    responses(
        (status = 201, description = "Conta criada; a sessão já vem no cookie", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn sign_up(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Valid(payload): Valid<SignUpPayload>,
) -> Result<impl IntoResponse, AppError> {
    let response = app_state.auth_service.sign_up(payload).await?;
    let jar = jar.add(session_cookie(response.token.clone()));
    Ok((StatusCode::CREATED, jar, Json(response)))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = SignInPayload,
    responses(
        (status = 200, description = "Sessão aberta", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn sign_in(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Valid(payload): Valid<SignInPayload>,
) -> Result<impl IntoResponse, AppError> {
    let response = app_state.auth_service.sign_in(payload).await?;
    let jar = jar.add(session_cookie(response.token.clone()));
    Ok((jar, Json(response)))
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 204, description = "Cookie de sessão removido")),
    security(("api_jwt" = []))
)]
pub async fn sign_out(jar: CookieJar) -> impl IntoResponse {
    (StatusCode::NO_CONTENT, jar.remove(expired_session_cookie()))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário da sessão atual", body = User),
        (status = 401, description = "Sem sessão")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<User>, AppError> {
    Ok(Json(app_state.user_service.get_user(caller.id).await?))
}

// POST /api/auth/forgot-password
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordPayload,
    responses((status = 202, description = "Pedido aceito", body = MessageResponse))
)]
pub async fn forgot_password(
    State(app_state): State<AppState>,
    Valid(payload): Valid<ForgotPasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .auth_service
        .request_password_reset(&payload.email)
        .await?;

    let body = MessageResponse {
        message: "Se o e-mail existir, as instruções de redefinição foram enviadas.".into(),
    };
    Ok((StatusCode::ACCEPTED, Json(body)))
}

// POST /api/auth/forgot-password/reset
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password/reset",
    tag = "Auth",
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Senha redefinida", body = MessageResponse),
        (status = 401, description = "Token inválido ou expirado")
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    Valid(payload): Valid<ResetPasswordPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state
        .auth_service
        .reset_password(&payload.token, payload.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Senha redefinida com sucesso.".into(),
    }))
}
