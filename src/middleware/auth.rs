// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    extract::cookie::{Cookie, CookieJar, SameSite},
    headers::{authorization::Bearer, Authorization, HeaderMapExt},
};

use crate::{
    common::error::AppError, config::AppState, models::auth::SessionUser,
    services::auth::AuthService,
};

pub const SESSION_COOKIE: &str = "session";

/// Quem pode chegar a uma rota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Admin,
}

const PUBLIC_PATHS: &[&str] = &["/api/health", "/api/auth/login", "/api/auth/signup"];
const PUBLIC_PREFIXES: &[&str] = &["/api/auth/forgot-password", "/swagger-ui", "/api-docs"];

pub fn access_for(path: &str) -> Access {
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    if PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| under(path, p)) {
        Access::Public
    } else if under(path, "/api/admin") {
        Access::Admin
    } else {
        Access::Authenticated
    }
}

// `/api/admin` e `/api/admin/...`, mas não `/api/administrator`
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Guarda único da aplicação: classifica o caminho, lê a sessão do cookie
/// `session` (ou do header Bearer) e coloca o `SessionUser` nas extensions.
pub async fn session_guard(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let access = access_for(request.uri().path());
    if access == Access::Public {
        return Ok(next.run(request).await);
    }

    let cookie = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_owned());
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_owned());

    let user = authenticate(&app_state.auth_service, [cookie, bearer])?;
    if access == Access::Admin && !user.is_admin() {
        tracing::warn!(user_id = %user.id, path = %request.uri().path(), "Acesso de admin negado");
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Primeira credencial válida, na ordem dada. Um cookie vencido não esconde
/// um Bearer válido.
fn authenticate<const N: usize>(
    auth_service: &AuthService,
    candidates: [Option<String>; N],
) -> Result<SessionUser, AppError> {
    let mut outcome = Err(AppError::InvalidToken);
    for token in candidates.into_iter().flatten() {
        outcome = auth_service.validate_session(&token);
        if outcome.is_ok() {
            break;
        }
    }
    outcome
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub SessionUser);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionUser>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}
