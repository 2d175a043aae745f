// src/models/auth.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    models::{
        customer::Address,
        rules::{trim_in_place, trim_option},
        Schema,
    },
};

// --- PAPÉIS ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Agent,
    Customer,
}

/// Nomes aceitos na entrada. `staff` é o nome antigo de `agent`.
const ROLE_MAPPING: &[(&str, UserRole)] = &[
    ("admin", UserRole::Admin),
    ("agent", UserRole::Agent),
    ("customer", UserRole::Customer),
    ("staff", UserRole::Agent),
];

#[derive(Debug, thiserror::Error)]
#[error("Papel desconhecido: '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        ROLE_MAPPING
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, role)| *role)
            .ok_or_else(|| UnknownRole(raw.to_string()))
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserRole::Admin => "admin",
            UserRole::Agent => "agent",
            UserRole::Customer => "customer",
        };
        f.write_str(name)
    }
}

// --- USUÁRIO ---

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub display_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub department: Option<String>,
    pub employee_id: Option<String>,
    pub insurance_company: Option<String>,
    pub bio: Option<String>,
    #[schema(value_type = Option<Address>)]
    pub address: Option<Json<Address>>,
    pub profile_completed: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(length(min = 1, message = "O nome de exibição é obrigatório."))]
    pub display_name: String,
}

impl Schema for SignUpPayload {
    fn validated(mut self) -> Result<Self, AppError> {
        self.email = self.email.trim().to_lowercase();
        trim_in_place(&mut self.display_name);
        self.validate()?;
        Ok(self)
    }
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignInPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

impl Schema for SignInPayload {
    fn validated(mut self) -> Result<Self, AppError> {
        self.email = self.email.trim().to_lowercase();
        self.validate()?;
        Ok(self)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
}

impl Schema for ForgotPasswordPayload {
    fn validated(mut self) -> Result<Self, AppError> {
        self.email = self.email.trim().to_lowercase();
        self.validate()?;
        Ok(self)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    #[validate(length(min = 1, message = "O token é obrigatório."))]
    pub token: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub new_password: String,
}

impl Schema for ResetPasswordPayload {
    fn validated(self) -> Result<Self, AppError> {
        self.validate()?;
        Ok(self)
    }
}

/// Campos ausentes ficam como estão.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, message = "O nome de exibição não pode ficar vazio."))]
    pub display_name: Option<String>,
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres."))]
    pub first_name: Option<String>,
    #[validate(length(min = 2, message = "O apelido deve ter no mínimo 2 caracteres."))]
    pub last_name: Option<String>,
    #[validate(length(min = 10, message = "O telefone deve ter no mínimo 10 caracteres."))]
    pub phone: Option<String>,
    pub department: Option<String>,
    pub employee_id: Option<String>,
    pub insurance_company: Option<String>,
    pub bio: Option<String>,
    #[validate(nested)]
    pub address: Option<Address>,
}

impl Schema for UpdateProfilePayload {
    fn validated(mut self) -> Result<Self, AppError> {
        for field in [
            &mut self.display_name,
            &mut self.first_name,
            &mut self.last_name,
            &mut self.phone,
            &mut self.department,
            &mut self.employee_id,
            &mut self.insurance_company,
            &mut self.bio,
        ] {
            trim_option(field);
        }
        if let Some(address) = self.address.as_mut() {
            address.normalize();
        }
        self.validate()?;
        Ok(self)
    }
}

/// O perfil está completo quando nome, apelido e telefone existem depois da edição.
pub fn profile_is_complete(user: &User) -> bool {
    [&user.first_name, &user.last_name, &user.phone]
        .iter()
        .all(|field| field.as_deref().is_some_and(|v| !v.is_empty()))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRolePayload {
    pub role: UserRole,
}

impl Schema for UpdateRolePayload {
    fn validated(self) -> Result<Self, AppError> {
        Ok(self)
    }
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// --- TOKEN ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Session,
    PasswordReset,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub purpose: TokenPurpose,
    /// Só nos tokens de redefinição: `updated_at` do usuário (micros) no momento da emissão.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp: Option<i64>,
    pub exp: usize,
    pub iat: usize,
}

/// Quem está chamando, como o guarda de sessão enxerga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Filtro de dono para listagens: admins veem tudo.
    pub fn owner_scope(&self) -> Option<Uuid> {
        if self.is_admin() { None } else { Some(self.id) }
    }
}

impl From<SessionClaims> for SessionUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            display_name: claims.name,
            role: claims.role,
        }
    }
}
