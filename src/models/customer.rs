// src/models/customer.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    models::{
        query::{SortField, SortOrder},
        rules::trim_in_place,
        Schema,
    },
};

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "customer_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

// --- ENDEREÇO (também usado no perfil do usuário) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[validate(length(min = 1, message = "A rua é obrigatória."))]
    #[schema(example = "Plot 12, Cairo Road")]
    pub street: String,
    #[validate(length(min = 1, message = "A cidade é obrigatória."))]
    #[schema(example = "Lusaka")]
    pub city: String,
    #[validate(length(min = 1, message = "A província é obrigatória."))]
    #[schema(example = "Lusaka")]
    pub province: String,
    #[validate(length(min = 1, message = "O código postal é obrigatório."))]
    #[schema(example = "10101")]
    pub postal_code: String,
}

impl Address {
    pub fn normalize(&mut self) {
        trim_in_place(&mut self.street);
        trim_in_place(&mut self.city);
        trim_in_place(&mut self.province);
        trim_in_place(&mut self.postal_code);
    }
}

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(example = "Chanda")]
    pub first_name: String,
    #[schema(example = "Mwale")]
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[schema(example = "123456/10/1")]
    pub nrc_passport: String,
    #[schema(value_type = String, format = Date, example = "1988-04-12")]
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub occupation: String,
    pub status: CustomerStatus,
    #[schema(value_type = Address)]
    pub address: Json<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub agent_id: Uuid,
}

// Criação e edição usam o mesmo formulário
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres."))]
    pub first_name: String,

    #[validate(length(min = 2, message = "O apelido deve ter no mínimo 2 caracteres."))]
    pub last_name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[validate(length(min = 10, message = "O telefone deve ter no mínimo 10 caracteres."))]
    #[schema(example = "+260971234567")]
    pub phone: String,

    #[validate(length(min = 6, message = "O NRC/Passaporte deve ter no mínimo 6 caracteres."))]
    pub nrc_passport: String,

    #[schema(value_type = String, format = Date, example = "1988-04-12")]
    pub date_of_birth: NaiveDate,

    pub gender: Gender,

    #[validate(length(min = 1, message = "A ocupação é obrigatória."))]
    pub occupation: String,

    #[serde(default)]
    pub status: CustomerStatus,

    #[validate(nested)]
    pub address: Address,
}

impl Schema for CustomerPayload {
    fn validated(mut self) -> Result<Self, AppError> {
        trim_in_place(&mut self.first_name);
        trim_in_place(&mut self.last_name);
        trim_in_place(&mut self.phone);
        trim_in_place(&mut self.nrc_passport);
        trim_in_place(&mut self.occupation);
        self.email = self.email.trim().to_lowercase();
        self.address.normalize();

        self.validate()?;
        Ok(self)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStatusPayload {
    pub status: CustomerStatus,
}

impl Schema for CustomerStatusPayload {
    fn validated(self) -> Result<Self, AppError> {
        Ok(self)
    }
}

// --- LISTAGEM ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerSortField {
    FirstName,
    LastName,
    Email,
    Phone,
    NrcPassport,
    DateOfBirth,
    Gender,
    Occupation,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl SortField for CustomerSortField {
    const ENTITY: &'static str = "customer";
    const FIELDS: &'static [(&'static str, Self)] = &[
        ("firstName", Self::FirstName),
        ("lastName", Self::LastName),
        ("email", Self::Email),
        ("phone", Self::Phone),
        ("nrcPassport", Self::NrcPassport),
        ("dateOfBirth", Self::DateOfBirth),
        ("gender", Self::Gender),
        ("occupation", Self::Occupation),
        ("status", Self::Status),
        ("createdAt", Self::CreatedAt),
        ("updatedAt", Self::UpdatedAt),
    ];

    fn column(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::NrcPassport => "nrc_passport",
            Self::DateOfBirth => "date_of_birth",
            Self::Gender => "gender",
            Self::Occupation => "occupation",
            Self::Status => "status",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CustomerFilters {
    /// Procura em nome, apelido, e-mail e NRC/Passaporte
    pub search_term: Option<String>,
    pub status: Option<CustomerStatus>,
    /// Campo do cliente (padrão: firstName)
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub page_size: Option<i64>,
    /// Valor de `lastDoc` da página anterior
    pub cursor: Option<String>,
}

/// Filtros já interpretados, prontos para o repositório.
#[derive(Debug, Clone)]
pub struct CustomerQuery {
    pub search_term: Option<String>,
    pub status: Option<CustomerStatus>,
    pub sort_by: CustomerSortField,
    pub sort_order: SortOrder,
    pub page_size: i64,
    pub cursor: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListResponse {
    pub customers: Vec<Customer>,
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_doc: Option<String>,
}
