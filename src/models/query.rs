// src/models/query.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Campo de ordenação de uma entidade: o nome público (camelCase) e a coluna.
/// Só existem os campos da tabela `FIELDS`; o resto é erro do chamador.
pub trait SortField: Copy + 'static {
    const ENTITY: &'static str;
    const FIELDS: &'static [(&'static str, Self)];

    fn column(self) -> &'static str;

    fn parse(raw: &str) -> Result<Self, AppError> {
        Self::FIELDS
            .iter()
            .find(|(name, _)| *name == raw)
            .map(|(_, field)| *field)
            .ok_or_else(|| AppError::InvalidSortField(format!("{}.{}", Self::ENTITY, raw)))
    }

    /// `None` quando o filtro não pede ordenação.
    fn parse_optional(raw: Option<&str>) -> Result<Option<Self>, AppError> {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::parse)
            .transpose()
    }
}
