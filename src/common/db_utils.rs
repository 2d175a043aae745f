// src/common/db_utils.rs

use crate::common::error::AppError;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

pub fn clamp_page_size(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE)
}

/// Páginas começam em 1.
pub fn page_offset(page: Option<i64>, page_size: i64) -> i64 {
    (page.unwrap_or(1).max(1) - 1).saturating_mul(page_size)
}

/// Monta o padrão do ILIKE escapando os curingas do próprio termo.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Traduz violações de unicidade e de chave estrangeira em erros de domínio.
/// O resto vira `DatabaseError`.
pub fn map_constraint_error(
    err: sqlx::Error,
    on_unique: impl FnOnce(Option<&str>) -> AppError,
    missing_reference: &'static str,
) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return on_unique(db_err.constraint());
        }
        if db_err.is_foreign_key_violation() {
            return AppError::NotFound(missing_reference);
        }
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_defaults_and_is_clamped() {
        assert_eq!(clamp_page_size(None), 10);
        assert_eq!(clamp_page_size(Some(0)), 1);
        assert_eq!(clamp_page_size(Some(5_000)), 100);
    }

    #[test]
    fn offset_starts_at_first_page() {
        assert_eq!(page_offset(None, 10), 0);
        assert_eq!(page_offset(Some(0), 10), 0);
        assert_eq!(page_offset(Some(3), 10), 20);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" toyota "), "%toyota%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
