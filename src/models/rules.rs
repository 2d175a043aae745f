// src/models/rules.rs
//
// Regras de validação reaproveitadas pelos payloads (`#[validate(custom(...))]`).

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use validator::{ValidateUrl, ValidationError};

use crate::common::error::rule_error;

pub const MIN_VEHICLE_YEAR: i32 = 1900;

pub fn max_vehicle_year() -> i32 {
    Utc::now().year() + 1
}

pub fn vehicle_year(year: i32) -> Result<(), ValidationError> {
    if year < MIN_VEHICLE_YEAR {
        return Err(rule_error("year_range", "O ano deve ser a partir de 1900."));
    }
    if year > max_vehicle_year() {
        return Err(rule_error("year_range", "O ano não pode estar no futuro."));
    }
    Ok(())
}

pub fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(rule_error("must_be_positive", "O valor deve ser maior que 0."));
    }
    Ok(())
}

pub fn document_urls(urls: &Vec<String>) -> Result<(), ValidationError> {
    if urls.iter().all(|url| url.validate_url()) {
        Ok(())
    } else {
        Err(rule_error("invalid_url", "Todos os documentos devem ser URLs válidas."))
    }
}

pub fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

pub fn trim_option(value: &mut Option<String>) {
    if let Some(inner) = value {
        trim_in_place(inner);
        if inner.is_empty() {
            *value = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_year_bounds() {
        assert!(vehicle_year(1899).is_err());
        assert!(vehicle_year(1900).is_ok());
        assert!(vehicle_year(max_vehicle_year()).is_ok());
        assert!(vehicle_year(max_vehicle_year() + 1).is_err());
    }

    #[test]
    fn amounts_must_be_strictly_positive() {
        assert!(positive_amount(&Decimal::ZERO).is_err());
        assert!(positive_amount(&Decimal::new(-1, 0)).is_err());
        assert!(positive_amount(&Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn trimming_drops_blank_options() {
        let mut value = Some("   ".to_string());
        trim_option(&mut value);
        assert_eq!(value, None);

        let mut name = "  Mwila ".to_string();
        trim_in_place(&mut name);
        assert_eq!(name, "Mwila");
    }
}
