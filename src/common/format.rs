// src/common/format.rs

use chrono::{NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::common::error::AppError;

pub const CURRENCY_CODE: &str = "ZMW";
// Símbolo do kwacha no locale en-ZM
const CURRENCY_SYMBOL: &str = "K";
pub const MISSING_AMOUNT: &str = "Not Found";

const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const POLICY_SUFFIX_LEN: u32 = 5;

/// Formata um valor em kwacha (`en-ZM` / `ZMW`) com duas casas decimais.
/// `None` vira "Not Found".
pub fn format_currency(amount: Option<Decimal>) -> String {
    let Some(amount) = amount else {
        return MISSING_AMOUNT.to_string();
    };

    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    let plain = format!("{:.2}", rounded.abs());
    let (integer, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    format!("{sign}{CURRENCY_SYMBOL}{}.{fraction}", group_thousands(integer))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `amount / total * 100` com uma casa decimal e '%' no fim.
pub fn calculate_percentage(amount: Decimal, total: Decimal) -> Result<String, AppError> {
    if total.is_zero() {
        return Err(AppError::DivisionByZero);
    }

    let share = amount
        .checked_div(total)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(|| anyhow::anyhow!("Estouro ao calcular {amount}/{total}"))?
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);

    Ok(format!("{:.1}%", share))
}

/// `POL-<timestamp base36>-<5 caracteres aleatórios base36>`, tudo em maiúsculas.
/// Serve para exibição; a unicidade fica a cargo do índice no banco.
pub fn generate_policy_number() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u128;
    policy_number_from(millis, Uuid::new_v4().as_u128())
}

fn policy_number_from(millis: u128, entropy: u128) -> String {
    let suffix_space = 36u128.pow(POLICY_SUFFIX_LEN);
    format!(
        "POL-{}-{}",
        to_base36(millis, 1),
        to_base36(entropy % suffix_space, POLICY_SUFFIX_LEN as usize)
    )
}

fn to_base36(mut value: u128, min_width: usize) -> String {
    let mut digits = Vec::new();
    loop {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
        if value == 0 {
            break;
        }
    }
    while digits.len() < min_width {
        digits.push(b'0');
    }
    digits.iter().rev().map(|&d| d as char).collect()
}

/// Dias que faltam até o fim da vigência (negativo se já expirou).
pub fn days_until_expiry(end_date: NaiveDate, today: NaiveDate) -> i64 {
    (end_date - today).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches_policy_pattern(value: &str) -> bool {
        let Some(rest) = value.strip_prefix("POL-") else {
            return false;
        };
        let Some((timestamp, suffix)) = rest.split_once('-') else {
            return false;
        };
        let base36 = |s: &str| s.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase());
        !timestamp.is_empty() && base36(timestamp) && suffix.len() == 5 && base36(suffix)
    }

    #[test]
    fn missing_amount_is_not_found() {
        assert_eq!(format_currency(None), "Not Found");
    }

    #[test]
    fn currency_uses_kwacha_symbol_grouping_and_two_decimals() {
        assert_eq!(format_currency(Some(Decimal::new(12345, 1))), "K1,234.50");
        assert_eq!(format_currency(Some(Decimal::new(5, 0))), "K5.00");
        assert_eq!(format_currency(Some(Decimal::new(123456789, 2))), "K1,234,567.89");
        assert_eq!(format_currency(Some(Decimal::new(-2505, 3))), "-K2.51");
        assert_eq!(format_currency(Some(Decimal::ZERO)), "K0.00");
    }

    #[test]
    fn percentage_has_one_decimal() {
        assert_eq!(
            calculate_percentage(Decimal::new(25, 0), Decimal::new(100, 0)).unwrap(),
            "25.0%"
        );
        assert_eq!(
            calculate_percentage(Decimal::new(1, 0), Decimal::new(3, 0)).unwrap(),
            "33.3%"
        );
    }

    #[test]
    fn percentage_of_zero_total_is_an_error() {
        assert!(matches!(
            calculate_percentage(Decimal::ONE, Decimal::ZERO),
            Err(AppError::DivisionByZero)
        ));
    }

    #[test]
    fn policy_numbers_follow_the_pattern() {
        for _ in 0..50 {
            let number = generate_policy_number();
            assert!(matches_policy_pattern(&number), "{number}");
        }
    }

    #[test]
    fn policy_number_encodes_timestamp_and_pads_suffix() {
        assert_eq!(policy_number_from(35, 0), "POL-Z-00000");
        assert_eq!(policy_number_from(36, 37), "POL-10-00011");
    }

    #[test]
    fn later_timestamps_sort_after_earlier_ones() {
        let earlier = policy_number_from(1_700_000_000_000, 1);
        let later = policy_number_from(1_700_000_000_001, 1);
        assert_ne!(earlier, later);
        assert!(later > earlier);
    }

    #[test]
    fn two_generated_numbers_differ() {
        assert_ne!(generate_policy_number(), generate_policy_number());
    }

    #[test]
    fn expiry_counts_whole_days() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(days_until_expiry(end, today), 30);
        assert_eq!(days_until_expiry(today, end), -30);
    }
}
