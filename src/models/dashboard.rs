// src/models/dashboard.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::format::{days_until_expiry, format_currency};

/// Janela de "apólices a vencer".
pub const EXPIRING_WINDOW_DAYS: i32 = 30;

// Linha única devolvida pela consulta agregada
#[derive(Debug, FromRow)]
pub struct SummaryRow {
    pub total_customers: i64,
    pub active_policies: i64,
    pub expiring_policies: i64,
    pub open_claims: i64,
    pub active_premium_total: Option<Decimal>,
}

// Os cards do topo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_customers: i64,
    pub active_policies: i64,
    /// Apólices ativas que terminam nos próximos 30 dias
    pub expiring_policies: i64,
    /// Sinistros em `Submitted` ou `UnderReview`
    pub open_claims: i64,
    #[schema(value_type = f64)]
    pub active_premium_total: Decimal,
    pub active_premium_total_display: String,
    /// As próximas a vencer, da mais urgente para a menos
    pub expiring_soon: Vec<ExpiringPolicy>,
}

#[derive(Debug, FromRow)]
pub struct ExpiringRow {
    pub id: Uuid,
    pub policy_number: String,
    pub customer_id: Uuid,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringPolicy {
    pub id: Uuid,
    pub policy_number: String,
    pub customer_id: Uuid,
    #[schema(value_type = String, format = Date)]
    pub end_date: NaiveDate,
    pub days_until_expiry: i64,
}

impl ExpiringPolicy {
    pub fn from_row(row: ExpiringRow, today: NaiveDate) -> Self {
        Self {
            days_until_expiry: days_until_expiry(row.end_date, today),
            id: row.id,
            policy_number: row.policy_number,
            customer_id: row.customer_id,
            end_date: row.end_date,
        }
    }
}

impl DashboardSummary {
    pub fn build(row: SummaryRow, expiring_soon: Vec<ExpiringPolicy>) -> Self {
        let premium_total = row.active_premium_total.unwrap_or(Decimal::ZERO);
        Self {
            total_customers: row.total_customers,
            active_policies: row.active_policies,
            expiring_policies: row.expiring_policies,
            open_claims: row.open_claims,
            active_premium_total: premium_total,
            active_premium_total_display: format_currency(Some(premium_total)),
            expiring_soon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_premium_sum_reads_as_zero() {
        let summary = DashboardSummary::build(
            SummaryRow {
                total_customers: 0,
                active_policies: 0,
                expiring_policies: 0,
                open_claims: 0,
                active_premium_total: None,
            },
            vec![],
        );
        assert_eq!(summary.active_premium_total, Decimal::ZERO);
        assert_eq!(summary.active_premium_total_display, "K0.00");
    }

    #[test]
    fn expiring_policy_counts_days_left() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let policy = ExpiringPolicy::from_row(
            ExpiringRow {
                id: Uuid::new_v4(),
                policy_number: "POL-1-ABCDE".into(),
                customer_id: Uuid::new_v4(),
                end_date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            },
            today,
        );
        assert_eq!(policy.days_until_expiry, 14);
    }
}
