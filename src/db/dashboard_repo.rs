// src/db/dashboard_repo.rs

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        retry::{retry_read, ReadRetryPolicy},
    },
    models::dashboard::{ExpiringRow, SummaryRow, EXPIRING_WINDOW_DAYS},
};

const EXPIRING_LIST_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
    retry: ReadRetryPolicy,
}

impl DashboardRepository {
    pub fn new(pool: PgPool, retry: ReadRetryPolicy) -> Self {
        Self { pool, retry }
    }

    // Resumo geral. `owner = None` (admin) soma a carteira inteira.
    pub async fn get_summary(
        &self,
        owner: Option<Uuid>,
        today: NaiveDate,
    ) -> Result<(SummaryRow, Vec<ExpiringRow>), AppError> {
        retry_read(&self.retry, "dashboard.summary", || async {
            // Transação só de leitura: todos os cards saem do mesmo snapshot
            let mut tx = self.pool.begin().await?;
            sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
                .execute(&mut *tx)
                .await?;

            let row = sqlx::query_as::<_, SummaryRow>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM customers
                      WHERE ($1::uuid IS NULL OR created_by = $1)) AS total_customers,
                    (SELECT COUNT(*) FROM policies
                      WHERE status = 'active'
                        AND ($1::uuid IS NULL OR created_by = $1)) AS active_policies,
                    (SELECT COUNT(*) FROM policies
                      WHERE status = 'active'
                        AND end_date BETWEEN $2 AND $2 + $3::int
                        AND ($1::uuid IS NULL OR created_by = $1)) AS expiring_policies,
                    (SELECT COUNT(*) FROM claims
                      WHERE status IN ('Submitted', 'UnderReview')
                        AND ($1::uuid IS NULL OR created_by = $1)) AS open_claims,
                    (SELECT SUM((premium->>'amount')::numeric) FROM policies
                      WHERE status = 'active'
                        AND ($1::uuid IS NULL OR created_by = $1)) AS active_premium_total
                "#,
            )
            .bind(owner)
            .bind(today)
            .bind(EXPIRING_WINDOW_DAYS)
            .fetch_one(&mut *tx)
            .await?;

            let expiring = sqlx::query_as::<_, ExpiringRow>(
                r#"
                SELECT id, policy_number, customer_id, end_date
                FROM policies
                WHERE status = 'active'
                  AND end_date BETWEEN $2 AND $2 + $3::int
                  AND ($1::uuid IS NULL OR created_by = $1)
                ORDER BY end_date ASC, id
                LIMIT $4
                "#,
            )
            .bind(owner)
            .bind(today)
            .bind(EXPIRING_WINDOW_DAYS)
            .bind(EXPIRING_LIST_LIMIT)
            .fetch_all(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok((row, expiring))
        })
        .await
    }
}
