// src/db/policy_repo.rs

use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, map_constraint_error, page_offset},
        error::AppError,
        retry::{retry_read, ReadRetryPolicy},
    },
    models::{
        policy::{Policy, PolicyPayload, PolicyQuery, PolicyStatus},
        query::SortField,
    },
};

const POLICY_COLUMNS: &str = r#"
    id, policy_type, status, customer_id, policy_number, vehicle, start_date, end_date,
    premium, documents, created_at, updated_at, created_by, agent_id
"#;

fn duplicate_policy(constraint: Option<&str>) -> AppError {
    match constraint {
        Some("policies_policy_number_key") => {
            AppError::UniqueConstraintViolation("Número de apólice já existe.".to_string())
        }
        other => AppError::UniqueConstraintViolation(other.unwrap_or("policies").to_string()),
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &PolicyQuery) {
    qb.push(" WHERE TRUE");

    if let Some(owner) = query.created_by {
        qb.push(" AND created_by = ").push_bind(owner);
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(policy_type) = query.policy_type {
        qb.push(" AND policy_type = ").push_bind(policy_type);
    }
    if let Some(customer_id) = query.customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    if let Some(start) = query.start_date {
        qb.push(" AND start_date >= ").push_bind(start);
    }
    if let Some(end) = query.end_date {
        qb.push(" AND end_date <= ").push_bind(end);
    }
    if let Some(term) = query.search_term.as_deref() {
        let pattern = like_pattern(term);
        qb.push(" AND (policy_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR vehicle->>'registrationNumber' ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR vehicle->>'make' ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR vehicle->>'model' ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[derive(Clone)]
pub struct PolicyRepository {
    pool: PgPool,
    retry: ReadRetryPolicy,
}

impl PolicyRepository {
    pub fn new(pool: PgPool, retry: ReadRetryPolicy) -> Self {
        Self { pool, retry }
    }

    pub async fn create(
        &self,
        payload: &PolicyPayload,
        policy_number: &str,
        created_by: Uuid,
    ) -> Result<Policy, AppError> {
        let sql = format!(
            r#"
            INSERT INTO policies (
                policy_type, status, customer_id, policy_number, vehicle,
                start_date, end_date, premium, created_by, agent_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {POLICY_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Policy>(&sql)
            .bind(payload.policy_type)
            .bind(payload.status)
            .bind(payload.customer_id)
            .bind(policy_number)
            .bind(Json(&payload.vehicle))
            .bind(payload.start_date)
            .bind(payload.end_date)
            .bind(Json(&payload.premium))
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, duplicate_policy, "Cliente"))
    }

    pub async fn find_by_id(&self, id: Uuid, owner: Option<Uuid>) -> Result<Policy, AppError> {
        let sql = format!(
            r#"
            SELECT {POLICY_COLUMNS} FROM policies
            WHERE id = $1 AND ($2::uuid IS NULL OR created_by = $2)
            "#
        );
        retry_read(&self.retry, "policies.find_by_id", || async {
            sqlx::query_as::<_, Policy>(&sql)
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(AppError::NotFound("Apólice"))
        })
        .await
    }

    /// O número da apólice só muda quando vem no payload.
    pub async fn update(
        &self,
        id: Uuid,
        owner: Option<Uuid>,
        payload: &PolicyPayload,
    ) -> Result<Policy, AppError> {
        let sql = format!(
            r#"
            UPDATE policies SET
                policy_type = $3, status = $4, customer_id = $5,
                policy_number = COALESCE($6, policy_number), vehicle = $7,
                start_date = $8, end_date = $9, premium = $10, updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR created_by = $2)
            RETURNING {POLICY_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Policy>(&sql)
            .bind(id)
            .bind(owner)
            .bind(payload.policy_type)
            .bind(payload.status)
            .bind(payload.customer_id)
            .bind(payload.policy_number.as_deref())
            .bind(Json(&payload.vehicle))
            .bind(payload.start_date)
            .bind(payload.end_date)
            .bind(Json(&payload.premium))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, duplicate_policy, "Cliente"))?
            .ok_or(AppError::NotFound("Apólice"))
    }

    pub async fn set_status(
        &self,
        id: Uuid,
        owner: Option<Uuid>,
        status: PolicyStatus,
    ) -> Result<Policy, AppError> {
        let sql = format!(
            r#"
            UPDATE policies SET status = $3, updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR created_by = $2)
            RETURNING {POLICY_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Policy>(&sql)
            .bind(id)
            .bind(owner)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Apólice"))
    }

    pub async fn list(&self, query: &PolicyQuery) -> Result<(Vec<Policy>, i64), AppError> {
        // Sem sortBy, as mais recentes primeiro
        let (column, direction) = match query.sort_by {
            Some(field) => (field.column(), query.sort_order.as_sql()),
            None => ("created_at", "DESC"),
        };
        let offset = page_offset(query.page, query.page_size);

        retry_read(&self.retry, "policies.list", || async {
            let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM policies");
            push_filters(&mut count, query);
            let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

            let mut select =
                QueryBuilder::<Postgres>::new(format!("SELECT {POLICY_COLUMNS} FROM policies"));
            push_filters(&mut select, query);
            select
                .push(format!(" ORDER BY {column} {direction}, id {direction} LIMIT "))
                .push_bind(query.page_size)
                .push(" OFFSET ")
                .push_bind(offset);

            let items = select
                .build_query_as::<Policy>()
                .fetch_all(&self.pool)
                .await?;
            Ok((items, total))
        })
        .await
    }
}
