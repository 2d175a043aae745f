// src/db/claim_repo.rs

use rust_decimal::Decimal;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, map_constraint_error, page_offset},
        error::AppError,
        retry::{retry_read, ReadRetryPolicy},
    },
    models::{
        claim::{Claim, ClaimPayload, ClaimQuery, ClaimStatus},
        query::SortField,
    },
};

const CLAIM_COLUMNS: &str = r#"
    id, customer_id, policy_id, incident_date, location, description, amount, damage_type,
    documents, status, approved_amount, review_notes, created_at, updated_at, created_by,
    agent_id
"#;

fn no_unique_keys(constraint: Option<&str>) -> AppError {
    AppError::UniqueConstraintViolation(constraint.unwrap_or("claims").to_string())
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ClaimQuery) {
    qb.push(" WHERE TRUE");

    if let Some(owner) = query.created_by {
        qb.push(" AND created_by = ").push_bind(owner);
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(damage_type) = query.damage_type {
        qb.push(" AND damage_type = ").push_bind(damage_type);
    }
    if let Some(policy_id) = query.policy_id {
        qb.push(" AND policy_id = ").push_bind(policy_id);
    }
    if let Some(customer_id) = query.customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    if let Some(from) = query.incident_from {
        qb.push(" AND incident_date >= ").push_bind(from);
    }
    if let Some(to) = query.incident_to {
        qb.push(" AND incident_date <= ").push_bind(to);
    }
    if let Some(term) = query.search_term.as_deref() {
        let pattern = like_pattern(term);
        qb.push(" AND (description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR location->>'address' ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[derive(Clone)]
pub struct ClaimRepository {
    pool: PgPool,
    retry: ReadRetryPolicy,
}

impl ClaimRepository {
    pub fn new(pool: PgPool, retry: ReadRetryPolicy) -> Self {
        Self { pool, retry }
    }

    /// Todo sinistro nasce `Submitted`.
    pub async fn create(&self, payload: &ClaimPayload, created_by: Uuid) -> Result<Claim, AppError> {
        let sql = format!(
            r#"
            INSERT INTO claims (
                customer_id, policy_id, incident_date, location, description, amount,
                damage_type, documents, status, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'Submitted', $9)
            RETURNING {CLAIM_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Claim>(&sql)
            .bind(payload.customer_id)
            .bind(payload.policy_id)
            .bind(payload.incident_date)
            .bind(Json(&payload.location))
            .bind(&payload.description)
            .bind(payload.amount)
            .bind(payload.damage_type)
            .bind(&payload.documents)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, no_unique_keys, "Apólice ou cliente"))
    }

    pub async fn find_by_id(&self, id: Uuid, owner: Option<Uuid>) -> Result<Claim, AppError> {
        let sql = format!(
            r#"
            SELECT {CLAIM_COLUMNS} FROM claims
            WHERE id = $1 AND ($2::uuid IS NULL OR created_by = $2)
            "#
        );
        retry_read(&self.retry, "claims.find_by_id", || async {
            sqlx::query_as::<_, Claim>(&sql)
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(AppError::NotFound("Sinistro"))
        })
        .await
    }

    /// Edição só enquanto o sinistro está `Submitted`; `None` quando já saiu desse estado.
    pub async fn update_submitted(
        &self,
        id: Uuid,
        owner: Option<Uuid>,
        payload: &ClaimPayload,
    ) -> Result<Option<Claim>, AppError> {
        let sql = format!(
            r#"
            UPDATE claims SET
                customer_id = $3, policy_id = $4, incident_date = $5, location = $6,
                description = $7, amount = $8, damage_type = $9, documents = $10,
                updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR created_by = $2) AND status = 'Submitted'
            RETURNING {CLAIM_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Claim>(&sql)
            .bind(id)
            .bind(owner)
            .bind(payload.customer_id)
            .bind(payload.policy_id)
            .bind(payload.incident_date)
            .bind(Json(&payload.location))
            .bind(&payload.description)
            .bind(payload.amount)
            .bind(payload.damage_type)
            .bind(&payload.documents)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, no_unique_keys, "Apólice ou cliente"))
    }

    /// Grava a decisão. `expected` protege contra outra análise no meio do caminho.
    pub async fn apply_review(
        &self,
        id: Uuid,
        expected: ClaimStatus,
        status: ClaimStatus,
        approved_amount: Option<Decimal>,
        review_notes: Option<&str>,
        reviewer: Uuid,
    ) -> Result<Option<Claim>, AppError> {
        let sql = format!(
            r#"
            UPDATE claims SET
                status = $3,
                approved_amount = COALESCE($4, approved_amount),
                review_notes = COALESCE($5, review_notes),
                agent_id = $6,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {CLAIM_COLUMNS}
            "#
        );

        Ok(sqlx::query_as::<_, Claim>(&sql)
            .bind(id)
            .bind(expected)
            .bind(status)
            .bind(approved_amount)
            .bind(review_notes)
            .bind(reviewer)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Acrescenta a URL se ainda não estiver na lista.
    pub async fn add_document(
        &self,
        id: Uuid,
        owner: Option<Uuid>,
        url: &str,
    ) -> Result<Claim, AppError> {
        let sql = format!(
            r#"
            UPDATE claims SET
                documents = CASE WHEN $3 = ANY(documents) THEN documents
                                 ELSE array_append(documents, $3) END,
                updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR created_by = $2)
            RETURNING {CLAIM_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Claim>(&sql)
            .bind(id)
            .bind(owner)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Sinistro"))
    }

    pub async fn remove_document(
        &self,
        id: Uuid,
        owner: Option<Uuid>,
        url: &str,
    ) -> Result<Claim, AppError> {
        let sql = format!(
            r#"
            UPDATE claims SET documents = array_remove(documents, $3), updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR created_by = $2)
            RETURNING {CLAIM_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Claim>(&sql)
            .bind(id)
            .bind(owner)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Sinistro"))
    }

    pub async fn list(&self, query: &ClaimQuery) -> Result<(Vec<Claim>, i64), AppError> {
        let (column, direction) = match query.sort_by {
            Some(field) => (field.column(), query.sort_order.as_sql()),
            None => ("created_at", "DESC"),
        };
        let offset = page_offset(query.page, query.page_size);

        retry_read(&self.retry, "claims.list", || async {
            let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM claims");
            push_filters(&mut count, query);
            let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

            let mut select =
                QueryBuilder::<Postgres>::new(format!("SELECT {CLAIM_COLUMNS} FROM claims"));
            push_filters(&mut select, query);
            select
                .push(format!(" ORDER BY {column} {direction}, id {direction} LIMIT "))
                .push_bind(query.page_size)
                .push(" OFFSET ")
                .push_bind(offset);

            let items = select
                .build_query_as::<Claim>()
                .fetch_all(&self.pool)
                .await?;
            Ok((items, total))
        })
        .await
    }
}
