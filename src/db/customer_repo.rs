// src/db/customer_repo.rs

use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, map_constraint_error},
        error::AppError,
        retry::{retry_read, ReadRetryPolicy},
    },
    models::{
        customer::{Customer, CustomerPayload, CustomerQuery, CustomerStatus},
        query::{SortField, SortOrder},
    },
};

const CUSTOMER_COLUMNS: &str = r#"
    id, first_name, last_name, email, phone, nrc_passport, date_of_birth, gender,
    occupation, status, address, created_at, updated_at, created_by, agent_id
"#;

fn duplicate_customer(constraint: Option<&str>) -> AppError {
    match constraint {
        Some("customers_nrc_passport_key") => {
            AppError::UniqueConstraintViolation("NRC/Passaporte já cadastrado.".to_string())
        }
        other => AppError::UniqueConstraintViolation(other.unwrap_or("customers").to_string()),
    }
}

// Filtros comuns ao COUNT e ao SELECT
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &CustomerQuery) {
    qb.push(" WHERE TRUE");

    if let Some(owner) = query.created_by {
        qb.push(" AND created_by = ").push_bind(owner);
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(term) = query.search_term.as_deref() {
        let pattern = like_pattern(term);
        qb.push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR nrc_passport ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
    retry: ReadRetryPolicy,
}

impl CustomerRepository {
    pub fn new(pool: PgPool, retry: ReadRetryPolicy) -> Self {
        Self { pool, retry }
    }

    pub async fn create(
        &self,
        payload: &CustomerPayload,
        created_by: Uuid,
    ) -> Result<Customer, AppError> {
        let sql = format!(
            r#"
            INSERT INTO customers (
                first_name, last_name, email, phone, nrc_passport, date_of_birth,
                gender, occupation, status, address, created_by, agent_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(&payload.first_name)
            .bind(&payload.last_name)
            .bind(&payload.email)
            .bind(&payload.phone)
            .bind(&payload.nrc_passport)
            .bind(payload.date_of_birth)
            .bind(payload.gender)
            .bind(&payload.occupation)
            .bind(payload.status)
            .bind(Json(&payload.address))
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, duplicate_customer, "Usuário"))
    }

    /// `owner = None` (admin) enxerga qualquer cliente.
    pub async fn find_by_id(&self, id: Uuid, owner: Option<Uuid>) -> Result<Customer, AppError> {
        let sql = format!(
            r#"
            SELECT {CUSTOMER_COLUMNS} FROM customers
            WHERE id = $1 AND ($2::uuid IS NULL OR created_by = $2)
            "#
        );
        retry_read(&self.retry, "customers.find_by_id", || async {
            sqlx::query_as::<_, Customer>(&sql)
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(AppError::NotFound("Cliente"))
        })
        .await
    }

    pub async fn update(
        &self,
        id: Uuid,
        owner: Option<Uuid>,
        payload: &CustomerPayload,
    ) -> Result<Customer, AppError> {
        let sql = format!(
            r#"
            UPDATE customers SET
                first_name = $3, last_name = $4, email = $5, phone = $6, nrc_passport = $7,
                date_of_birth = $8, gender = $9, occupation = $10, status = $11, address = $12,
                updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR created_by = $2)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(owner)
            .bind(&payload.first_name)
            .bind(&payload.last_name)
            .bind(&payload.email)
            .bind(&payload.phone)
            .bind(&payload.nrc_passport)
            .bind(payload.date_of_birth)
            .bind(payload.gender)
            .bind(&payload.occupation)
            .bind(payload.status)
            .bind(Json(&payload.address))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, duplicate_customer, "Cliente"))?
            .ok_or(AppError::NotFound("Cliente"))
    }

    pub async fn set_status(
        &self,
        id: Uuid,
        owner: Option<Uuid>,
        status: CustomerStatus,
    ) -> Result<Customer, AppError> {
        let sql = format!(
            r#"
            UPDATE customers SET status = $3, updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR created_by = $2)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(owner)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Cliente"))
    }

    /// Paginação por cursor: a página continua depois do cliente `cursor`
    /// na ordem pedida, desempatando pelo id.
    pub async fn list(&self, query: &CustomerQuery) -> Result<(Vec<Customer>, i64), AppError> {
        let column = query.sort_by.column();
        let (direction, comparison) = match query.sort_order {
            SortOrder::Asc => ("ASC", ">"),
            SortOrder::Desc => ("DESC", "<"),
        };

        retry_read(&self.retry, "customers.list", || async {
            let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM customers");
            push_filters(&mut count, query);
            let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

            let mut select =
                QueryBuilder::<Postgres>::new(format!("SELECT {CUSTOMER_COLUMNS} FROM customers"));
            push_filters(&mut select, query);
            if let Some(cursor) = query.cursor {
                select
                    .push(format!(
                        " AND ({column}, id) {comparison} (SELECT {column}, id FROM customers WHERE id = "
                    ))
                    .push_bind(cursor)
                    .push(")");
            }
            select
                .push(format!(" ORDER BY {column} {direction}, id {direction} LIMIT "))
                .push_bind(query.page_size);

            let customers = select
                .build_query_as::<Customer>()
                .fetch_all(&self.pool)
                .await?;
            Ok((customers, total))
        })
        .await
    }
}
