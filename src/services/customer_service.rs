// src/services/customer_service.rs

use uuid::Uuid;

use crate::{
    common::{db_utils::clamp_page_size, error::{field_error, AppError}},
    db::CustomerRepository,
    models::{
        auth::SessionUser,
        customer::{
            Customer, CustomerFilters, CustomerListResponse, CustomerPayload, CustomerQuery,
            CustomerSortField, CustomerStatus,
        },
        query::SortField,
    },
};

#[derive(Clone)]
pub struct CustomerService {
    customer_repo: CustomerRepository,
}

impl CustomerService {
    pub fn new(customer_repo: CustomerRepository) -> Self {
        Self { customer_repo }
    }

    pub async fn create_customer(
        &self,
        caller: &SessionUser,
        payload: CustomerPayload,
    ) -> Result<Customer, AppError> {
        let customer = self.customer_repo.create(&payload, caller.id).await?;
        tracing::info!(customer_id = %customer.id, agent = %caller.id, "Cliente cadastrado");
        Ok(customer)
    }

    pub async fn get_customer(&self, caller: &SessionUser, id: Uuid) -> Result<Customer, AppError> {
        self.customer_repo.find_by_id(id, caller.owner_scope()).await
    }

    pub async fn update_customer(
        &self,
        caller: &SessionUser,
        id: Uuid,
        payload: CustomerPayload,
    ) -> Result<Customer, AppError> {
        self.customer_repo
            .update(id, caller.owner_scope(), &payload)
            .await
    }

    /// Clientes nunca são apagados; só ativados ou desativados.
    pub async fn set_status(
        &self,
        caller: &SessionUser,
        id: Uuid,
        status: CustomerStatus,
    ) -> Result<Customer, AppError> {
        self.customer_repo
            .set_status(id, caller.owner_scope(), status)
            .await
    }

    pub async fn list_customers(
        &self,
        caller: &SessionUser,
        filters: CustomerFilters,
    ) -> Result<CustomerListResponse, AppError> {
        let query = resolve_filters(filters, caller.owner_scope())?;
        let (customers, total) = self.customer_repo.list(&query).await?;

        let last_doc = next_cursor(&customers, query.page_size, |c| c.id);

        Ok(CustomerListResponse {
            customers,
            total,
            last_doc,
        })
    }
}

/// Só há continuação quando a página veio cheia: o cursor é o id do último item.
pub fn next_cursor<T>(page: &[T], page_size: i64, id_of: impl Fn(&T) -> Uuid) -> Option<String> {
    if page.is_empty() || page.len() as i64 != page_size {
        return None;
    }
    page.last().map(|item| id_of(item).to_string())
}

/// Valida os filtros antes de qualquer acesso ao banco.
pub fn resolve_filters(
    filters: CustomerFilters,
    created_by: Option<Uuid>,
) -> Result<CustomerQuery, AppError> {
    let sort_by = CustomerSortField::parse_optional(filters.sort_by.as_deref())?
        .unwrap_or(CustomerSortField::FirstName);

    let cursor = match filters.cursor.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<Uuid>().map_err(|_| {
            field_error("cursor", "invalid_cursor", "Cursor de paginação inválido.")
        })?),
    };

    Ok(CustomerQuery {
        search_term: filters.search_term.filter(|t| !t.trim().is_empty()),
        status: filters.status,
        sort_by,
        sort_order: filters.sort_order.unwrap_or_default(),
        page_size: clamp_page_size(filters.page_size),
        cursor,
        created_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::query::SortOrder;

    #[test]
    fn defaults_sort_by_first_name_ascending() {
        let query = resolve_filters(CustomerFilters::default(), None).unwrap();
        assert_eq!(query.sort_by, CustomerSortField::FirstName);
        assert_eq!(query.sort_order, SortOrder::Asc);
        assert_eq!(query.page_size, 10);
    }

    #[test]
    fn unknown_sort_field_fails_before_the_repository() {
        let filters = CustomerFilters {
            sort_by: Some("passwordHash".into()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_filters(filters, None),
            Err(AppError::InvalidSortField(_))
        ));
    }

    #[test]
    fn garbage_cursor_is_a_validation_error() {
        let filters = CustomerFilters {
            cursor: Some("página-2".into()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_filters(filters, None),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn full_page_hands_out_the_last_id_as_cursor() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        assert_eq!(next_cursor(&ids, 3, |id| *id), Some(ids[2].to_string()));
    }

    #[test]
    fn short_or_empty_page_ends_the_listing() {
        let ids: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        assert_eq!(next_cursor(&ids, 3, |id| *id), None);
        assert_eq!(next_cursor(&[] as &[Uuid], 3, |id| *id), None);
    }
}
