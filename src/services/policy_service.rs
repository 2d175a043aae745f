// src/services/policy_service.rs

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    common::{db_utils::clamp_page_size, error::AppError, format::generate_policy_number},
    db::{CustomerRepository, PolicyRepository},
    models::{
        auth::SessionUser,
        policy::{
            ensure_policy_number, Policy, PolicyFilters, PolicyListResponse, PolicyPayload,
            PolicyQuery, PolicySortField, PolicyStatus,
        },
        query::SortField,
    },
    services::premium_service::PremiumService,
};

#[derive(Clone)]
pub struct PolicyService {
    policy_repo: PolicyRepository,
    customer_repo: CustomerRepository,
    premium_service: PremiumService,
}

impl PolicyService {
    pub fn new(
        policy_repo: PolicyRepository,
        customer_repo: CustomerRepository,
        premium_service: PremiumService,
    ) -> Self {
        Self {
            policy_repo,
            customer_repo,
            premium_service,
        }
    }

    /// Emite a apólice. Sem número no payload, um é gerado; com cotação,
    /// o valor do prêmio passa a ser o total calculado remotamente.
    pub async fn create_policy(
        &self,
        caller: &SessionUser,
        mut payload: PolicyPayload,
        cancel: &CancellationToken,
    ) -> Result<Policy, AppError> {
        self.prepare(caller, &mut payload, cancel).await?;

        let policy_number = match payload.policy_number.as_deref() {
            Some(number) => number.to_string(),
            None => generate_policy_number(),
        };

        let policy = self
            .policy_repo
            .create(&payload, &policy_number, caller.id)
            .await?;
        tracing::info!(policy_id = %policy.id, policy_number = %policy.policy_number, "Apólice emitida");
        Ok(policy)
    }

    pub async fn get_policy(&self, caller: &SessionUser, id: Uuid) -> Result<Policy, AppError> {
        self.policy_repo.find_by_id(id, caller.owner_scope()).await
    }

    pub async fn update_policy(
        &self,
        caller: &SessionUser,
        id: Uuid,
        mut payload: PolicyPayload,
        cancel: &CancellationToken,
    ) -> Result<Policy, AppError> {
        self.prepare(caller, &mut payload, cancel).await?;
        self.policy_repo
            .update(id, caller.owner_scope(), &payload)
            .await
    }

    pub async fn set_status(
        &self,
        caller: &SessionUser,
        id: Uuid,
        status: PolicyStatus,
    ) -> Result<Policy, AppError> {
        self.policy_repo
            .set_status(id, caller.owner_scope(), status)
            .await
    }

    pub async fn list_policies(
        &self,
        caller: &SessionUser,
        filters: PolicyFilters,
    ) -> Result<PolicyListResponse, AppError> {
        let query = resolve_filters(filters, caller.owner_scope())?;
        let (items, total) = self.policy_repo.list(&query).await?;
        Ok(PolicyListResponse { items, total })
    }

    // Checagens comuns a emissão e edição
    async fn prepare(
        &self,
        caller: &SessionUser,
        payload: &mut PolicyPayload,
        cancel: &CancellationToken,
    ) -> Result<(), AppError> {
        if let Some(number) = payload.policy_number.as_deref() {
            ensure_policy_number(number)?;
        }

        // O cliente precisa existir e estar ao alcance de quem emite
        self.customer_repo
            .find_by_id(payload.customer_id, caller.owner_scope())
            .await?;

        if let Some(quote) = payload.quote.as_ref() {
            let breakdown = self.premium_service.calculate_premium(quote, cancel).await?;
            payload.premium.amount = breakdown.total;
        }
        Ok(())
    }
}

pub fn resolve_filters(
    filters: PolicyFilters,
    created_by: Option<uuid::Uuid>,
) -> Result<PolicyQuery, AppError> {
    let sort_by = PolicySortField::parse_optional(filters.sort_by.as_deref())?;

    Ok(PolicyQuery {
        search_term: filters.search_term.filter(|t| !t.trim().is_empty()),
        status: filters.status,
        policy_type: filters.policy_type,
        customer_id: filters.customer_id,
        start_date: filters.start_date,
        end_date: filters.end_date,
        sort_by,
        sort_order: filters.sort_order.unwrap_or_default(),
        page: filters.page,
        page_size: clamp_page_size(filters.page_size),
        created_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_filters_impose_nothing() {
        let query = resolve_filters(PolicyFilters::default(), None).unwrap();
        assert!(query.status.is_none() && query.policy_type.is_none());
        assert!(query.sort_by.is_none());
        assert!(query.created_by.is_none());
    }

    #[test]
    fn sort_by_must_name_a_policy_field() {
        let filters = PolicyFilters {
            sort_by: Some("customer.firstName".into()),
            ..Default::default()
        };
        let Err(AppError::InvalidSortField(field)) = resolve_filters(filters, None) else {
            panic!("esperava InvalidSortField");
        };
        assert_eq!(field, "policy.customer.firstName");
    }

    #[test]
    fn page_size_is_clamped() {
        let filters = PolicyFilters {
            page_size: Some(1_000),
            ..Default::default()
        };
        assert_eq!(resolve_filters(filters, None).unwrap().page_size, 100);
    }
}
