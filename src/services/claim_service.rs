// src/services/claim_service.rs

use uuid::Uuid;

use crate::{
    common::{
        db_utils::clamp_page_size,
        error::{field_error, AppError},
    },
    db::{ClaimRepository, PolicyRepository},
    models::{
        auth::SessionUser,
        claim::{
            Claim, ClaimFilters, ClaimListResponse, ClaimPayload, ClaimQuery, ClaimSortField,
            ClaimStatus, ReviewClaimPayload,
        },
        query::SortField,
    },
};

#[derive(Clone)]
pub struct ClaimService {
    claim_repo: ClaimRepository,
    policy_repo: PolicyRepository,
}

impl ClaimService {
    pub fn new(claim_repo: ClaimRepository, policy_repo: PolicyRepository) -> Self {
        Self {
            claim_repo,
            policy_repo,
        }
    }

    /// Abre o sinistro como `Submitted`. A apólice precisa ser do mesmo cliente.
    pub async fn create_claim(
        &self,
        caller: &SessionUser,
        payload: ClaimPayload,
    ) -> Result<Claim, AppError> {
        self.ensure_policy_matches(caller, &payload).await?;

        let claim = self.claim_repo.create(&payload, caller.id).await?;
        tracing::info!(claim_id = %claim.id, policy_id = %claim.policy_id, "Sinistro aberto");
        Ok(claim)
    }

    pub async fn get_claim(&self, caller: &SessionUser, id: Uuid) -> Result<Claim, AppError> {
        self.claim_repo.find_by_id(id, caller.owner_scope()).await
    }

    pub async fn update_claim(
        &self,
        caller: &SessionUser,
        id: Uuid,
        payload: ClaimPayload,
    ) -> Result<Claim, AppError> {
        self.ensure_policy_matches(caller, &payload).await?;

        if let Some(claim) = self
            .claim_repo
            .update_submitted(id, caller.owner_scope(), &payload)
            .await?
        {
            return Ok(claim);
        }

        // Nada atualizado: ou não existe, ou já entrou em análise
        let current = self.claim_repo.find_by_id(id, caller.owner_scope()).await?;
        Err(AppError::InvalidStatusTransition {
            from: format!("{:?}", current.status),
            to: format!("{:?}", ClaimStatus::Submitted),
        })
    }

    pub async fn review_claim(
        &self,
        caller: &SessionUser,
        id: Uuid,
        payload: ReviewClaimPayload,
    ) -> Result<Claim, AppError> {
        let current = self.claim_repo.find_by_id(id, caller.owner_scope()).await?;
        payload.check_against(&current)?;

        let notes = Some(payload.review_notes.as_str()).filter(|n| !n.is_empty());
        let claim = self
            .claim_repo
            .apply_review(
                id,
                current.status,
                payload.status,
                payload.approved_amount,
                notes,
                caller.id,
            )
            .await?
            .ok_or_else(|| concurrent_change(current.status, payload.status))?;

        tracing::info!(
            claim_id = %id,
            from = ?current.status,
            to = ?claim.status,
            reviewer = %caller.id,
            "Sinistro analisado"
        );
        Ok(claim)
    }

    pub async fn mark_paid(&self, caller: &SessionUser, id: Uuid) -> Result<Claim, AppError> {
        let current = self.claim_repo.find_by_id(id, caller.owner_scope()).await?;
        current.status.transition_to(ClaimStatus::Paid)?;

        let claim = self
            .claim_repo
            .apply_review(id, ClaimStatus::Approved, ClaimStatus::Paid, None, None, caller.id)
            .await?
            .ok_or_else(|| concurrent_change(current.status, ClaimStatus::Paid))?;

        tracing::info!(claim_id = %id, "Sinistro pago");
        Ok(claim)
    }

    pub async fn add_document(
        &self,
        caller: &SessionUser,
        id: Uuid,
        url: &str,
    ) -> Result<Claim, AppError> {
        self.claim_repo
            .add_document(id, caller.owner_scope(), url)
            .await
    }

    pub async fn remove_document(
        &self,
        caller: &SessionUser,
        id: Uuid,
        url: &str,
    ) -> Result<Claim, AppError> {
        self.claim_repo
            .remove_document(id, caller.owner_scope(), url)
            .await
    }

    pub async fn list_claims(
        &self,
        caller: &SessionUser,
        filters: ClaimFilters,
    ) -> Result<ClaimListResponse, AppError> {
        let query = resolve_filters(filters, caller.owner_scope())?;
        let (items, total) = self.claim_repo.list(&query).await?;
        Ok(ClaimListResponse { items, total })
    }

    async fn ensure_policy_matches(
        &self,
        caller: &SessionUser,
        payload: &ClaimPayload,
    ) -> Result<(), AppError> {
        let policy = self
            .policy_repo
            .find_by_id(payload.policy_id, caller.owner_scope())
            .await?;
        if policy.customer_id != payload.customer_id {
            return Err(field_error(
                "policy_id",
                "policy_customer_mismatch",
                "A apólice não pertence a este cliente.",
            ));
        }
        Ok(())
    }
}

// Outra análise gravou primeiro
fn concurrent_change(from: ClaimStatus, to: ClaimStatus) -> AppError {
    AppError::InvalidStatusTransition {
        from: format!("{from:?}"),
        to: format!("{to:?}"),
    }
}

pub fn resolve_filters(
    filters: ClaimFilters,
    created_by: Option<Uuid>,
) -> Result<ClaimQuery, AppError> {
    let sort_by = ClaimSortField::parse_optional(filters.sort_by.as_deref())?;

    Ok(ClaimQuery {
        search_term: filters.search_term.filter(|t| !t.trim().is_empty()),
        status: filters.status,
        damage_type: filters.damage_type,
        policy_id: filters.policy_id,
        customer_id: filters.customer_id,
        incident_from: filters.incident_from,
        incident_to: filters.incident_to,
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
    use crate::models::claim::DamageType;

    #[test]
    fn filters_pass_through_to_the_query() {
        let policy_id = Uuid::new_v4();
        let filters = ClaimFilters {
            status: Some(ClaimStatus::UnderReview),
            damage_type: Some(DamageType::Vehicle),
            policy_id: Some(policy_id),
            sort_by: Some("amount".into()),
            ..Default::default()
        };
        let owner = Uuid::new_v4();
        let query = resolve_filters(filters, Some(owner)).unwrap();

        assert_eq!(query.status, Some(ClaimStatus::UnderReview));
        assert_eq!(query.policy_id, Some(policy_id));
        assert_eq!(query.sort_by, Some(ClaimSortField::Amount));
        assert_eq!(query.created_by, Some(owner));
    }

    #[test]
    fn unknown_claim_sort_is_rejected() {
        let filters = ClaimFilters {
            sort_by: Some("reviewer".into()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_filters(filters, None),
            Err(AppError::InvalidSortField(f)) if f == "claim.reviewer"
        ));
    }

    #[test]
    fn lost_race_reports_a_transition_conflict() {
        let err = concurrent_change(ClaimStatus::UnderReview, ClaimStatus::Approved);
        assert!(matches!(err, AppError::InvalidStatusTransition { .. }));
    }
}
