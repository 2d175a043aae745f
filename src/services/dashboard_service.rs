// src/services/dashboard_service.rs

use chrono::{NaiveDate, Utc};

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::{
        auth::SessionUser,
        dashboard::{DashboardSummary, ExpiringPolicy},
    },
};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    /// Agentes veem a própria carteira; admins, a agência inteira.
    pub async fn get_summary(&self, caller: &SessionUser) -> Result<DashboardSummary, AppError> {
        self.summary_on(caller, Utc::now().date_naive()).await
    }

    pub async fn summary_on(
        &self,
        caller: &SessionUser,
        today: NaiveDate,
    ) -> Result<DashboardSummary, AppError> {
        let (row, expiring) = self.repo.get_summary(caller.owner_scope(), today).await?;
        let expiring_soon = expiring
            .into_iter()
            .map(|row| ExpiringPolicy::from_row(row, today))
            .collect();
        Ok(DashboardSummary::build(row, expiring_soon))
    }
}
