// src/config.rs

pub mod settings;

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::{
    common::{error::AppError, retry::ReadRetryPolicy},
    db::{
        ClaimRepository, CustomerRepository, DashboardRepository, PolicyRepository, UserRepository,
    },
    services::{
        ai_service::AiService, assistant_service::AssistantService, auth::AuthService,
        car_analysis_service::CarAnalysisService, claim_service::ClaimService,
        customer_service::CustomerService, dashboard_service::DashboardService,
        functions_client::FunctionsClient, policy_service::PolicyService,
        premium_service::PremiumService, user_service::UserService,
    },
};
use settings::Settings;

/// Contexto da aplicação: criado uma vez no arranque e clonado por requisição.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub db_pool: PgPool,
    /// Cancelado no desligamento; cada requisição deriva um filho dele.
    pub shutdown: CancellationToken,

    pub auth_service: AuthService,
    pub user_service: UserService,
    pub customer_service: CustomerService,
    pub policy_service: PolicyService,
    pub claim_service: ClaimService,
    pub premium_service: PremiumService,
    pub ai_service: AiService,
    pub assistant_service: AssistantService,
    pub car_analysis_service: CarAnalysisService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_parts(settings, db_pool)?)
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn from_parts(settings: Settings, db_pool: PgPool) -> Result<Self, AppError> {
        let retry = ReadRetryPolicy::with_attempts(settings.read_retry_attempts);

        let user_repo = UserRepository::new(db_pool.clone(), retry);
        let customer_repo = CustomerRepository::new(db_pool.clone(), retry);
        let policy_repo = PolicyRepository::new(db_pool.clone(), retry);
        let claim_repo = ClaimRepository::new(db_pool.clone(), retry);
        let dashboard_repo = DashboardRepository::new(db_pool.clone(), retry);

        let functions = FunctionsClient::new(
            &settings.functions_base_url,
            &settings.functions_api_key,
            settings.remote_timeout,
        )?;
        let premium_service = PremiumService::new(functions.clone());

        Ok(Self {
            auth_service: AuthService::new(
                user_repo.clone(),
                settings.jwt_secret.clone(),
                settings.session_ttl_days,
            ),
            user_service: UserService::new(user_repo),
            customer_service: CustomerService::new(customer_repo.clone()),
            policy_service: PolicyService::new(
                policy_repo.clone(),
                customer_repo,
                premium_service.clone(),
            ),
            claim_service: ClaimService::new(claim_repo, policy_repo),
            premium_service,
            ai_service: AiService::new(functions.clone()),
            assistant_service: AssistantService::new(functions.clone()),
            car_analysis_service: CarAnalysisService::new(functions),
            dashboard_service: DashboardService::new(dashboard_repo),
            shutdown: CancellationToken::new(),
            settings,
            db_pool,
        })
    }

    /// Token da requisição: cai junto com o servidor.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
