// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,

        // --- Auth ---
        handlers::auth::sign_up,
        handlers::auth::sign_in,
        handlers::auth::sign_out,
        handlers::auth::get_me,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,

        // --- Users / Admin ---
        handlers::users::get_profile,
        handlers::users::update_profile,
        handlers::users::list_users,
        handlers::users::set_role,

        // --- Customers ---
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::set_customer_status,

        // --- Policies ---
        handlers::policies::create_policy,
        handlers::policies::list_policies,
        handlers::policies::get_policy,
        handlers::policies::update_policy,
        handlers::policies::set_policy_status,

        // --- Claims ---
        handlers::claims::create_claim,
        handlers::claims::list_claims,
        handlers::claims::get_claim,
        handlers::claims::update_claim,
        handlers::claims::review_claim,
        handlers::claims::mark_claim_paid,
        handlers::claims::add_claim_document,
        handlers::claims::remove_claim_document,

        // --- Premium / AI ---
        handlers::premium::calculate_premium,
        handlers::ai::generate_content,
        handlers::ai::generate_content_stream,
        handlers::ai::stream_content,
        handlers::ai::ask_question,
        handlers::ai::analyze_car_photo,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::SignUpPayload,
            models::auth::SignInPayload,
            models::auth::ForgotPasswordPayload,
            models::auth::ResetPasswordPayload,
            models::auth::UpdateProfilePayload,
            models::auth::UpdateRolePayload,
            models::auth::AuthResponse,
            models::auth::MessageResponse,
            handlers::users::UserListResponse,

            // --- Customers ---
            models::customer::CustomerStatus,
            models::customer::Gender,
            models::customer::Address,
            models::customer::Customer,
            models::customer::CustomerPayload,
            models::customer::CustomerStatusPayload,
            models::customer::CustomerListResponse,

            // --- Policies ---
            models::policy::PolicyType,
            models::policy::PolicyStatus,
            models::policy::VehicleUsage,
            models::policy::PaymentStatus,
            models::policy::Vehicle,
            models::policy::Premium,
            models::policy::PolicyDocument,
            models::policy::Policy,
            models::policy::PolicyPayload,
            models::policy::PolicyStatusPayload,
            models::policy::PolicyListResponse,

            // --- Claims ---
            models::claim::ClaimStatus,
            models::claim::DamageType,
            models::claim::ClaimLocation,
            models::claim::Claim,
            models::claim::ClaimPayload,
            models::claim::ReviewClaimPayload,
            models::claim::ClaimDocumentPayload,
            models::claim::ClaimListResponse,

            // --- Premium ---
            models::premium::VehicleType,
            models::premium::PremiumCalculationInput,
            models::premium::PremiumBreakdown,
            models::premium::PremiumQuoteResponse,
            models::premium::BreakdownLine,

            // --- AI ---
            models::ai::GenerationRequest,
            models::ai::GenerationResult,
            models::ai::StreamChunk,

            // --- Assistente e análise de fotos ---
            models::assistant::QueryScope,
            models::assistant::DateRange,
            models::assistant::QueryFilters,
            models::assistant::QuestionPayload,
            models::assistant::NamedRef,
            models::assistant::NumberedRef,
            models::assistant::MatchedEntities,
            models::assistant::QueryMetadata,
            models::assistant::QueryResponse,
            models::car_analysis::CarPhotoAnalysisInput,
            models::car_analysis::CarDetails,
            models::car_analysis::InsuranceRecommendation,
            models::car_analysis::MarketplaceListing,
            models::car_analysis::Marketplace,
            models::car_analysis::MarketplaceRecommendations,
            models::car_analysis::CarAnalysisResult,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::ExpiringPolicy,
        )
    ),
    tags(
        (name = "Health", description = "Verificação de vida"),
        (name = "Auth", description = "Sessão, cadastro e redefinição de senha"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Admin", description = "Gestão de usuários (apenas admins)"),
        (name = "Customers", description = "Clientes da agência"),
        (name = "Policies", description = "Apólices de seguro automóvel"),
        (name = "Claims", description = "Sinistros e análise"),
        (name = "Premium", description = "Cálculo remoto do prêmio"),
        (name = "AI", description = "Geração de conteúdo, assistente da agência e análise de fotos"),
        (name = "Dashboard", description = "Indicadores da carteira")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("session"))),
        );
    }
}
