// src/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState, docs::ApiDoc, handlers, middleware::auth::session_guard,
    models::car_analysis::MAX_PHOTO_BASE64_LEN,
};

// A foto em base64 mais o restante do JSON
const PHOTO_BODY_LIMIT: usize = MAX_PHOTO_BASE64_LEN + 64 * 1024;

pub fn router(app_state: AppState) -> Router {
    // Rotas de autenticação (login, signup e forgot-password são públicas)
    let auth_routes = Router::new()
        .route("/signup", post(handlers::auth::sign_up))
        .route("/login", post(handlers::auth::sign_in))
        .route("/logout", post(handlers::auth::sign_out))
        .route("/me", get(handlers::auth::get_me))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/forgot-password/reset", post(handlers::auth::reset_password));

    let user_routes = Router::new().route(
        "/me",
        get(handlers::users::get_profile).put(handlers::users::update_profile),
    );

    let admin_routes = Router::new()
        .route("/users", get(handlers::users::list_users))
        .route("/users/{id}/role", put(handlers::users::set_role));

    let customer_routes = Router::new()
        .route(
            "/",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route(
            "/{id}",
            get(handlers::customers::get_customer).put(handlers::customers::update_customer),
        )
        .route("/{id}/status", patch(handlers::customers::set_customer_status));

    let policy_routes = Router::new()
        .route(
            "/",
            post(handlers::policies::create_policy).get(handlers::policies::list_policies),
        )
        .route(
            "/{id}",
            get(handlers::policies::get_policy).put(handlers::policies::update_policy),
        )
        .route("/{id}/status", patch(handlers::policies::set_policy_status));

    let claim_routes = Router::new()
        .route(
            "/",
            post(handlers::claims::create_claim).get(handlers::claims::list_claims),
        )
        .route(
            "/{id}",
            get(handlers::claims::get_claim).put(handlers::claims::update_claim),
        )
        .route("/{id}/review", post(handlers::claims::review_claim))
        .route("/{id}/pay", post(handlers::claims::mark_claim_paid))
        .route(
            "/{id}/documents",
            post(handlers::claims::add_claim_document)
                .delete(handlers::claims::remove_claim_document),
        );

    let ai_routes = Router::new()
        .route("/generate", post(handlers::ai::generate_content))
        .route("/generate-stream", post(handlers::ai::generate_content_stream))
        .route("/stream", post(handlers::ai::stream_content))
        .route("/ask", post(handlers::ai::ask_question))
        .route(
            "/analyze-car",
            post(handlers::ai::analyze_car_photo).layer(DefaultBodyLimit::max(PHOTO_BODY_LIMIT)),
        );

    // O guarda classifica cada caminho (público, sessão, admin) antes dos handlers
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(handlers::health::health))
        .route("/api/premium/calculate", post(handlers::premium::calculate_premium))
        .route("/api/dashboard/summary", get(handlers::dashboard::get_summary))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/customers", customer_routes)
        .nest("/api/policies", policy_routes)
        .nest("/api/claims", claim_routes)
        .nest("/api/ai", ai_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            session_guard,
        ))
        .with_state(app_state)
}
