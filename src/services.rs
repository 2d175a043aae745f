pub mod ai_service;
pub mod assistant_service;
pub mod auth;
pub mod car_analysis_service;
pub mod claim_service;
pub mod customer_service;
pub mod dashboard_service;
pub mod functions_client;
pub mod policy_service;
pub mod premium_service;
pub mod user_service;
