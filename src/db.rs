pub mod claim_repo;
pub mod customer_repo;
pub mod dashboard_repo;
pub mod policy_repo;
pub mod user_repo;

pub use claim_repo::ClaimRepository;
pub use customer_repo::CustomerRepository;
pub use dashboard_repo::DashboardRepository;
pub use policy_repo::PolicyRepository;
pub use user_repo::UserRepository;
