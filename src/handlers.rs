pub mod ai;
pub mod auth;
pub mod claims;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod policies;
pub mod premium;
pub mod users;
