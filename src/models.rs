pub mod ai;
pub mod assistant;
pub mod auth;
pub mod car_analysis;
pub mod claim;
pub mod customer;
pub mod dashboard;
pub mod policy;
pub mod premium;
pub mod query;
pub mod rules;

use crate::common::error::AppError;

/// Payload de entrada que sabe se normalizar e validar.
/// Devolve o próprio valor já limpo, ou os erros por campo.
pub trait Schema: Sized {
    fn validated(self) -> Result<Self, AppError>;
}
