// src/services/user_service.rs

use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{clamp_page_size, page_offset},
        error::AppError,
    },
    db::UserRepository,
    models::auth::{profile_is_complete, UpdateProfilePayload, User, UserRole},
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    pub fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Usuário"))
    }

    /// Mescla os campos enviados no perfil atual e recalcula `profileCompleted`.
    pub async fn update_profile(
        &self,
        id: Uuid,
        payload: UpdateProfilePayload,
    ) -> Result<User, AppError> {
        let mut user = self.get_user(id).await?;

        if let Some(display_name) = payload.display_name {
            user.display_name = display_name;
        }
        merge(&mut user.first_name, payload.first_name);
        merge(&mut user.last_name, payload.last_name);
        merge(&mut user.phone, payload.phone);
        merge(&mut user.department, payload.department);
        merge(&mut user.employee_id, payload.employee_id);
        merge(&mut user.insurance_company, payload.insurance_company);
        merge(&mut user.bio, payload.bio);
        if let Some(address) = payload.address {
            user.address = Some(Json(address));
        }
        user.profile_completed = profile_is_complete(&user);

        self.user_repo.save_profile(&user).await
    }

    pub async fn list_users(
        &self,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<(Vec<User>, i64), AppError> {
        let limit = clamp_page_size(page_size);
        self.user_repo
            .list_users(limit, page_offset(page, limit))
            .await
    }

    pub async fn set_role(&self, acting_admin: Uuid, id: Uuid, role: UserRole) -> Result<User, AppError> {
        // Um admin não se rebaixa sozinho
        if acting_admin == id && role != UserRole::Admin {
            return Err(AppError::Forbidden);
        }
        let user = self.user_repo.set_role(id, role).await?;
        tracing::info!(user_id = %id, %role, "Papel do usuário alterado");
        Ok(user)
    }
}

fn merge(current: &mut Option<String>, incoming: Option<String>) {
    if incoming.is_some() {
        *current = incoming;
    }
}
