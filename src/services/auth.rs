// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{
        AuthResponse, SessionClaims, SessionUser, SignInPayload, SignUpPayload, TokenPurpose,
        User, UserRole,
    },
};

const RESET_TOKEN_MINUTES: i64 = 15;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, session_ttl_days: i64) -> Self {
        Self {
            user_repo,
            jwt_secret,
            session_ttl: Duration::days(session_ttl_days),
        }
    }

    pub async fn sign_up(&self, payload: SignUpPayload) -> Result<AuthResponse, AppError> {
        // Hashing fora do runtime assíncrono
        let hashed_password = hash_password(payload.password).await?;

        let user = self
            .user_repo
            .create_user(
                &payload.email,
                &hashed_password,
                &payload.display_name,
                UserRole::Agent,
            )
            .await?;

        tracing::info!(user_id = %user.id, "Novo usuário cadastrado");
        self.issue_session(user)
    }

    pub async fn sign_in(&self, payload: SignInPayload) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(&payload.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = payload.password;
        let password_hash = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.issue_session(user)
    }

    /// O papel viaja no token: o guarda não consulta o banco a cada requisição.
    pub fn validate_session(&self, token: &str) -> Result<SessionUser, AppError> {
        let claims = self.decode_claims(token)?;
        if claims.purpose != TokenPurpose::Session {
            return Err(AppError::InvalidToken);
        }
        Ok(claims.into())
    }

    /// Sempre responde igual, exista ou não o e-mail.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.user_repo.find_by_email(email).await? else {
            tracing::info!("Pedido de redefinição para e-mail inexistente");
            return Ok(());
        };

        // O envio do e-mail fica fora deste serviço; o token nunca vai para o log.
        self.issue_reset_token(&user)?;
        tracing::debug!(user_id = %user.id, "Token de redefinição de senha emitido");
        Ok(())
    }

    /// O token carrega o `updated_at` da conta: depois da troca de senha ele não vale mais.
    pub fn issue_reset_token(&self, user: &User) -> Result<String, AppError> {
        let mut claims = self.claims_for(
            user,
            TokenPurpose::PasswordReset,
            Duration::minutes(RESET_TOKEN_MINUTES),
        );
        claims.stamp = Some(user.updated_at.timestamp_micros());
        self.sign(&claims)
    }

    pub async fn reset_password(&self, token: &str, new_password: String) -> Result<(), AppError> {
        let claims = self.decode_claims(token)?;
        if claims.purpose != TokenPurpose::PasswordReset {
            return Err(AppError::InvalidToken);
        }
        let issued_for = claims
            .stamp
            .and_then(DateTime::from_timestamp_micros)
            .ok_or(AppError::InvalidToken)?;

        let hashed_password = hash_password(new_password).await?;
        let updated = self
            .user_repo
            .update_password(claims.sub, &hashed_password, issued_for)
            .await?;
        if !updated {
            tracing::warn!(user_id = %claims.sub, "Token de redefinição reutilizado ou vencido");
            return Err(AppError::InvalidToken);
        }

        tracing::info!(user_id = %claims.sub, "Senha redefinida");
        Ok(())
    }

    pub fn issue_session(&self, user: User) -> Result<AuthResponse, AppError> {
        let token = self.create_token(&user, TokenPurpose::Session, self.session_ttl)?;
        Ok(AuthResponse { token, user })
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    fn decode_claims(&self, token: &str) -> Result<SessionClaims, AppError> {
        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
    }

    fn create_token(
        &self,
        user: &User,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<String, AppError> {
        self.sign(&self.claims_for(user, purpose, ttl))
    }

    fn claims_for(&self, user: &User, purpose: TokenPurpose, ttl: Duration) -> SessionClaims {
        let now = Utc::now();
        let expires_at = now + ttl;

        SessionClaims {
            sub: user.id,
            email: user.email.clone(),
            name: user.display_name.clone(),
            role: user.role,
            purpose,
            stamp: None,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        }
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String, AppError> {
        Ok(encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

async fn hash_password(password: String) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::{lazy_pool, sample_user};

    fn service() -> AuthService {
        let repo = UserRepository::new(lazy_pool(), Default::default());
        AuthService::new(repo, "segredo-de-teste".into(), 7)
    }

    #[tokio::test]
    async fn session_token_round_trips_the_caller() {
        let auth = service();
        let user = sample_user(UserRole::Admin);

        let session = auth.issue_session(user.clone()).unwrap();
        let caller = auth.validate_session(&session.token).unwrap();

        assert_eq!(caller.id, user.id);
        assert_eq!(caller.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn reset_tokens_do_not_open_sessions() {
        let auth = service();
        let user = sample_user(UserRole::Agent);
        let token = auth
            .create_token(&user, TokenPurpose::PasswordReset, Duration::minutes(5))
            .unwrap();

        assert!(matches!(auth.validate_session(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn tokens_from_another_secret_are_rejected() {
        let other = AuthService::new(
            UserRepository::new(lazy_pool(), Default::default()),
            "outro".into(),
            7,
        );
        let token = other.issue_session(sample_user(UserRole::Agent)).unwrap().token;

        assert!(service().validate_session(&token).is_err());
    }

    #[tokio::test]
    async fn reset_token_is_pinned_to_the_account_version() {
        let auth = service();
        let user = sample_user(UserRole::Agent);

        let token = auth.issue_reset_token(&user).unwrap();
        let claims = auth.decode_claims(&token).unwrap();

        assert_eq!(claims.purpose, TokenPurpose::PasswordReset);
        assert_eq!(claims.stamp, Some(user.updated_at.timestamp_micros()));
    }

    #[tokio::test]
    async fn reset_token_without_account_version_is_refused() {
        // Falha antes do hashing e do banco: o pool de teste nunca conecta
        let auth = service();
        let user = sample_user(UserRole::Agent);
        let token = auth
            .create_token(&user, TokenPurpose::PasswordReset, Duration::minutes(5))
            .unwrap();

        assert!(matches!(
            auth.reset_password(&token, "nova-senha-forte".into()).await,
            Err(AppError::InvalidToken)
        ));
    }
}
