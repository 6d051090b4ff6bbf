use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use rand::rngs::OsRng;
use tracing::{info, debug, warn, instrument};

use common::metrics::LOGINS_FAILED_TOTAL;

use super::domain::{AdminIdentity, AdminProfile, AuthSession, CreateAdminInput, LoginInput};
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::token::TokenIssuer;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    tokens: TokenIssuer,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, tokens: TokenIssuer) -> Self { Self { repo, tokens } }

    /// Create an administrator with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, TokenIssuer, repository::mock::MockAuthRepository};
    /// use service::auth::domain::CreateAdminInput;
    /// use std::sync::Arc;
    /// let svc = AuthService::new(Arc::new(MockAuthRepository::default()), TokenIssuer::new("secret", 24));
    /// let input = CreateAdminInput { name: "Ops".into(), email: "ops@example.com".into(), password: "Secret123".into() };
    /// let admin = tokio_test::block_on(svc.create_admin(input)).unwrap();
    /// assert_eq!(admin.email, "ops@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_admin(&self, input: CreateAdminInput) -> Result<AdminProfile, AuthError> {
        let name = input.name.trim();
        let email = input.email.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("name is required".into()));
        }
        if !email.contains('@') {
            return Err(AuthError::Validation("a valid email is required".into()));
        }
        if input.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
        }
        if let Some(existing) = self.repo.find_admin_by_email(email).await? {
            debug!("admin exists: {}", existing.profile.email);
            return Err(AuthError::Conflict);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let admin = self.repo.create_admin(name, email, hash).await?;
        info!(admin_id = %admin.id, email = %admin.email, "admin_created");
        Ok(admin)
    }

    /// Authenticate an administrator and issue a bearer token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, TokenIssuer, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{CreateAdminInput, LoginInput};
    /// use std::sync::Arc;
    /// let svc = AuthService::new(Arc::new(MockAuthRepository::default()), TokenIssuer::new("secret", 24));
    /// let _ = tokio_test::block_on(svc.create_admin(CreateAdminInput { name: "N".into(), email: "u@e.com".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(svc.verify_token(&session.token).is_ok());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let account = match self.repo.find_admin_by_email(input.email.trim()).await? {
            Some(account) => account,
            None => return Err(reject_login("unknown email")),
        };

        let parsed = PasswordHash::new(&account.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(reject_login("wrong password"));
        }

        let token = self.tokens.issue(&account.profile)?;
        info!(admin_id = %account.profile.id, "admin_logged_in");
        Ok(AuthSession { token, user: account.profile })
    }

    pub fn verify_token(&self, token: &str) -> Result<AdminIdentity, AuthError> {
        self.tokens.verify(token)
    }

    /// Seed the first administrator when none exists yet. Returns whether one was created.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn ensure_bootstrap_admin(&self, input: CreateAdminInput) -> Result<bool, AuthError> {
        if self.repo.count_admins().await? > 0 {
            debug!("admins present; bootstrap skipped");
            return Ok(false);
        }
        self.create_admin(input).await?;
        Ok(true)
    }
}

fn reject_login(reason: &str) -> AuthError {
    LOGINS_FAILED_TOTAL.inc();
    warn!(reason, "login_rejected");
    AuthError::Unauthorized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc() -> AuthService<MockAuthRepository> {
        AuthService::new(Arc::new(MockAuthRepository::default()), TokenIssuer::new("test-secret", 24))
    }

    fn input(email: &str, password: &str) -> CreateAdminInput {
        CreateAdminInput { name: "Admin".into(), email: email.into(), password: password.into() }
    }

    #[tokio::test]
    async fn login_round_trip() {
        let s = svc();
        let created = s.create_admin(input("a@example.com", "Password1")).await.unwrap();
        let session = s.login(LoginInput { email: "a@example.com".into(), password: "Password1".into() }).await.unwrap();
        assert_eq!(session.user, created);
        let who = s.verify_token(&session.token).unwrap();
        assert_eq!(who.id, created.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_unauthorized() {
        let s = svc();
        s.create_admin(input("a@example.com", "Password1")).await.unwrap();
        let bad = s.login(LoginInput { email: "a@example.com".into(), password: "nope-nope".into() }).await;
        assert!(matches!(bad, Err(AuthError::Unauthorized)));
        let unknown = s.login(LoginInput { email: "b@example.com".into(), password: "Password1".into() }).await;
        assert!(matches!(unknown, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn duplicate_admin_is_conflict() {
        let s = svc();
        s.create_admin(input("a@example.com", "Password1")).await.unwrap();
        let dup = s.create_admin(input("a@example.com", "Password2")).await;
        assert!(matches!(dup, Err(AuthError::Conflict)));
    }

    #[tokio::test]
    async fn create_admin_validates_input() {
        let s = svc();
        assert!(matches!(s.create_admin(input("no-at-sign", "Password1")).await, Err(AuthError::Validation(_))));
        assert!(matches!(s.create_admin(input("a@example.com", "short")).await, Err(AuthError::Validation(_))));
        let blank = CreateAdminInput { name: "  ".into(), email: "a@example.com".into(), password: "Password1".into() };
        assert!(matches!(s.create_admin(blank).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn bootstrap_only_when_empty() {
        let s = svc();
        assert!(s.ensure_bootstrap_admin(input("root@example.com", "Password1")).await.unwrap());
        assert!(!s.ensure_bootstrap_admin(input("other@example.com", "Password1")).await.unwrap());
        assert!(s.login(LoginInput { email: "other@example.com".into(), password: "Password1".into() }).await.is_err());
    }
}
