use sea_orm::DatabaseConnection;

use crate::auth::domain::{AdminAccount, AdminProfile};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;
use models::errors::ModelError;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn profile_of(m: &models::admin::Model) -> AdminProfile {
    AdminProfile { id: m.id, name: m.name.clone(), email: m.email.clone() }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>, AuthError> {
        let res = models::admin::find_by_email(&self.db, email)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|a| AdminAccount { profile: profile_of(&a), password_hash: a.password_hash }))
    }

    async fn create_admin(&self, name: &str, email: &str, password_hash: String) -> Result<AdminProfile, AuthError> {
        let created = models::admin::create(&self.db, name, email, password_hash)
            .await
            .map_err(|e| match e {
                ModelError::Validation(msg) => AuthError::Validation(msg),
                // lost a race with another insert of the same email
                ModelError::Conflict(_) => AuthError::Conflict,
                ModelError::Db(msg) => AuthError::Repository(msg),
            })?;
        Ok(profile_of(&created))
    }

    async fn count_admins(&self) -> Result<u64, AuthError> {
        models::admin::count(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthService, TokenIssuer};
    use crate::auth::domain::{CreateAdminInput, LoginInput};
    use crate::test_support::get_db;
    use std::sync::Arc;

    #[tokio::test]
    async fn seaorm_admin_login_flow() -> Result<(), anyhow::Error> {
        let (db, dir) = get_db().await?;
        let svc = AuthService::new(Arc::new(SeaOrmAuthRepository { db }), TokenIssuer::new("secret", 24));

        let seeded = svc
            .ensure_bootstrap_admin(CreateAdminInput { name: "Root".into(), email: "root@example.com".into(), password: "Password1".into() })
            .await?;
        assert!(seeded);

        let session = svc.login(LoginInput { email: "root@example.com".into(), password: "Password1".into() }).await?;
        assert_eq!(session.user.name, "Root");

        let dup = svc
            .create_admin(CreateAdminInput { name: "Again".into(), email: "root@example.com".into(), password: "Password1".into() })
            .await;
        assert!(matches!(dup, Err(AuthError::Conflict)));

        let _ = std::fs::remove_dir_all(dir);
        Ok(())
    }

    #[tokio::test]
    async fn seaorm_duplicate_insert_maps_to_conflict() -> Result<(), anyhow::Error> {
        let (db, dir) = get_db().await?;
        let repo = SeaOrmAuthRepository { db };

        // two creates that both passed the existence check before either inserted
        repo.create_admin("First", "race@example.com", "hash-one".into()).await?;
        let second = repo.create_admin("Second", "race@example.com", "hash-two".into()).await;
        assert!(matches!(second, Err(AuthError::Conflict)));
        assert_eq!(repo.count_admins().await?, 1);

        let _ = std::fs::remove_dir_all(dir);
        Ok(())
    }
}
