use async_trait::async_trait;

use super::domain::{AdminAccount, AdminProfile};
use super::errors::AuthError;

/// Repository abstraction for admin account persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>, AuthError>;
    async fn create_admin(&self, name: &str, email: &str, password_hash: String) -> Result<AdminProfile, AuthError>;
    async fn count_admins(&self) -> Result<u64, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    pub struct MockAuthRepository {
        admins: Mutex<HashMap<String, AdminAccount>>, // key: email
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>, AuthError> {
            let admins = self.admins.lock().unwrap();
            Ok(admins.get(email).cloned())
        }

        async fn create_admin(&self, name: &str, email: &str, password_hash: String) -> Result<AdminProfile, AuthError> {
            let mut admins = self.admins.lock().unwrap();
            if admins.contains_key(email) {
                return Err(AuthError::Conflict);
            }
            let profile = AdminProfile { id: Uuid::new_v4(), name: name.to_string(), email: email.to_string() };
            admins.insert(email.to_string(), AdminAccount { profile: profile.clone(), password_hash });
            Ok(profile)
        }

        async fn count_admins(&self) -> Result<u64, AuthError> {
            Ok(self.admins.lock().unwrap().len() as u64)
        }
    }
}
