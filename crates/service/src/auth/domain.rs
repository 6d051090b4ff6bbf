use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Input for creating an additional administrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAdminInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Public view of an administrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Administrator together with the stored password hash
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub profile: AdminProfile,
    pub password_hash: String,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: AdminProfile,
}

/// Identity carried by a verified bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub id: Uuid,
    pub email: String,
}
