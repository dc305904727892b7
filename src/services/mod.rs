//! Clients for the delegated collaborators: authentication, object storage
//! and transactional email. Handlers only see the traits, so tests swap in
//! in-memory doubles.

pub mod auth;
pub mod mailer;
pub mod notifications;
pub mod storage;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

pub use auth::SupabaseAuth;
pub use mailer::ResendMailer;
pub use storage::SupabaseStorage;

/// Role stored in the identity's user metadata.
pub const INVESTOR_ROLE: &str = "investor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    /// `user_metadata.role`, when present
    pub role: Option<String>,
}

impl AuthUser {
    pub fn is_investor(&self) -> bool {
        self.role.as_deref() == Some(INVESTOR_ROLE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

/// Metadata attached to a new identity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewUserMetadata {
    pub role: String,
    pub investor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Self-service sign-up with email and password.
    async fn sign_up(&self, email: &str, password: &str, metadata: &NewUserMetadata) -> Result<AuthUser, AppError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError>;
    /// Resolves an access token to its identity.
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AppError>;
    async fn update_password(&self, access_token: &str, new_password: &str) -> Result<(), AppError>;
    /// Creates a pre-confirmed identity using the service role.
    async fn admin_create_user(&self, email: &str, password: &str, metadata: &NewUserMetadata) -> Result<AuthUser, AppError>;
    async fn admin_set_password(&self, user_id: Uuid, new_password: &str) -> Result<(), AppError>;
    async fn admin_delete_user(&self, user_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `path` and returns the object's public URL.
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, AppError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), AppError>;
}
