// Export all route modules
pub mod auth;
pub mod blog;
pub mod cattle;
pub mod contacts;
pub mod dashboard;
pub mod investments;
pub mod investors;
pub mod orders;
pub mod projects;
pub mod uploads;

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;

/// Outcome of an operation that has no resource to return.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub success: bool,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Rejects blank required text fields.
pub(crate) fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(())
}

/// Turns blank optional text into `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidRequest(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
