use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{AuthProvider, AuthUser, NewUserMetadata, Session};
use crate::error::AppError;

/// GoTrue (Supabase Auth) REST client.
#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl From<RawUser> for AuthUser {
    fn from(raw: RawUser) -> Self {
        let role = raw
            .user_metadata
            .get("role")
            .and_then(Value::as_str)
            .map(str::to_string);
        AuthUser {
            id: raw.id,
            email: raw.email.unwrap_or_default(),
            role,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSession {
    access_token: String,
    user: RawUser,
}

impl SupabaseAuth {
    pub fn new(client: Client, base_url: &str, anon_key: &str, service_role_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            service_role_key: service_role_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn public(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    fn admin(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    /// Sign-up answers with a bare user when email confirmation is pending,
    /// or with a session wrapping the user when auto-confirm is on.
    fn user_from_signup(body: Value) -> Result<AuthUser, AppError> {
        let user = match body.get("user") {
            Some(user) if user.is_object() => user.clone(),
            _ => body,
        };
        let raw: RawUser = serde_json::from_value(user)?;
        Ok(raw.into())
    }
}

/// Maps a non-success GoTrue response onto an `AppError`, keeping its message.
async fn check(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .unwrap_or("authentication service error")
        .to_string();

    tracing::warn!(%status, %message, "auth request failed");
    Err(match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::InvalidRequest(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        _ => AppError::Upstream(message),
    })
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    #[tracing::instrument(skip(self, password, metadata))]
    async fn sign_up(&self, email: &str, password: &str, metadata: &NewUserMetadata) -> Result<AuthUser, AppError> {
        let request = self.public(self.client.post(self.url("/signup"))).json(&json!({
            "email": email,
            "password": password,
            "data": metadata,
        }));
        let body: Value = check(request.send().await?).await?.json().await?;
        Self::user_from_signup(body)
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let request = self
            .public(self.client.post(self.url("/token")))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let raw: RawSession = check(request.send().await?).await?.json().await?;
        Ok(Session {
            access_token: raw.access_token,
            user: raw.user.into(),
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AppError> {
        let request = self
            .public(self.client.get(self.url("/user")))
            .bearer_auth(access_token);
        let raw: RawUser = check(request.send().await?).await?.json().await?;
        Ok(raw.into())
    }

    async fn update_password(&self, access_token: &str, new_password: &str) -> Result<(), AppError> {
        let request = self
            .public(self.client.put(self.url("/user")))
            .bearer_auth(access_token)
            .json(&json!({ "password": new_password }));
        check(request.send().await?).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, password, metadata))]
    async fn admin_create_user(&self, email: &str, password: &str, metadata: &NewUserMetadata) -> Result<AuthUser, AppError> {
        let request = self.admin(self.client.post(self.url("/admin/users"))).json(&json!({
            "email": email,
            "password": password,
            "email_confirm": true,
            "user_metadata": metadata,
        }));
        let raw: RawUser = check(request.send().await?).await?.json().await?;
        Ok(raw.into())
    }

    #[tracing::instrument(skip(self, new_password))]
    async fn admin_set_password(&self, user_id: Uuid, new_password: &str) -> Result<(), AppError> {
        let request = self
            .admin(self.client.put(self.url(&format!("/admin/users/{}", user_id))))
            .json(&json!({ "password": new_password }));
        check(request.send().await?).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn admin_delete_user(&self, user_id: Uuid) -> Result<(), AppError> {
        let request = self.admin(self.client.delete(self.url(&format!("/admin/users/{}", user_id))));
        check(request.send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_accepts_bare_user_and_session_shapes() {
        let id = Uuid::new_v4();
        let bare = json!({
            "id": id,
            "email": "karim@example.com",
            "user_metadata": { "role": "investor" }
        });
        let user = SupabaseAuth::user_from_signup(bare.clone()).unwrap();
        assert_eq!(user.id, id);
        assert!(user.is_investor());

        let wrapped = json!({ "access_token": "t", "user": bare });
        let user = SupabaseAuth::user_from_signup(wrapped).unwrap();
        assert_eq!(user.email, "karim@example.com");
    }

    #[test]
    fn missing_metadata_means_no_role() {
        let raw: RawUser = serde_json::from_value(json!({ "id": Uuid::new_v4() })).unwrap();
        let user: AuthUser = raw.into();
        assert_eq!(user.role, None);
        assert!(!user.is_investor());
    }
}
