use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use reqwest::Client;

use super::ObjectStore;
use crate::error::AppError;

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Supabase Storage client bound to one public bucket.
#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_role_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(client: Client, base_url: &str, service_role_key: &str, bucket: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_role_key: service_role_key.to_string(),
            bucket: bucket.to_string(),
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, path)
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    #[tracing::instrument(skip(self, bytes), fields(bucket = %self.bucket, size = bytes.len()))]
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, AppError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %text, "storage upload failed");
            return Err(AppError::Upstream(format!("storage upload failed with status {}", status)));
        }

        let public_url = self.public_url(path);
        tracing::info!(%public_url, "uploaded object");
        Ok(public_url)
    }
}

/// Builds a collision-resistant object name `<unix-millis>-<random>.<ext>`.
pub fn object_name(original_filename: &str, now_millis: i64) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();

    match original_filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("{}-{}.{}", now_millis, suffix, ext.to_lowercase())
        }
        _ => format!("{}-{}", now_millis, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_keeps_extension() {
        let name = object_name("Cow Photo.JPG", 1_700_000_000_000);
        assert!(name.starts_with("1700000000000-"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn object_name_without_usable_extension() {
        let name = object_name("photo", 42);
        assert!(name.starts_with("42-"));
        assert!(!name.contains('.'));
    }

    #[test]
    fn public_url_points_at_bucket() {
        let storage = SupabaseStorage::new(Client::new(), "https://proj.supabase.co/", "key", "images");
        assert_eq!(
            storage.public_url("1-abc.png"),
            "https://proj.supabase.co/storage/v1/object/public/images/1-abc.png"
        );
    }
}
