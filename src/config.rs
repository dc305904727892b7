use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Clone)]
pub struct RateLimit {
    pub per_minute: u32,
    pub burst: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub storage_bucket: String,
    pub resend_api_key: Option<String>,
    pub mail_from: String,
    /// Inbox that receives contact and investment notifications.
    pub notify_email: Option<String>,
    /// When non-empty, only these identities may use the admin API.
    pub admin_emails: Vec<String>,
    pub rate_limit: Option<RateLimit>,
    pub run_migrations: bool,
}

impl Config {
    /// Reads configuration from the process environment. Call `dotenvy::dotenv()` first
    /// if a `.env` file should be honoured.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let rate_limit = optional("RATE_LIMIT_PER_MINUTE")
            .map(|raw| parse::<u32>("RATE_LIMIT_PER_MINUTE", &raw))
            .transpose()?
            .filter(|per_minute| *per_minute > 0)
            .map(|per_minute| RateLimit {
                per_minute,
                burst: try_load("RATE_LIMIT_BURST", "10"),
            });

        Ok(Self {
            database_url,
            bind_addr: try_load("BIND_ADDR", "127.0.0.1:3000"),
            supabase_url: base_url("SUPABASE_URL", "http://127.0.0.1:54321")?,
            supabase_anon_key: optional("SUPABASE_ANON_KEY").unwrap_or_default(),
            supabase_service_role_key: optional("SUPABASE_SERVICE_ROLE_KEY").unwrap_or_default(),
            storage_bucket: try_load("STORAGE_BUCKET", "images"),
            resend_api_key: optional("RESEND_API_KEY"),
            mail_from: try_load("MAIL_FROM", "Cattlefund <onboarding@resend.dev>"),
            notify_email: optional("NOTIFY_EMAIL"),
            admin_emails: optional("ADMIN_EMAILS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            rate_limit,
            run_migrations: try_load("RUN_MIGRATIONS", "false"),
        })
    }

    /// Configuration for tests and local tooling: no rate limit, no notifications inbox.
    pub fn for_database(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            supabase_url: "http://127.0.0.1:54321".to_string(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: String::new(),
            storage_bucket: "images".to_string(),
            resend_api_key: None,
            mail_from: "Cattlefund <onboarding@resend.dev>".to_string(),
            notify_email: None,
            admin_emails: Vec::new(),
            rate_limit: None,
            run_migrations: false,
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse<T: FromStr>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid {key} value {raw:?}: {e}"))
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = optional(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    parse(key, &raw).unwrap_or_else(|e| {
        warn!("{e}; falling back to {default}");
        // Defaults are literals chosen to parse for every call site.
        parse(key, default).unwrap_or_else(|_| panic!("default for {key} does not parse"))
    })
}

/// Loads an http(s) base URL, without its trailing slash.
fn base_url(key: &str, default: &str) -> anyhow::Result<String> {
    let raw: String = try_load(key, default);
    let parsed = Url::parse(raw.trim()).map_err(|e| anyhow::anyhow!("Invalid {key} value {raw:?}: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("{key} must be an http(s) URL, got {raw:?}");
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Splits a comma separated list, lowercasing and dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Default log directives for the API server when `RUST_LOG` is unset.
pub const SERVER_LOG_FILTER: &str = "cattlefund=info,tower_http=info,sea_orm=warn";
/// Default log directives for the worker when `RUST_LOG` is unset.
pub const WORKER_LOG_FILTER: &str = "cattlefund=info,sea_orm=warn";

/// `RUST_LOG` when set and valid, `default` otherwise. Shared by both binaries.
pub fn log_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_normalises_entries() {
        assert_eq!(
            split_list(" Owner@Farm.com, ,ops@farm.com "),
            vec!["owner@farm.com".to_string(), "ops@farm.com".to_string()]
        );
    }

    #[test]
    fn base_url_rejects_non_http_schemes() {
        std::env::set_var("CATTLEFUND_TEST_BASE_URL", "ftp://files.example.com");
        assert!(base_url("CATTLEFUND_TEST_BASE_URL", "http://127.0.0.1:54321").is_err());
        std::env::set_var("CATTLEFUND_TEST_BASE_URL", "https://abc.supabase.co/");
        assert_eq!(
            base_url("CATTLEFUND_TEST_BASE_URL", "http://127.0.0.1:54321").unwrap(),
            "https://abc.supabase.co"
        );
    }

    #[test]
    fn default_log_filters_parse() {
        for directives in [SERVER_LOG_FILTER, WORKER_LOG_FILTER] {
            assert!(EnvFilter::try_new(directives).is_ok(), "{}", directives);
        }
    }

    #[test]
    fn test_config_has_no_rate_limit() {
        let config = Config::for_database("sqlite::memory:");
        assert!(config.rate_limit.is_none());
        assert!(config.notify_email.is_none());
        assert_eq!(config.storage_bucket, "images");
    }
}
