use std::env;
use std::process::ExitCode;

use cattlefund::config::{self, Config};
use cattlefund::jobs::{run_link_investor_accounts, run_recompute_raised};
use cattlefund::services::SupabaseAuth;
use dotenvy::dotenv;
use sea_orm::Database;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

const USAGE: &str = "usage: cattlefund-worker [--link-investor-accounts] [--recompute-raised]";

async fn run(link_accounts: bool, recompute: bool) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let db = Database::connect(&config.database_url).await?;

    if link_accounts {
        let password = env::var("INVESTOR_DEFAULT_PASSWORD")
            .map_err(|_| anyhow::anyhow!("INVESTOR_DEFAULT_PASSWORD must be set for --link-investor-accounts"))?;
        let auth = SupabaseAuth::new(
            reqwest::Client::new(),
            &config.supabase_url,
            &config.supabase_anon_key,
            &config.supabase_service_role_key,
        );
        let summary = run_link_investor_accounts(&db, &auth, &password).await?;
        info!(
            linked = summary.linked,
            created = summary.accounts_created,
            errors = summary.errors,
            "link-investor-accounts done"
        );
    }

    if recompute {
        let projects = run_recompute_raised(&db).await?;
        info!(projects, "recompute-raised done");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env (if present) so DATABASE_URL and RUST_LOG from file are visible
    let _ = dotenv();

    // Initialise tracing (RUST_LOG, INFO by default)
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(config::log_filter(config::WORKER_LOG_FILTER))
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Command-line flags
    let args: Vec<String> = env::args().collect();
    let link_accounts = args.iter().any(|a| a == "--link-investor-accounts");
    let recompute = args.iter().any(|a| a == "--recompute-raised");

    if !link_accounts && !recompute {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    }

    match run(link_accounts, recompute).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(?e, "worker failed");
            ExitCode::FAILURE
        }
    }
}
