use anyhow::{bail, Context};
use clap::Parser;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use jobboard_cli::{Command, Config};
use jobboard_client::OpenAiClient;
use jobboard_core::config::{load_settings, Settings};
use jobboard_core::describe::{DescriptionGenerator, DisabledGenerator};
use jobboard_core::models::{looks_like_email, NewUser, Role};
use jobboard_db::{StatsRepository, UserRepository};
use jobboard_server::auth::hash_password;
use jobboard_server::AppState;
use sqlx::PgPool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Logs go to stderr so `stats` output stays clean on stdout
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = Config::parse();
    let settings = load_settings(config.config.as_deref()).context("Failed to load settings")?;

    info!("Connecting to database...");
    let pool = jobboard_db::connect(&config.database_url, &settings.db)
        .await
        .context("Failed to connect to database")?;

    match config.command {
        Command::Serve { ref host, port } => {
            serve(&config, &settings, pool, host, port).await?;
        }
        Command::Migrate => {
            jobboard_db::migrate(&pool)
                .await
                .context("Failed to apply migrations")?;
            info!("Migrations applied");
        }
        Command::Stats => {
            show_stats(&StatsRepository::new(pool)).await?;
        }
        Command::CheckCounters => {
            check_counters(&StatsRepository::new(pool)).await?;
        }
        Command::CreateAdmin {
            name,
            email,
            password,
            super_admin,
        } => {
            let role = if super_admin {
                Role::SuperAdmin
            } else {
                Role::Admin
            };
            create_admin(&UserRepository::new(pool), &name, &email, &password, role).await?;
        }
    }

    Ok(())
}

async fn serve(
    config: &Config,
    settings: &Settings,
    pool: PgPool,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let secret = config
        .jwt_secret
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .context("JWT_SECRET must be set to serve the API")?;

    let generator: Arc<dyn DescriptionGenerator> = match config.openai_api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => Arc::new(
            OpenAiClient::new(key, config.openai_base_url.as_deref(), &settings.http)
                .context("Invalid OpenAI client configuration")?,
        ),
        _ => {
            warn!("OPENAI_API_KEY not set, description generation is disabled");
            Arc::new(DisabledGenerator)
        }
    };

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let state = AppState::new(pool, generator, secret, settings);
    jobboard_server::listen(state, addr)
        .await
        .context("Server failed")?;
    Ok(())
}

/// Show database statistics
async fn show_stats(repo: &StatsRepository) -> anyhow::Result<()> {
    let stats = repo.get_stats().await?;

    println!("\nDatabase Statistics\n");
    println!("  Jobs:                  {}", stats.jobs);
    println!("  Categories:            {}", stats.categories);
    println!("  Companies:             {}", stats.companies);
    println!("  Job types:             {}", stats.job_types);
    println!("  Users:                 {} ({} active)", stats.users, stats.active_users);
    println!("  Media:                 {}", stats.media);
    if let Some(last) = stats.last_job_created {
        println!("  Last job created:      {}", last);
    }
    println!();

    Ok(())
}

/// Reports parents whose cached job count differs from the real one.
/// Exits with an error when any counter has drifted.
async fn check_counters(repo: &StatsRepository) -> anyhow::Result<()> {
    let report = repo.check_counters().await?;

    println!(
        "\nChecked {} counters: {} consistent, {} drifted\n",
        report.checked,
        report.consistent(),
        report.drifted.len()
    );
    for drift in &report.drifted {
        println!(
            "  {} {} ({}): stored {}, actual {} ({:+})",
            drift.entity,
            drift.name,
            drift.id,
            drift.stored,
            drift.actual,
            drift.delta()
        );
    }

    if !report.is_consistent() {
        bail!("{} job counters are out of sync", report.drifted.len());
    }
    Ok(())
}

async fn create_admin(
    repo: &UserRepository,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<()> {
    let name = name.trim();
    let email = email.trim().to_lowercase();
    if name.is_empty() {
        bail!("--name must not be blank");
    }
    if !looks_like_email(&email) {
        bail!("Invalid email: {}", email);
    }
    if password.chars().count() < 8 {
        bail!("Password must be at least 8 characters");
    }

    let user = repo
        .create(&NewUser {
            name: name.to_string(),
            email,
            password_hash: hash_password(password)?,
            role,
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    info!(user_id = %user.id, "created {:?} account for {}", user.role, user.email);
    Ok(())
}
