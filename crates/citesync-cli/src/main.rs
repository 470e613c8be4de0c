mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use citesync_providers::ProviderRegistry;

#[derive(Debug, Parser)]
#[command(name = "citesync-cli")]
#[command(about = "Citation submission engine command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load the domain inventory file and the provider catalog into the database
    Seed {
        /// Override the configured domains.yaml path
        #[arg(long)]
        domains_path: Option<std::path::PathBuf>,
    },
    /// Queue citation submissions for one domain or the whole inventory
    Queue {
        /// Domain host to queue (omit with --all)
        host: Option<String>,

        /// Queue every active domain in the inventory
        #[arg(long)]
        all: bool,

        /// Restrict to a single provider slug
        #[arg(long)]
        provider: Option<String>,

        /// Priority for the created queue items (higher drains first)
        #[arg(long)]
        priority: Option<i32>,

        /// Group the created queue items under a named batch
        #[arg(long)]
        batch: Option<String>,
    },
    /// Run one drain cycle over due queue items
    Drain {
        /// Maximum number of items to process
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Queue verification probes for a domain's existing listings
    Verify {
        host: String,

        /// Restrict to a single provider slug
        #[arg(long)]
        provider: Option<String>,
    },
    /// Queue deletion of one (domain, provider) listing
    Remove {
        host: String,

        #[arg(long)]
        provider: String,
    },
    /// Show the provider catalog and adapter configuration status
    Providers {
        /// Enable a provider by slug
        #[arg(long)]
        enable: Option<String>,

        /// Disable a provider by slug
        #[arg(long)]
        disable: Option<String>,
    },
    /// Show citation coverage for a domain
    Coverage { host: String },
    /// List recent batches, or cancel one
    Batches {
        /// Filter by status (pending, processing, completed, failed, cancelled)
        #[arg(long)]
        status: Option<String>,

        /// Maximum number of batches to show
        #[arg(long, default_value_t = 20)]
        limit: i64,

        /// Cancel a batch by its public id, abandoning its pending items
        #[arg(long, value_name = "PUBLIC_ID")]
        cancel: Option<uuid::Uuid>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = citesync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let pool_config = citesync_db::PoolConfig::from_app_config(&config);
    let pool = citesync_db::connect_pool(&config.database_url, pool_config).await?;
    citesync_db::run_migrations(&pool).await?;

    let registry = ProviderRegistry::from_config(&config)?;

    match cli.command {
        Commands::Seed { domains_path } => {
            commands::seed::run(&pool, &config, domains_path.as_deref()).await?;
        }
        Commands::Queue {
            host,
            all,
            provider,
            priority,
            batch,
        } => {
            commands::queue::run(
                &pool,
                &registry,
                &config,
                commands::queue::QueueArgs {
                    host,
                    all,
                    provider,
                    priority,
                    batch,
                },
            )
            .await?;
        }
        Commands::Drain { limit } => {
            commands::drain::run(&pool, &registry, limit.unwrap_or(config.drain_batch_size))
                .await?;
        }
        Commands::Verify { host, provider } => {
            commands::queue::run_verify(&pool, &registry, &config, &host, provider).await?;
        }
        Commands::Remove { host, provider } => {
            commands::queue::run_remove(&pool, &config, &host, &provider).await?;
        }
        Commands::Providers { enable, disable } => {
            commands::report::providers(&pool, &registry, enable, disable).await?;
        }
        Commands::Coverage { host } => {
            commands::report::coverage(&pool, &host).await?;
        }
        Commands::Batches {
            status,
            limit,
            cancel,
        } => {
            if let Some(public_id) = cancel {
                commands::report::cancel_batch(&pool, public_id).await?;
            } else {
                commands::report::batches(&pool, status.as_deref(), limit).await?;
            }
        }
    }

    Ok(())
}
