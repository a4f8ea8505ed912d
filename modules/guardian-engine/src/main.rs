use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use guardian_common::{validate_fingerprint, validate_url, Config, ListType, VoteChoice};
use guardian_engine::{MemoryStore, Scanner};
use inference_client::InferenceClient;

#[derive(Parser)]
#[command(name = "guardian")]
#[command(about = "Trust verdicts for online media: is this content likely AI-generated?")]
#[command(version)]
struct Cli {
    /// JSON snapshot holding votes, lists and history between runs
    #[arg(long, global = true, default_value = "guardian-state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a URL and print the verdict as JSON
    Scan {
        url: String,

        #[arg(long)]
        fingerprint: String,

        /// Use standard thresholds instead of conservative ones
        #[arg(long)]
        lenient: bool,
    },

    /// Vote on a content id (e.g. youtube:dQw4w9WgXcQ)
    Vote {
        content_id: String,

        #[arg(long)]
        fingerprint: String,

        /// ai, not_ai or unsure
        vote: VoteChoice,
    },

    /// Manage per-user allow/block lists
    #[command(subcommand)]
    List(ListCommand),

    /// Print scan history, most recent first
    History {
        #[arg(long)]
        fingerprint: String,
    },

    /// Check the model inference service
    Health,
}

#[derive(Subcommand)]
enum ListCommand {
    /// Put a creator on the allow or block list
    Set {
        creator_id: String,

        /// allow or block
        list_type: ListType,

        #[arg(long)]
        fingerprint: String,
    },

    /// Show list entries
    Show {
        #[arg(long)]
        fingerprint: String,

        /// Only show entries of this type
        #[arg(long = "type")]
        list_type: Option<ListType>,
    },

    /// Remove a creator from the user's lists
    Remove {
        creator_id: String,

        #[arg(long)]
        fingerprint: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.log_redacted();

    let command = match cli.command {
        Commands::Health => return health(&config).await,
        other => other,
    };

    let store = Arc::new(MemoryStore::load(&cli.state, config.history_cap)?);
    let scanner = Scanner::from_config(&config, store.clone())?;

    match command {
        Commands::Scan {
            url,
            fingerprint,
            lenient,
        } => {
            validate_url(&url)?;
            validate_fingerprint(&fingerprint)?;
            let result = scanner.scan(url.trim(), &fingerprint, !lenient).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Vote {
            content_id,
            fingerprint,
            vote,
        } => {
            let outcome = scanner.vote(&content_id, &fingerprint, vote).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::List(ListCommand::Set {
            creator_id,
            list_type,
            fingerprint,
        }) => {
            scanner
                .set_list_entry(&fingerprint, &creator_id, list_type)
                .await?;
            info!(creator_id = %creator_id, list_type = list_type.as_str(), "List entry saved");
        }
        Commands::List(ListCommand::Show {
            fingerprint,
            list_type,
        }) => {
            let entries = scanner.list_entries(&fingerprint, list_type).await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::List(ListCommand::Remove {
            creator_id,
            fingerprint,
        }) => {
            scanner.remove_list_entry(&fingerprint, &creator_id).await?;
            info!(creator_id = %creator_id, "List entry removed");
        }
        Commands::History { fingerprint } => {
            let history = scanner.history(&fingerprint).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Commands::Health => {}
    }

    store.save(&cli.state)?;
    Ok(())
}

async fn health(config: &Config) -> Result<()> {
    let client = InferenceClient::new(&config.model_service_url, config.model_timeout)?;
    let ok = match client.health().await {
        Ok(ok) => ok,
        Err(e) => {
            warn!(url = %config.model_service_url, error = %e, "Model service unreachable");
            false
        }
    };
    println!("{}", serde_json::json!({ "modelService": ok }));
    Ok(())
}

/// Logs go to stderr so stdout stays clean JSON.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive("guardian=info".parse()?);

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
