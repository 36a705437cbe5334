use crate::{
    addresses::{
        InMemoryRepository, PgStreetAddressLineRepository, SharedStreetAddressLineRepository,
        StreetAddressLine,
    },
    api,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    Postgres { dsn: String },
    InMemory,
}

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub storage: Storage,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable, the schema cannot be applied, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let repository: SharedStreetAddressLineRepository = match args.storage {
        Storage::Postgres { dsn } => {
            let repository = PgStreetAddressLineRepository::connect(&dsn).await?;
            repository.ensure_schema().await?;
            Arc::new(repository)
        }
        Storage::InMemory => {
            warn!("Using in-memory storage, street address lines are lost on restart");
            Arc::new(InMemoryRepository::<StreetAddressLine>::new())
        }
    };

    api::new(args.port, repository).await
}

fn log_startup_args(args: &Args) {
    let storage = match &args.storage {
        Storage::Postgres { dsn } => format!("postgres ({})", redact_dsn(dsn)),
        Storage::InMemory => "in-memory".to_string(),
    };
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("storage", storage),
    ];
    log_entries("Startup configuration", &entries);
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\n{title}:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}
