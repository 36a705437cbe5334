use crate::cli::{
    actions::{
        server::{Args, Storage},
        Action,
    },
    commands::{storage, ARG_PORT},
};
use anyhow::{Context, Result};

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let storage = if matches.get_flag(storage::ARG_IN_MEMORY) {
        Storage::InMemory
    } else {
        let dsn = matches
            .get_one::<String>(storage::ARG_DSN)
            .cloned()
            .context("missing required argument: --dsn")?;
        Storage::Postgres { dsn }
    };

    Ok(Action::Server(Args { port, storage }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    fn without_env<F: FnOnce() -> Result<()>>(f: F) -> Result<()> {
        temp_env::with_vars(
            [
                ("STREET_ADDRESS_LINES_PORT", None::<&str>),
                ("STREET_ADDRESS_LINES_DSN", None),
                ("STREET_ADDRESS_LINES_IN_MEMORY", None),
            ],
            f,
        )
    }

    #[test]
    fn dispatches_postgres_server() -> Result<()> {
        without_env(|| {
            let matches = commands::new().try_get_matches_from(vec![
                "street-address-lines",
                "--port",
                "3000",
                "--dsn",
                "postgres://localhost/addresses",
            ])?;

            let Action::Server(args) = handler(&matches)?;
            assert_eq!(args.port, 3000);
            assert_eq!(
                args.storage,
                Storage::Postgres {
                    dsn: "postgres://localhost/addresses".to_string()
                }
            );
            Ok(())
        })
    }

    #[test]
    fn dispatches_in_memory_server() -> Result<()> {
        without_env(|| {
            let matches = commands::new().try_get_matches_from(vec![
                "street-address-lines",
                "--in-memory",
                "-p",
                "8081",
            ])?;

            let Action::Server(args) = handler(&matches)?;
            assert_eq!(args.port, 8081);
            assert_eq!(args.storage, Storage::InMemory);
            Ok(())
        })
    }
}
