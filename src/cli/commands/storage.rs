use clap::{Arg, ArgAction, Command};

pub const ARG_DSN: &str = "dsn";
pub const ARG_IN_MEMORY: &str = "in-memory";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .long_help(
                    "PostgreSQL connection string. The street_address_lines table is created on startup when missing.",
                )
                .env("STREET_ADDRESS_LINES_DSN")
                .required_unless_present(ARG_IN_MEMORY),
        )
        .arg(
            Arg::new(ARG_IN_MEMORY)
                .long("in-memory")
                .help("Keep street address lines in process memory instead of PostgreSQL")
                .env("STREET_ADDRESS_LINES_IN_MEMORY")
                .action(ArgAction::SetTrue)
                .conflicts_with(ARG_DSN),
        )
}
