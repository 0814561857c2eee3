use clap::Parser;
use equity_close::args::{Args, Command};
use equity_close::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().eqclose_home().path();

    // This allows for testing the program without an accounting system. When
    // EQCLOSE_IN_TEST_MODE is set and non-zero in length, then the mode will
    // be Mode::Testing, otherwise it will be Mode::Live.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),

        Command::Generate(generate_args) => {
            let config = Config::load(home).await?;
            commands::generate(config, generate_args.clone())
                .await?
                .print()
        }

        Command::Approve(batch_args) => {
            let config = Config::load(home).await?;
            commands::approve(config, batch_args.clone()).await?.print()
        }

        Command::Reject(batch_args) => {
            let config = Config::load(home).await?;
            commands::reject(config, batch_args.clone()).await?.print()
        }

        Command::Push => {
            let config = Config::load(home).await?;
            commands::push(config, mode).await?.print()
        }

        Command::List => {
            let config = Config::load(home).await?;
            commands::list(config).await?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
