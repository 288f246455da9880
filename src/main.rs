use anyhow::bail;
use clap::Parser;
use pantry_stock::args::{Args, Command};
use pantry_stock::{commands, Config, Result};
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
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().pantry_home().path();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),

        Command::Import(import_args) => {
            let config = Config::load(home).await?;
            let out = commands::import(
                config,
                import_args.file(),
                import_args.actor(),
                import_args.dry_run(),
            )
            .await?;
            out.print();
            if let Some(result) = out.structure() {
                if !result.success {
                    bail!("{} of {} rows failed to import", result.failed, result.processed());
                }
            }
        }

        Command::Items(items_args) => {
            let config = Config::load(home).await?;
            commands::items(config, items_args.format()).await?.print()
        }

        Command::Transactions(transactions_args) => {
            let config = Config::load(home).await?;
            commands::transactions(config, transactions_args.limit())
                .await?
                .print()
        }

        Command::Checkout(checkout_args) => {
            let config = Config::load(home).await?;
            commands::checkout(
                config,
                checkout_args.item(),
                checkout_args.quantity(),
                checkout_args.student(),
            )
            .await?
            .print()
        }

        Command::Report(report_args) => {
            let config = Config::load(home).await?;
            commands::report(config, report_args.days()).await?.print()
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
            // RUST_LOG does not exist; use default log level for the library and binary only.
            let lib = env!("CARGO_PKG_NAME").replace('-', "_");
            EnvFilter::new(format!("{lib}={level},{}={level}", env!("CARGO_BIN_NAME")))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
