// shelfmerge - consolidate storefront and vendor exports into one catalog

mod catalog;
mod exit_codes;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use exit_codes::EXIT_SUCCESS;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SHELFMERGE_COMMIT"), ")");

#[derive(Parser)]
#[command(name = "shelfmerge")]
#[command(about = "Reconcile product exports from several sources into one canonical catalog")]
#[command(version = VERSION)]
struct Cli {
    /// Log filter such as "debug" or "shelfmerge_recon=debug" [default: RUST_LOG, else info]
    #[arg(long, global = true, env = "SHELFMERGE_LOG")]
    log: Option<String>,

    #[command(subcommand)]
    command: catalog::CatalogCommands,
}

/// Logs go to stderr so `--json` stdout stays a single JSON value. The
/// subscriber also collects the engine's `log` records.
fn init_logging(directive: Option<&str>) {
    let filter = match directive {
        Some(d) => EnvFilter::new(d),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    match catalog::cmd_catalog(cli.command) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
