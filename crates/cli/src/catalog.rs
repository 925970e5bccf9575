//! `shelfmerge run` / `shelfmerge validate`: config-driven catalog
//! consolidation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use tracing::{info, warn};

use shelfmerge_recon::load::{load_category_rows, load_source_rows};
use shelfmerge_recon::{CatalogConfig, CatalogError, CatalogInput, CatalogResult, Tables};

use crate::exit_codes::{
    EXIT_CATALOG_INVALID_CONFIG, EXIT_CATALOG_QUARANTINE, EXIT_CATALOG_RUNTIME, EXIT_ERROR,
    EXIT_USAGE,
};
use crate::CliError;

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Reconcile every configured source and category file
    #[command(after_help = "\
Examples:
  shelfmerge run store.catalog.toml
  shelfmerge run store.catalog.toml --json
  shelfmerge run store.catalog.toml --output catalog.json --fail-on-quarantine")]
    Run {
        /// Path to the .catalog.toml config file
        config: PathBuf,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit with code 5 when any row was quarantined
        #[arg(long)]
        fail_on_quarantine: bool,
    },

    /// Parse, validate and compile a config without running
    #[command(after_help = "\
Examples:
  shelfmerge validate store.catalog.toml")]
    Validate {
        /// Path to the .catalog.toml config file
        config: PathBuf,
    },
}

pub fn cmd_catalog(cmd: CatalogCommands) -> Result<(), CliError> {
    match cmd {
        CatalogCommands::Run { config, json, output, fail_on_quarantine } => {
            cmd_run(config, json, output, fail_on_quarantine)
        }
        CatalogCommands::Validate { config } => cmd_validate(config),
    }
}

fn config_err(e: CatalogError) -> CliError {
    CliError::new(EXIT_CATALOG_INVALID_CONFIG, e.to_string())
}

fn runtime_err(msg: impl Into<String>) -> CliError {
    CliError::new(EXIT_CATALOG_RUNTIME, msg)
}

/// Read, parse and compile. Shared by `run` and `validate`.
fn load_config(config_path: &Path) -> Result<(CatalogConfig, Tables), CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::new(EXIT_USAGE, format!("cannot read config {}: {e}", config_path.display()))
            .with_hint("pass the path to a .catalog.toml file")
    })?;
    let config = CatalogConfig::from_toml(&config_str).map_err(config_err)?;
    let tables = Tables::compile(&config).map_err(config_err)?;
    Ok((config, tables))
}

/// Missing or unreadable files are skipped with a warning; the engine
/// records them as missing sources.
fn read_optional(path: &Path, what: &str) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(data) => Some(data),
        Err(e) => {
            warn!("{what} {}: {e}; skipping", path.display());
            None
        }
    }
}

fn load_input(config: &CatalogConfig, base_dir: &Path) -> Result<CatalogInput, CliError> {
    let mut records = HashMap::new();
    for source in config.sources_by_priority() {
        let path = base_dir.join(&source.file);
        let label = if source.required { "required source" } else { "source" };
        let Some(csv_data) = read_optional(&path, &format!("{label} '{}'", source.name)) else {
            continue;
        };
        let rows = load_source_rows(source, &csv_data).map_err(|e| runtime_err(e.to_string()))?;
        info!("loaded {} rows from '{}'", rows.len(), source.name);
        records.insert(source.name.clone(), rows);
    }

    let mut category_rows = HashMap::new();
    for file in &config.category_files {
        let path = base_dir.join(&file.file);
        let Some(csv_data) = read_optional(&path, "category file") else {
            continue;
        };
        let rows = load_category_rows(file, &csv_data).map_err(|e| runtime_err(e.to_string()))?;
        category_rows.insert(file.file.clone(), rows);
    }

    Ok(CatalogInput { records, category_rows })
}

fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    fail_on_quarantine: bool,
) -> Result<(), CliError> {
    let (config, tables) = load_config(&config_path)?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let input = load_input(&config, base_dir)?;

    let result = shelfmerge_recon::run(&config, &tables, &input)
        .map_err(|e| runtime_err(e.to_string()))?;

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| runtime_err(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    eprintln!("{}", human_summary(&result));

    if fail_on_quarantine && result.summary.quarantined > 0 {
        return Err(CliError::new(
            EXIT_CATALOG_QUARANTINE,
            format!("{} rows quarantined", result.summary.quarantined),
        )
        .with_hint("see the \"quarantine\" array in the JSON output"));
    }
    Ok(())
}

fn human_summary(result: &CatalogResult) -> String {
    let s = &result.summary;
    let mut line = format!(
        "{}: {} records -> {} products, {} variants (mean confidence {}), {} quarantined, {} category conflicts, {} removals",
        result.meta.config_name,
        s.records_ingested,
        s.products,
        s.variants,
        s.mean_confidence,
        s.quarantined,
        s.category_conflicts,
        s.removals,
    );
    if !result.meta.missing_sources.is_empty() {
        line.push_str(&format!("; missing: {}", result.meta.missing_sources.join(", ")));
    }
    line
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let (config, _tables) = load_config(&config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    for source in &config.sources {
        if !base_dir.join(&source.file).exists() {
            warn!("source '{}': {} not found", source.name, source.file);
        }
    }
    for file in &config.category_files {
        if !base_dir.join(&file.file).exists() {
            warn!("category file {} not found", file.file);
        }
    }

    eprintln!(
        "config ok: {} sources, {} category files, {} size rules, {} category rules",
        config.sources.len(),
        config.category_files.len(),
        config.sizes.len(),
        config.categories.rules.len(),
    );
    Ok(())
}
