use std::collections::HashMap;

use log::{info, warn};

use crate::category::{CategoryResolver, UNCATEGORIZED};
use crate::config::CatalogConfig;
use crate::consolidate::{consolidate, product_identities};
use crate::error::CatalogError;
use crate::model::{CatalogMeta, CatalogResult, CategoryRow, RawRecord};
use crate::reconciler::{Ingestion, Reconciler};
use crate::summary::compute_summary;
use crate::tables::Tables;

/// Pre-loaded rows for one run.
#[derive(Debug, Clone, Default)]
pub struct CatalogInput {
    /// Source name → records in file order.
    pub records: HashMap<String, Vec<RawRecord>>,
    /// Category file path (as configured) → rows in file order.
    pub category_rows: HashMap<String, Vec<CategoryRow>>,
}

/// Incremental interface: feed records and category rows, then finalize.
/// Records must arrive in source priority order for stable grouping.
pub struct CatalogEngine<'t> {
    config_name: String,
    tables: &'t Tables,
    reconciler: Reconciler<'t>,
    categories: CategoryResolver<'t>,
    processed: Vec<String>,
    missing: Vec<String>,
}

impl<'t> CatalogEngine<'t> {
    pub fn new(config: &CatalogConfig, tables: &'t Tables) -> Self {
        let mut reconciler = Reconciler::new(tables);
        reconciler.set_source_order(
            config
                .sources_by_priority()
                .iter()
                .map(|s| s.name.clone())
                .collect(),
        );
        Self {
            config_name: config.name.clone(),
            tables,
            reconciler,
            categories: CategoryResolver::new(tables),
            processed: Vec::new(),
            missing: Vec::new(),
        }
    }

    pub fn ingest(&mut self, record: RawRecord) -> Ingestion {
        if !self.processed.contains(&record.source) {
            self.processed.push(record.source.clone());
        }
        self.reconciler.ingest(record)
    }

    pub fn claim(&mut self, row: CategoryRow) {
        self.categories.add_row(row);
    }

    /// Record a configured source that produced no rows.
    pub fn source_missing(&mut self, name: &str) {
        if !self.missing.iter().any(|m| m == name) {
            self.missing.push(name.to_string());
        }
    }

    /// Freeze grouping and category claims and build every output.
    pub fn finalize(self) -> CatalogResult {
        let reconciled = self.reconciler.finalize();
        let categories = self.categories.resolve();

        let primary: HashMap<&str, &str> = categories
            .assignments
            .iter()
            .filter(|a| a.primary_category != UNCATEGORIZED)
            .map(|a| (a.identity.as_str(), a.primary_category.as_str()))
            .collect();

        let products: Vec<_> = reconciled
            .groups
            .iter()
            .map(|group| {
                let category = product_identities(group)
                    .iter()
                    .find_map(|id| primary.get(id.as_str()))
                    .map(|c| c.to_string());
                consolidate(self.tables, group, category)
            })
            .collect();

        let summary = compute_summary(&reconciled, &products, &categories);
        info!(
            "{}: {} records -> {} products, {} variants, {} quarantined, {} category conflicts",
            self.config_name,
            summary.records_ingested,
            summary.products,
            summary.variants,
            summary.quarantined,
            summary.category_conflicts
        );

        CatalogResult {
            meta: CatalogMeta {
                config_name: self.config_name,
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
                sources_processed: self.processed,
                missing_sources: self.missing,
            },
            summary,
            products,
            conflicts: categories.conflicts,
            category_assignments: categories.assignments,
            removal_log: categories.removal_log,
            quarantine: reconciled.quarantine,
        }
    }
}

/// Run a whole catalog: sources in priority order, then category files in
/// configured order.
pub fn run(
    config: &CatalogConfig,
    tables: &Tables,
    input: &CatalogInput,
) -> Result<CatalogResult, CatalogError> {
    if let Some(name) = input.records.keys().find(|n| config.source(n).is_none()) {
        return Err(CatalogError::UnknownSource(name.clone()));
    }

    let mut engine = CatalogEngine::new(config, tables);

    for source in config.sources_by_priority() {
        match input.records.get(&source.name) {
            Some(rows) => {
                for record in rows {
                    engine.ingest(record.clone());
                }
            }
            None => {
                let kind = if source.required { "required" } else { "optional" };
                warn!(
                    "{kind} source '{}' ({}) has no data; continuing without it",
                    source.name, source.file
                );
                engine.source_missing(&source.name);
            }
        }
    }

    for file in &config.category_files {
        match input.category_rows.get(&file.file) {
            Some(rows) => {
                for row in rows {
                    engine.claim(row.clone());
                }
            }
            None => warn!("category file '{}' has no data; skipped", file.file),
        }
    }

    Ok(engine.finalize())
}
