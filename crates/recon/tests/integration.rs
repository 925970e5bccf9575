use std::collections::HashMap;
use std::path::PathBuf;

use shelfmerge_recon::load::{load_category_rows, load_source_rows};
use shelfmerge_recon::model::{CatalogResult, ConsolidatedProduct, Provenance, QuarantineReason, RemovalAction};
use shelfmerge_recon::{run, CatalogConfig, CatalogInput, Tables};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_config() -> String {
    std::fs::read_to_string(fixtures_dir().join("store.catalog.toml")).unwrap()
}

fn load_input(config: &CatalogConfig) -> CatalogInput {
    let dir = fixtures_dir();

    let mut records = HashMap::new();
    for source in &config.sources {
        let csv_path = dir.join(&source.file);
        let csv_data = std::fs::read_to_string(&csv_path)
            .unwrap_or_else(|e| panic!("cannot read {}: {e}", csv_path.display()));
        records.insert(source.name.clone(), load_source_rows(source, &csv_data).unwrap());
    }

    let mut category_rows = HashMap::new();
    for file in &config.category_files {
        let csv_data = std::fs::read_to_string(dir.join(&file.file)).unwrap();
        category_rows.insert(file.file.clone(), load_category_rows(file, &csv_data).unwrap());
    }

    CatalogInput { records, category_rows }
}

fn load_and_run(config_toml: &str) -> CatalogResult {
    let config = CatalogConfig::from_toml(config_toml).unwrap();
    let tables = Tables::compile(&config).unwrap();
    let input = load_input(&config);
    run(&config, &tables, &input).unwrap()
}

fn product<'a>(result: &'a CatalogResult, key: &str) -> &'a ConsolidatedProduct {
    result
        .products
        .iter()
        .find(|p| p.key == key)
        .unwrap_or_else(|| panic!("no product with key {key}"))
}

// -------------------------------------------------------------------------
// Grouping + variants
// -------------------------------------------------------------------------

#[test]
fn catalog_totals() {
    let result = load_and_run(&fixture_config());
    let s = &result.summary;

    assert_eq!(result.meta.config_name, "Grow Shop Catalog");
    assert_eq!(result.meta.sources_processed, vec!["current", "legacy", "vendor"]);
    assert!(result.meta.missing_sources.is_empty());
    assert_eq!(s.records_ingested, 14);
    assert_eq!(s.quarantined, 1);
    assert_eq!(s.products, 6);
    assert_eq!(s.heuristic_joins, 2);
    assert_eq!(s.joins_by_rule["alias_key"], 1);
    assert_eq!(s.joins_by_rule["prefix"], 1);
    assert_eq!(s.joins_by_rule["substring"], 1);
    assert_eq!(s.joins_by_rule["singleton"], 1);
}

#[test]
fn quart_and_qt_collapse_into_one_variant() {
    let result = load_and_run(&fixture_config());
    let p = product(&result, "florablend");

    assert_eq!(p.handle, "florablend");
    assert_eq!(p.title, "FloraBlend");
    assert_eq!(p.sources, vec!["current", "legacy", "vendor"]);

    let quarts: Vec<_> = p.variants.iter().filter(|v| v.size == "Quart").collect();
    assert_eq!(quarts.len(), 1);
    let quart = quarts[0];
    assert_eq!(quart.provenance, Provenance::Both);
    assert_eq!(quart.contributors, vec!["current:1", "legacy:1", "vendor:1"]);
    // pricing source overrides price, inventory feed overrides stock and cost
    assert_eq!(quart.price_cents, Some(2199));
    assert_eq!(quart.compare_at_cents, Some(2499));
    assert_eq!(quart.inventory, Some(42));
    assert_eq!(quart.cost_cents, Some(950));
    assert_eq!(quart.sku.as_deref(), Some("FB-QT"));
    assert_eq!(quart.barcode.as_deref(), Some("0123456789012"));
}

#[test]
fn gallon_and_two_and_a_half_gallon_stay_distinct() {
    let result = load_and_run(&fixture_config());
    let p = product(&result, "florablend");

    let sizes: Vec<&str> = p.variants.iter().map(|v| v.size.as_str()).collect();
    assert_eq!(sizes, ["Quart", "Gallon", "2.5 Gallon"]);
    assert!(p.variants.windows(2).all(|w| w[0].rank < w[1].rank));
    assert_eq!(p.variants[2].price_cents, Some(10_999));
}

#[test]
fn alias_join_merges_singular_spelling() {
    let result = load_and_run(&fixture_config());
    let p = product(&result, "calmagplusnutrients");

    assert_eq!(p.sources, vec!["current", "legacy"]);
    assert_eq!(p.variants.len(), 1);
    assert_eq!(p.variants[0].provenance, Provenance::Both);
    assert_eq!(p.variants[0].price_cents, Some(2399));
    assert!(p.match_notes.is_empty(), "alias joins are not heuristic");
}

#[test]
fn heuristic_joins_are_noted() {
    let result = load_and_run(&fixture_config());

    let root = product(&result, "rootjuiceorganic");
    let sizes: Vec<&str> = root.variants.iter().map(|v| v.size.as_str()).collect();
    assert_eq!(sizes, ["500 ml", "1 Liter"]);
    assert_eq!(root.variants[0].provenance, Provenance::Pricing);
    assert_eq!(root.match_notes.len(), 1);
    assert!(root.match_notes[0].contains("legacy:3"));
    assert!(root.match_notes[0].contains("prefix"));

    let candy = product(&result, "budcandy");
    assert_eq!(candy.vendor.as_deref(), Some("Advanced Nutrients"));
    assert_eq!(candy.match_notes.len(), 1);
    assert!(candy.match_notes[0].contains("substring"));
}

#[test]
fn empty_base_title_gets_singleton_group() {
    let result = load_and_run(&fixture_config());
    let p = product(&result, "#legacy:xx1");
    assert_eq!(p.title, "Gallon");
    assert_eq!(p.variants.len(), 1);
    assert_eq!(p.variants[0].size, "Gallon");
}

#[test]
fn invalid_title_is_quarantined() {
    let result = load_and_run(&fixture_config());

    assert_eq!(result.quarantine.len(), 1);
    let q = &result.quarantine[0];
    assert_eq!(q.source, "current");
    assert_eq!(q.row, 6);
    assert_eq!(q.reason, QuarantineReason::InvalidTitle);
    assert_eq!(q.reason.to_string(), "invalid title");

    let contributed = result
        .products
        .iter()
        .flat_map(|p| &p.variants)
        .flat_map(|v| &v.contributors)
        .any(|c| c == "current:6");
    assert!(!contributed);
}

#[test]
fn confidence_reflects_completeness() {
    let result = load_and_run(&fixture_config());
    // description, vendor, manufacturer, type, one barcode, price, stock
    assert_eq!(product(&result, "florablend").confidence, 85);
    // title only plus a price
    assert_eq!(product(&result, "#legacy:xx1").confidence, 10);
    assert!(result.products.iter().all(|p| p.confidence <= 100));
}

// -------------------------------------------------------------------------
// Categories
// -------------------------------------------------------------------------

#[test]
fn removal_rule_drops_row_and_logs_once() {
    let result = load_and_run(&fixture_config());

    assert_eq!(result.removal_log.len(), 1);
    let entry = &result.removal_log[0];
    assert_eq!(entry.source_file, "categories/nutrients.csv");
    assert_eq!(entry.row, 2);
    assert_eq!(entry.identity, "sku:onagel4");
    assert_eq!(entry.action, RemovalAction::Removed);

    let ona = result
        .category_assignments
        .iter()
        .find(|a| a.identity == "sku:onagel4")
        .unwrap();
    assert_eq!(ona.primary_category, "odor_control");
    assert!(!ona.conflict);
    assert_eq!(ona.claim_count, 1);
    assert_eq!(product(&result, "onagelfreshlinen").category.as_deref(), Some("odor_control"));
}

#[test]
fn single_claim_is_unambiguous() {
    let result = load_and_run(&fixture_config());
    let a = result
        .category_assignments
        .iter()
        .find(|a| a.identity == "sku:rj1l")
        .unwrap();
    assert_eq!(a.primary_category, "nutrients");
    assert!(!a.conflict);
}

#[test]
fn competing_claims_resolve_by_priority() {
    let result = load_and_run(&fixture_config());

    assert_eq!(result.summary.category_identities, 4);
    assert_eq!(result.summary.category_conflicts, 1);
    assert_eq!(result.conflicts.len(), 1);

    let c = &result.conflicts[0];
    assert_eq!(c.identity, "sku:cmpqt");
    assert_eq!(c.primary_category, "nutrients");
    let labels: Vec<&str> = c.claims.iter().map(|s| s.category.as_str()).collect();
    assert_eq!(labels, ["nutrients", "hydroponics"]);

    assert_eq!(product(&result, "calmagplusnutrients").category.as_deref(), Some("nutrients"));
}

#[test]
fn reversed_priority_changes_winner() {
    let toml = fixture_config().replace(
        "[[categories.rules]]",
        "[categories]\npriority = [\"hydroponics\", \"nutrients\", \"odor_control\"]\n\n[[categories.rules]]",
    );
    let result = load_and_run(&toml);
    assert_eq!(result.conflicts[0].primary_category, "hydroponics");
    assert_eq!(result.removal_log.len(), 1);
}

// -------------------------------------------------------------------------
// Order, determinism, output contract
// -------------------------------------------------------------------------

#[test]
fn ingestion_order_is_part_of_the_contract() {
    let default_order = load_and_run(&fixture_config());
    assert!(default_order.products.iter().any(|p| p.key == "budcandy"));

    // vendor feed first: the longer title founds the group
    let swapped = fixture_config().replace("priority = 3", "priority = 0");
    let vendor_first = load_and_run(&swapped);
    assert!(vendor_first.products.iter().any(|p| p.key == "organicbudcandypro"));
    assert!(!vendor_first.products.iter().any(|p| p.key == "budcandy"));
    assert_eq!(vendor_first.meta.sources_processed, vec!["vendor", "current", "legacy"]);
}

#[test]
fn runs_are_deterministic() {
    let a = load_and_run(&fixture_config());
    let b = load_and_run(&fixture_config());
    assert_eq!(a.products, b.products);
    assert_eq!(a.summary, b.summary);
    assert_eq!(a.category_assignments, b.category_assignments);
    assert_eq!(a.conflicts, b.conflicts);
    assert_eq!(a.removal_log, b.removal_log);
    assert_eq!(a.quarantine, b.quarantine);
}

#[test]
fn json_output_round_trips() {
    let result = load_and_run(&fixture_config());
    let json = serde_json::to_string_pretty(&result).unwrap();
    let parsed: CatalogResult = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, result);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["removal_log"][0]["action"], "removed");
    assert_eq!(value["quarantine"][0]["reason"], "invalid_title");
}

#[test]
fn missing_optional_source_is_reported() {
    let config = CatalogConfig::from_toml(&fixture_config()).unwrap();
    let tables = Tables::compile(&config).unwrap();
    let mut input = load_input(&config);
    input.records.remove("vendor");

    let result = run(&config, &tables, &input).unwrap();
    assert_eq!(result.meta.missing_sources, vec!["vendor"]);
    assert_eq!(result.summary.records_ingested, 12);
    // without the feed the group keeps the legacy cost
    let quart = &product(&result, "florablend").variants[0];
    assert_eq!(quart.cost_cents, Some(1100));
    assert_eq!(quart.inventory, Some(10));
}
