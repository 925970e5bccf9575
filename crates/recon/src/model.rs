use serde::{Deserialize, Serialize};

use crate::config::SourceKind;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Current-storefront row: authoritative descriptive content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRow {
    pub handle: String,
    pub title: String,
    pub sku: String,
    pub vendor: String,
    pub description: String,
    pub product_type: String,
    pub tags: String,
    pub barcode: String,
    pub price_cents: Option<i64>,
    pub compare_at_cents: Option<i64>,
    pub inventory: Option<i64>,
    pub weight: String,
}

/// Legacy-storefront row: identifiers and pricing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingRow {
    pub sku: String,
    pub handle: String,
    pub title: String,
    pub brand: String,
    pub category: String,
    pub barcode: String,
    pub price_cents: Option<i64>,
    pub compare_at_cents: Option<i64>,
    pub cost_cents: Option<i64>,
    pub inventory: Option<i64>,
    pub weight: String,
}

/// Vendor inventory feed row: stock, cost and manufacturer data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub sku: String,
    pub title: String,
    pub vendor: String,
    pub manufacturer: String,
    pub category: String,
    pub barcode: String,
    pub cost_cents: Option<i64>,
    pub price_cents: Option<i64>,
    pub inventory: Option<i64>,
    pub weight: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceFields {
    Content(ContentRow),
    Pricing(PricingRow),
    Inventory(InventoryRow),
}

/// One row from one source, read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Configured source name.
    pub source: String,
    /// 1-based data row within the source file.
    pub row: usize,
    pub fields: SourceFields,
}

fn non_empty(s: &str) -> Option<&str> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t)
    }
}

impl RawRecord {
    pub fn new(source: impl Into<String>, row: usize, fields: SourceFields) -> Self {
        Self {
            source: source.into(),
            row,
            fields,
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self.fields {
            SourceFields::Content(_) => SourceKind::Content,
            SourceFields::Pricing(_) => SourceKind::Pricing,
            SourceFields::Inventory(_) => SourceKind::Inventory,
        }
    }

    pub fn title(&self) -> &str {
        match &self.fields {
            SourceFields::Content(r) => &r.title,
            SourceFields::Pricing(r) => &r.title,
            SourceFields::Inventory(r) => &r.title,
        }
    }

    pub fn sku(&self) -> Option<&str> {
        match &self.fields {
            SourceFields::Content(r) => non_empty(&r.sku),
            SourceFields::Pricing(r) => non_empty(&r.sku),
            SourceFields::Inventory(r) => non_empty(&r.sku),
        }
    }

    pub fn handle(&self) -> Option<&str> {
        match &self.fields {
            SourceFields::Content(r) => non_empty(&r.handle),
            SourceFields::Pricing(r) => non_empty(&r.handle),
            SourceFields::Inventory(_) => None,
        }
    }

    pub fn vendor(&self) -> Option<&str> {
        match &self.fields {
            SourceFields::Content(r) => non_empty(&r.vendor),
            SourceFields::Pricing(r) => non_empty(&r.brand),
            SourceFields::Inventory(r) => non_empty(&r.vendor),
        }
    }

    pub fn manufacturer(&self) -> Option<&str> {
        match &self.fields {
            SourceFields::Inventory(r) => non_empty(&r.manufacturer),
            _ => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match &self.fields {
            SourceFields::Content(r) => non_empty(&r.description),
            _ => None,
        }
    }

    /// Product type for content rows, category text for the others.
    pub fn product_type(&self) -> Option<&str> {
        match &self.fields {
            SourceFields::Content(r) => non_empty(&r.product_type),
            SourceFields::Pricing(r) => non_empty(&r.category),
            SourceFields::Inventory(r) => non_empty(&r.category),
        }
    }

    pub fn tags(&self) -> Option<&str> {
        match &self.fields {
            SourceFields::Content(r) => non_empty(&r.tags),
            _ => None,
        }
    }

    pub fn barcode(&self) -> Option<&str> {
        match &self.fields {
            SourceFields::Content(r) => non_empty(&r.barcode),
            SourceFields::Pricing(r) => non_empty(&r.barcode),
            SourceFields::Inventory(r) => non_empty(&r.barcode),
        }
    }

    pub fn price_cents(&self) -> Option<i64> {
        match &self.fields {
            SourceFields::Content(r) => r.price_cents,
            SourceFields::Pricing(r) => r.price_cents,
            SourceFields::Inventory(r) => r.price_cents,
        }
    }

    pub fn compare_at_cents(&self) -> Option<i64> {
        match &self.fields {
            SourceFields::Content(r) => r.compare_at_cents,
            SourceFields::Pricing(r) => r.compare_at_cents,
            SourceFields::Inventory(_) => None,
        }
    }

    pub fn cost_cents(&self) -> Option<i64> {
        match &self.fields {
            SourceFields::Content(_) => None,
            SourceFields::Pricing(r) => r.cost_cents,
            SourceFields::Inventory(r) => r.cost_cents,
        }
    }

    pub fn inventory(&self) -> Option<i64> {
        match &self.fields {
            SourceFields::Content(r) => r.inventory,
            SourceFields::Pricing(r) => r.inventory,
            SourceFields::Inventory(r) => r.inventory,
        }
    }

    pub fn weight(&self) -> Option<&str> {
        match &self.fields {
            SourceFields::Content(r) => non_empty(&r.weight),
            SourceFields::Pricing(r) => non_empty(&r.weight),
            SourceFields::Inventory(r) => non_empty(&r.weight),
        }
    }
}

/// One row of a category master file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub source_file: String,
    pub row: usize,
    pub title: String,
    pub sku: String,
    pub handle: String,
    pub category: String,
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// How a record joined its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// First record of a new group.
    Created,
    ExactKey,
    AliasKey,
    Prefix,
    Substring,
    /// Empty base key: private group keyed by sku/handle.
    Singleton,
}

impl MatchRule {
    pub fn is_heuristic(&self) -> bool {
        matches!(self, Self::Prefix | Self::Substring)
    }
}

impl std::fmt::Display for MatchRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::ExactKey => write!(f, "exact_key"),
            Self::AliasKey => write!(f, "alias_key"),
            Self::Prefix => write!(f, "prefix"),
            Self::Substring => write!(f, "substring"),
            Self::Singleton => write!(f, "singleton"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub record: RawRecord,
    /// The record's own normalized key (empty for singletons' titles).
    pub key: String,
    pub rule: MatchRule,
}

/// Canonical identity: every record judged to describe one base product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductGroup {
    pub key: String,
    pub base_title: String,
    pub handle: String,
    pub aliases: Vec<String>,
    /// Members in ingestion order (source priority, then row order).
    pub members: Vec<GroupMember>,
}

impl ProductGroup {
    /// Distinct source names, in first-contribution order.
    pub fn sources(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for m in &self.members {
            if !out.contains(&m.record.source) {
                out.push(m.record.source.clone());
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Quarantine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuarantineReason {
    /// No letters at all.
    InvalidTitle,
    TitleTooShort,
    /// Reads like a stray description sentence, not a product name.
    DescriptionFragment,
    ForbiddenHandle,
}

impl std::fmt::Display for QuarantineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "invalid title"),
            Self::TitleTooShort => write!(f, "title too short"),
            Self::DescriptionFragment => write!(f, "description fragment"),
            Self::ForbiddenHandle => write!(f, "forbidden handle"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantineEntry {
    pub source: String,
    pub row: usize,
    pub title: String,
    pub reason: QuarantineReason,
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Variants + products
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Content,
    Pricing,
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub size: String,
    pub rank: u32,
    pub sku: Option<String>,
    pub price_cents: Option<i64>,
    pub compare_at_cents: Option<i64>,
    pub cost_cents: Option<i64>,
    pub barcode: Option<String>,
    pub inventory: Option<i64>,
    pub weight: Option<String>,
    pub provenance: Provenance,
    /// `source:row` of every record that contributed.
    pub contributors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedProduct {
    pub handle: String,
    pub key: String,
    pub title: String,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub manufacturer: Option<String>,
    pub product_type: Option<String>,
    /// Primary category from the category master files, when one of the
    /// product's identities appears there.
    pub category: Option<String>,
    pub sources: Vec<String>,
    pub variants: Vec<Variant>,
    pub confidence: u8,
    /// Heuristic joins worth a human look.
    pub match_notes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryClaim {
    pub identity: String,
    pub category: String,
    pub source_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSource {
    pub category: String,
    pub source_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub identity: String,
    pub primary_category: String,
    pub conflict: bool,
    pub claim_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub identity: String,
    pub primary_category: String,
    pub claims: Vec<ClaimSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RemovalAction {
    Removed,
    Reassigned { to: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalLogEntry {
    /// 1-based position of the rule in the configured list.
    pub rule: usize,
    pub pattern: String,
    pub source_file: String,
    pub row: usize,
    pub identity: String,
    pub title: String,
    pub from_category: String,
    #[serde(flatten)]
    pub action: RemovalAction,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub records_ingested: usize,
    pub quarantined: usize,
    pub products: usize,
    pub variants: usize,
    pub heuristic_joins: usize,
    pub joins_by_rule: std::collections::BTreeMap<String, usize>,
    pub mean_confidence: u8,
    pub category_identities: usize,
    pub category_conflicts: usize,
    pub removals: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub sources_processed: Vec<String>,
    pub missing_sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogResult {
    pub meta: CatalogMeta,
    pub summary: CatalogSummary,
    pub products: Vec<ConsolidatedProduct>,
    pub conflicts: Vec<ConflictRecord>,
    pub category_assignments: Vec<CategoryAssignment>,
    pub removal_log: Vec<RemovalLogEntry>,
    pub quarantine: Vec<QuarantineEntry>,
}
