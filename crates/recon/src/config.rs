use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::CatalogError;

/// Shortest key (in normalized characters) allowed to win a prefix match.
pub const DEFAULT_PREFIX_MIN_LEN: usize = 5;
/// Shortest key allowed to win a substring match.
pub const DEFAULT_SUBSTRING_MIN_LEN: usize = 5;
/// Minimum `min(len) / max(len)` for a substring match.
pub const DEFAULT_SUBSTRING_MIN_RATIO: f64 = 0.4;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub name: String,
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub category_files: Vec<CategoryFileConfig>,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub aliases: AliasConfig,
    #[serde(default = "defaults::size_rules")]
    pub sizes: Vec<SizeRuleConfig>,
    #[serde(default)]
    pub brands: BrandConfig,
    #[serde(default)]
    pub categories: CategoryConfig,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub kind: SourceKind,
    pub file: String,
    /// Lower numbers are ingested first.
    pub priority: u32,
    #[serde(default = "default_true")]
    pub required: bool,
    pub columns: ColumnMapping,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Authoritative for descriptive content (current storefront).
    Content,
    /// Prices and identifiers (legacy storefront).
    Pricing,
    /// Stock levels and costs (vendor inventory feed).
    Inventory,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Content => write!(f, "content"),
            Self::Pricing => write!(f, "pricing"),
            Self::Inventory => write!(f, "inventory"),
        }
    }
}

/// Record field → column header. Only `title` is mandatory; which of the
/// others a loader reads depends on the source kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnMapping {
    pub title: String,
    pub handle: Option<String>,
    pub sku: Option<String>,
    pub vendor: Option<String>,
    pub description: Option<String>,
    pub product_type: Option<String>,
    pub tags: Option<String>,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
    pub barcode: Option<String>,
    pub price: Option<String>,
    pub compare_at: Option<String>,
    pub cost: Option<String>,
    pub inventory: Option<String>,
    pub weight: Option<String>,
}

// ---------------------------------------------------------------------------
// Category master files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryFileConfig {
    pub file: String,
    /// Fixed category for every row in the file. Without it the file needs
    /// a `category` column.
    #[serde(default)]
    pub label: Option<String>,
    pub columns: CategoryColumns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryColumns {
    pub title: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// File name without directory or extension. Removal rules name category
/// files by this stem.
pub fn file_stem(file: &str) -> String {
    std::path::Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_prefix_min_len")]
    pub prefix_min_len: usize,
    #[serde(default = "default_substring_min_len")]
    pub substring_min_len: usize,
    #[serde(default = "default_substring_min_ratio")]
    pub substring_min_ratio: f64,
}

fn default_prefix_min_len() -> usize {
    DEFAULT_PREFIX_MIN_LEN
}

fn default_substring_min_len() -> usize {
    DEFAULT_SUBSTRING_MIN_LEN
}

fn default_substring_min_ratio() -> f64 {
    DEFAULT_SUBSTRING_MIN_RATIO
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            prefix_min_len: DEFAULT_PREFIX_MIN_LEN,
            substring_min_len: DEFAULT_SUBSTRING_MIN_LEN,
            substring_min_ratio: DEFAULT_SUBSTRING_MIN_RATIO,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_min_title_len")]
    pub min_title_len: usize,
    #[serde(default = "default_max_title_len")]
    pub max_title_len: usize,
    #[serde(default = "default_max_title_words")]
    pub max_title_words: usize,
    #[serde(default = "default_forbidden_handle_chars")]
    pub forbidden_handle_chars: String,
}

fn default_min_title_len() -> usize {
    3
}

fn default_max_title_len() -> usize {
    150
}

fn default_max_title_words() -> usize {
    25
}

fn default_forbidden_handle_chars() -> String {
    "{}:<>\"".into()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_title_len: default_min_title_len(),
            max_title_len: default_max_title_len(),
            max_title_words: default_max_title_words(),
            forbidden_handle_chars: default_forbidden_handle_chars(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_min_description_len")]
    pub min_description_len: usize,
}

fn default_min_description_len() -> usize {
    40
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_description_len: default_min_description_len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AliasConfig {
    #[serde(default = "defaults::abbreviations")]
    pub abbreviations: BTreeMap<String, String>,
    #[serde(default = "defaults::boilerplate_suffixes")]
    pub boilerplate_suffixes: Vec<String>,
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            abbreviations: defaults::abbreviations(),
            boilerplate_suffixes: defaults::boilerplate_suffixes(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeFamily {
    LiquidVolume,
    Weight,
    Dimension,
    Wattage,
    Tier,
    Count,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SizeRuleConfig {
    pub pattern: String,
    pub label: String,
    pub rank: u32,
    pub family: SizeFamily,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandRuleConfig {
    pub pattern: String,
    pub brand: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandConfig {
    #[serde(default = "defaults::brand_rules")]
    pub rules: Vec<BrandRuleConfig>,
    /// Lowercased spelling → brand string kept verbatim.
    #[serde(default = "defaults::brand_aliases")]
    pub aliases: BTreeMap<String, String>,
    #[serde(default = "defaults::brand_blocklist")]
    pub blocklist: Vec<String>,
    #[serde(default = "defaults::connectives")]
    pub connectives: Vec<String>,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            rules: defaults::brand_rules(),
            aliases: defaults::brand_aliases(),
            blocklist: defaults::brand_blocklist(),
            connectives: defaults::connectives(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    /// Highest priority first.
    #[serde(default = "defaults::category_priority")]
    pub priority: Vec<String>,
    #[serde(default)]
    pub rules: Vec<RemovalRuleConfig>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            priority: defaults::category_priority(),
            rules: Vec::new(),
        }
    }
}

/// Literal `target` meaning "delete the row".
pub const REMOVE_TARGET: &str = "remove";

#[derive(Debug, Clone, Deserialize)]
pub struct RemovalRuleConfig {
    pub pattern: String,
    /// Category file stems the rule applies to.
    pub remove_from: Vec<String>,
    /// Category to reassign matching rows to, or `"remove"`.
    pub target: String,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl CatalogConfig {
    pub fn from_toml(input: &str) -> Result<Self, CatalogError> {
        let config: CatalogConfig =
            toml::from_str(input).map_err(|e| CatalogError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.sources.is_empty() {
            return Err(CatalogError::ConfigValidation(
                "at least one source is required".into(),
            ));
        }

        let mut names = HashSet::new();
        let mut priorities = HashSet::new();
        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(CatalogError::ConfigValidation(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
            if !priorities.insert(source.priority) {
                return Err(CatalogError::ConfigValidation(format!(
                    "source '{}': priority {} is already taken",
                    source.name, source.priority
                )));
            }
            if source.columns.title.trim().is_empty() {
                return Err(CatalogError::ConfigValidation(format!(
                    "source '{}': columns.title must name a column",
                    source.name
                )));
            }
        }

        if !self.sources.iter().any(|s| s.kind == SourceKind::Content) {
            return Err(CatalogError::ConfigValidation(
                "at least one source must be of kind 'content'".into(),
            ));
        }

        for file in &self.category_files {
            if file.label.is_none() && file.columns.category.is_none() {
                return Err(CatalogError::ConfigValidation(format!(
                    "category file '{}': needs either `label` or `columns.category`",
                    file.file
                )));
            }
        }

        let m = &self.matching;
        if m.prefix_min_len == 0 || m.substring_min_len == 0 {
            return Err(CatalogError::ConfigValidation(
                "matching lengths must be at least 1".into(),
            ));
        }
        if !(m.substring_min_ratio > 0.0 && m.substring_min_ratio <= 1.0) {
            return Err(CatalogError::ConfigValidation(format!(
                "substring_min_ratio must be in (0, 1], got {}",
                m.substring_min_ratio
            )));
        }

        let mut seen = HashSet::new();
        for label in &self.categories.priority {
            if !seen.insert(label.as_str()) {
                return Err(CatalogError::DuplicatePriority(label.clone()));
            }
        }

        for (i, rule) in self.categories.rules.iter().enumerate() {
            if rule.remove_from.is_empty() {
                return Err(CatalogError::ConfigValidation(format!(
                    "category rule #{}: remove_from is empty",
                    i + 1
                )));
            }
            if rule.target.trim().is_empty() {
                return Err(CatalogError::ConfigValidation(format!(
                    "category rule #{}: target is empty",
                    i + 1
                )));
            }
        }

        Ok(())
    }

    /// Sources in ingestion order.
    pub fn sources_by_priority(&self) -> Vec<&SourceConfig> {
        let mut sources: Vec<&SourceConfig> = self.sources.iter().collect();
        sources.sort_by_key(|s| s.priority);
        sources
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Test Catalog"

[[sources]]
name = "current"
kind = "content"
file = "current.csv"
priority = 1
[sources.columns]
title = "Title"
handle = "Handle"
description = "Body"

[[sources]]
name = "legacy"
kind = "pricing"
file = "legacy.csv"
priority = 2
[sources.columns]
title = "Product Name"
sku = "SKU"
price = "Price"

[[category_files]]
file = "categories/nutrients.csv"
label = "nutrients"
[category_files.columns]
title = "Title"
sku = "SKU"
"#;

    #[test]
    fn parse_valid() {
        let config = CatalogConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Test Catalog");
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].kind, SourceKind::Pricing);
        assert!(config.sources[0].required);
        assert_eq!(file_stem(&config.category_files[0].file), "nutrients");
        assert_eq!(config.matching.prefix_min_len, DEFAULT_PREFIX_MIN_LEN);
        assert_eq!(config.matching.substring_min_ratio, DEFAULT_SUBSTRING_MIN_RATIO);
        assert!(!config.sizes.is_empty(), "built-in size table applies");
        assert_eq!(config.categories.priority[0], "odor_control");
    }

    #[test]
    fn thresholds_can_be_overridden() {
        let input = format!(
            r#"{VALID}
[matching]
prefix_min_len = 7
substring_min_ratio = 0.6
"#
        );
        let config = CatalogConfig::from_toml(&input).unwrap();
        assert_eq!(config.matching.prefix_min_len, 7);
        assert_eq!(config.matching.substring_min_len, DEFAULT_SUBSTRING_MIN_LEN);
        assert_eq!(config.matching.substring_min_ratio, 0.6);
    }

    #[test]
    fn sources_sorted_by_priority() {
        let input = VALID.replace("priority = 1", "priority = 9");
        let config = CatalogConfig::from_toml(&input).unwrap();
        let order: Vec<_> = config.sources_by_priority().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec!["legacy", "current"]);
    }

    #[test]
    fn reject_duplicate_priority() {
        let input = VALID.replace("priority = 2", "priority = 1");
        let err = CatalogConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("priority 1"));
    }

    #[test]
    fn reject_missing_content_source() {
        let input = VALID.replace("kind = \"content\"", "kind = \"inventory\"");
        let err = CatalogConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("content"));
    }

    #[test]
    fn reject_unknown_kind() {
        let input = VALID.replace("kind = \"pricing\"", "kind = \"pricelist\"");
        assert!(matches!(
            CatalogConfig::from_toml(&input),
            Err(CatalogError::ConfigParse(_))
        ));
    }

    #[test]
    fn reject_duplicate_category_priority() {
        let input = format!(
            r#"{VALID}
[categories]
priority = ["nutrients", "odor_control", "nutrients"]
"#
        );
        let err = CatalogConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicatePriority(ref l) if l == "nutrients"));
    }

    #[test]
    fn reject_category_file_without_label_or_column() {
        let input = VALID.replace("label = \"nutrients\"\n", "");
        let err = CatalogConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("columns.category"));
    }

    #[test]
    fn reject_bad_ratio() {
        let input = format!("{VALID}\n[matching]\nsubstring_min_ratio = 1.5\n");
        let err = CatalogConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("substring_min_ratio"));
    }

    #[test]
    fn parse_removal_rules() {
        let input = format!(
            r#"{VALID}
[[categories.rules]]
pattern = '\bona\b'
remove_from = ["nutrients"]
target = "odor_control"
"#
        );
        let config = CatalogConfig::from_toml(&input).unwrap();
        let rule = &config.categories.rules[0];
        assert_eq!(rule.remove_from, vec!["nutrients"]);
        assert_eq!(rule.target, "odor_control");
    }
}
