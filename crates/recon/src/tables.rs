//! Compiled, immutable rule tables shared by every stage of a run.

use crate::brand::BrandResolver;
use crate::category::{CategoryPriorityTable, RemovalRules};
use crate::config::{CatalogConfig, ScoringConfig};
use crate::error::CatalogError;
use crate::keyer::{AliasRules, RecordValidator};
use crate::matcher::FuzzyThresholds;
use crate::size::SizeDetector;

/// Everything the engine needs from a config, compiled once. Stages
/// borrow it; nothing mutates it after [`Tables::compile`].
#[derive(Debug, Clone)]
pub struct Tables {
    pub sizes: SizeDetector,
    pub brands: BrandResolver,
    pub aliases: AliasRules,
    pub validator: RecordValidator,
    pub thresholds: FuzzyThresholds,
    pub scoring: ScoringConfig,
    pub category_priority: CategoryPriorityTable,
    pub removal_rules: RemovalRules,
}

impl Tables {
    pub fn compile(config: &CatalogConfig) -> Result<Self, CatalogError> {
        Ok(Self {
            sizes: SizeDetector::new(&config.sizes)?,
            brands: BrandResolver::new(&config.brands)?,
            aliases: AliasRules::new(&config.aliases),
            validator: RecordValidator::new(&config.validation),
            thresholds: FuzzyThresholds::from(&config.matching),
            scoring: config.scoring.clone(),
            category_priority: CategoryPriorityTable::new(&config.categories.priority)?,
            removal_rules: RemovalRules::new(&config.categories.rules)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
name = "t"
[[sources]]
name = "current"
kind = "content"
file = "c.csv"
priority = 1
[sources.columns]
title = "Title"
"#;

    #[test]
    fn compiles_defaults() {
        let tables = Tables::compile(&CatalogConfig::from_toml(BASE).unwrap()).unwrap();
        assert_eq!(tables.sizes.detect("Bloom qt").label, "Quart");
        assert_eq!(tables.category_priority.len(), 12);
        assert!(tables.removal_rules.is_empty());
    }

    #[test]
    fn bad_size_pattern_is_reported() {
        let input = format!(
            r#"{BASE}
[[sizes]]
pattern = "(unclosed"
label = "Broken"
rank = 1
family = "count"
"#
        );
        let config = CatalogConfig::from_toml(&input).unwrap();
        let err = Tables::compile(&config).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPattern { ref table, .. } if table == "size"));
    }

    #[test]
    fn bad_removal_pattern_is_reported() {
        let input = format!(
            r#"{BASE}
[[categories.rules]]
pattern = "[oops"
remove_from = ["nutrients"]
target = "remove"
"#
        );
        let config = CatalogConfig::from_toml(&input).unwrap();
        assert!(Tables::compile(&config).is_err());
    }
}
