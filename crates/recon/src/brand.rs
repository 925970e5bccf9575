//! Brand detection: a priority chain of evidence, a validity filter, and
//! case normalization.

use std::collections::BTreeMap;

use regex::Regex;

use crate::config::BrandConfig;
use crate::error::CatalogError;
use crate::rules::RuleTable;

pub const MIN_BRAND_LEN: usize = 2;
pub const MAX_BRAND_LEN: usize = 40;
pub const MAX_BRAND_WORDS: usize = 4;

/// Evidence for one product, in chain order after the curated patterns.
#[derive(Debug, Clone, Default)]
pub struct BrandEvidence<'a> {
    pub title: &'a str,
    pub tags: &'a str,
    /// The record's own vendor/brand field.
    pub vendor: Option<&'a str>,
    /// Vendor field from another source.
    pub alternate_vendor: Option<&'a str>,
    /// Last resort, e.g. manufacturer.
    pub fallback: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct BrandResolver {
    curated: RuleTable,
    aliases: BTreeMap<String, String>,
    blocklist: Vec<String>,
    connectives: Vec<String>,
    quantity: Regex,
}

impl BrandResolver {
    pub fn new(config: &BrandConfig) -> Result<Self, CatalogError> {
        let curated = RuleTable::compile(
            "brand",
            config
                .rules
                .iter()
                .enumerate()
                .map(|(i, r)| (r.pattern.clone(), r.brand.clone(), i as u32, ())),
        )?;
        let quantity = Regex::new(
            r"(?i)^\d+(?:\.\d+)?\s*(?:fl\.?\s*)?(?:oz|lb|lbs|g|kg|ml|l|gal|qt|pt|pack|pk|ct|count|w)$",
        )
        .map_err(|e| CatalogError::InvalidPattern {
            table: "brand".into(),
            pattern: "quantity".into(),
            message: e.to_string(),
        })?;
        Ok(Self {
            curated,
            aliases: config
                .aliases
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect(),
            blocklist: config.blocklist.iter().map(|b| b.to_lowercase()).collect(),
            connectives: config.connectives.iter().map(|c| c.to_lowercase()).collect(),
            quantity,
        })
    }

    /// First non-empty link of the chain wins: curated pattern over
    /// title + vendor + tags, own vendor, alternate vendor, fallback.
    pub fn resolve(&self, evidence: &BrandEvidence<'_>) -> Option<String> {
        let combined = [
            evidence.title,
            evidence.vendor.unwrap_or(""),
            evidence.tags,
        ]
        .join(" ");
        if let Some(rule) = self.curated.first_match(&combined) {
            return Some(rule.label.clone());
        }

        [evidence.vendor, evidence.alternate_vendor, evidence.fallback]
            .into_iter()
            .flatten()
            .find(|candidate| self.is_valid(candidate))
            .map(|candidate| self.canonicalize(candidate))
    }

    /// Does `candidate` look like a brand name at all?
    pub fn is_valid(&self, candidate: &str) -> bool {
        let s = candidate.trim();
        let len = s.chars().count();
        if !(MIN_BRAND_LEN..=MAX_BRAND_LEN).contains(&len) {
            return false;
        }
        let lower = s.to_lowercase();
        if self.blocklist.iter().any(|b| *b == lower) {
            return false;
        }
        if s.contains(['{', '}', ':']) {
            return false;
        }
        let words: Vec<&str> = lower.split_whitespace().collect();
        if words.len() > MAX_BRAND_WORDS {
            return false;
        }
        if words.iter().any(|w| self.connectives.iter().any(|c| c == w)) {
            return false;
        }
        if self.quantity.is_match(s) {
            return false;
        }
        true
    }

    /// Title Case, except alias-table spellings and all-caps acronyms which
    /// are kept verbatim.
    pub fn canonicalize(&self, brand: &str) -> String {
        let collapsed = crate::normalize::collapse_whitespace(brand);
        if let Some(alias) = self.aliases.get(&collapsed.to_lowercase()) {
            return alias.clone();
        }
        collapsed
            .split(' ')
            .map(title_case_word)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn title_case_word(word: &str) -> String {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase()) {
        return word.to_string();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> BrandResolver {
        BrandResolver::new(&BrandConfig::default()).unwrap()
    }

    #[test]
    fn curated_pattern_wins_over_vendor() {
        let r = resolver();
        let ev = BrandEvidence {
            title: "Fox Farm Big Bloom Quart",
            vendor: Some("Acme Distribution"),
            ..Default::default()
        };
        assert_eq!(r.resolve(&ev).as_deref(), Some("FoxFarm"));
    }

    #[test]
    fn curated_pattern_reads_tags() {
        let ev = BrandEvidence {
            title: "Odor Block",
            tags: "odor, ona",
            ..Default::default()
        };
        assert_eq!(resolver().resolve(&ev).as_deref(), Some("ONA"));
    }

    #[test]
    fn falls_through_invalid_vendor() {
        let r = resolver();
        let ev = BrandEvidence {
            title: "Root Tonic",
            vendor: Some("Grow Depot"),
            alternate_vendor: Some("16 oz"),
            fallback: Some("green leaf labs"),
            ..Default::default()
        };
        assert_eq!(r.resolve(&ev).as_deref(), Some("Green Leaf Labs"));
    }

    #[test]
    fn nothing_valid_is_none() {
        let ev = BrandEvidence {
            title: "Root Tonic",
            vendor: Some(""),
            ..Default::default()
        };
        assert_eq!(resolver().resolve(&ev), None);
    }

    #[test]
    fn validity_filter() {
        let r = resolver();
        assert!(r.is_valid("Botanicare"));
        assert!(!r.is_valid("X"));
        assert!(!r.is_valid(&"a".repeat(41)));
        assert!(!r.is_valid("the grow depot"));
        assert!(!r.is_valid("{brand}"));
        assert!(!r.is_valid("Vendor: Acme"));
        assert!(!r.is_valid("One Two Three Four Five"));
        assert!(!r.is_valid("Bloom for Plants"));
        assert!(!r.is_valid("16 oz"));
        assert!(!r.is_valid("2.5gal"));
    }

    #[test]
    fn canonical_case() {
        let r = resolver();
        assert_eq!(r.canonicalize("green   LEAF labs"), "Green LEAF Labs");
        assert_eq!(r.canonicalize("HGC"), "HGC");
        assert_eq!(r.canonicalize("ac infinity"), "AC Infinity");
        assert_eq!(r.canonicalize("PH UP"), "pH Up");
    }
}
