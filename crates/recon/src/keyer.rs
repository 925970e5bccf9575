//! Canonical keys, alias keys and ingestion validation.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{AliasConfig, ValidationConfig};
use crate::model::{QuarantineReason, RawRecord};
use crate::normalize::{normalize, words};
use crate::size::SizeDetector;

/// Prefix of keys that only their own record can own. `normalize` never
/// emits it, so no other record can match such a key.
pub const SINGLETON_PREFIX: char = '#';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedKey {
    pub base_title: String,
    pub key: String,
}

pub fn derive_key(sizes: &SizeDetector, title: &str) -> DerivedKey {
    let base_title = sizes.strip_size(title);
    let key = normalize(&base_title);
    DerivedKey { base_title, key }
}

/// Private key for a record whose base title normalizes to nothing.
pub fn singleton_key(record: &RawRecord) -> String {
    let id = record
        .sku()
        .map(normalize)
        .filter(|k| !k.is_empty())
        .or_else(|| record.handle().map(normalize).filter(|k| !k.is_empty()))
        .unwrap_or_else(|| format!("row{}", record.row));
    format!("{SINGLETON_PREFIX}{}:{id}", record.source)
}

pub fn is_singleton_key(key: &str) -> bool {
    key.starts_with(SINGLETON_PREFIX)
}

// ---------------------------------------------------------------------------
// Aliases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AliasRules {
    /// Word → replacements, abbreviations in both directions.
    swaps: BTreeMap<String, Vec<String>>,
    suffixes: BTreeSet<String>,
}

impl AliasRules {
    pub fn new(config: &AliasConfig) -> Self {
        let mut swaps: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (short, long) in &config.abbreviations {
            let short = short.to_lowercase();
            let long = long.to_lowercase();
            swaps.entry(short.clone()).or_default().push(long.clone());
            swaps.entry(long).or_default().push(short);
        }
        Self {
            swaps,
            suffixes: config
                .boilerplate_suffixes
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
        }
    }

    /// Alias keys for a group, sorted, never containing `canonical` or "".
    pub fn aliases(&self, base_title: &str, canonical: &str) -> Vec<String> {
        let ws = words(base_title);
        let mut out: BTreeSet<String> = BTreeSet::new();

        // abbreviation swaps, one word at a time and all at once
        let mut all_swapped = ws.clone();
        for (i, w) in ws.iter().enumerate() {
            if let Some(replacements) = self.swaps.get(w) {
                for r in replacements {
                    let mut v = ws.clone();
                    v[i] = r.clone();
                    out.insert(v.concat());
                }
                all_swapped[i] = replacements[0].clone();
            }
        }
        out.insert(all_swapped.concat());

        // plural / singular
        for (i, w) in ws.iter().enumerate() {
            if let Some(toggled) = toggle_plural(w) {
                let mut v = ws.clone();
                v[i] = toggled;
                out.insert(v.concat());
            }
        }

        // boilerplate suffix stripping
        let mut trimmed = ws.clone();
        while trimmed.len() > 1 && trimmed.last().is_some_and(|w| self.suffixes.contains(w)) {
            trimmed.pop();
            out.insert(trimmed.concat());
        }

        out.into_iter()
            .map(|k| normalize(&k))
            .filter(|k| !k.is_empty() && k != canonical)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn toggle_plural(word: &str) -> Option<String> {
    if !word.chars().all(|c| c.is_ascii_alphabetic()) || word.len() < 3 {
        return None;
    }
    if word.ends_with("ss") {
        return None;
    }
    if let Some(stem) = word.strip_suffix('s') {
        if stem.len() >= 3 {
            return Some(stem.to_string());
        }
        return None;
    }
    Some(format!("{word}s"))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecordValidator {
    config: ValidationConfig,
}

impl RecordValidator {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// `Err((reason, detail))` when the record must be quarantined.
    pub fn check(&self, record: &RawRecord) -> Result<(), (QuarantineReason, String)> {
        let title = record.title().trim();

        // keys keep only ASCII alphanumerics, so other scripts count as no letters
        if !title.chars().any(|c| c.is_ascii_alphabetic()) {
            return Err((
                QuarantineReason::InvalidTitle,
                format!("title {title:?} contains no letters"),
            ));
        }

        let len = title.chars().count();
        if len < self.config.min_title_len {
            return Err((
                QuarantineReason::TitleTooShort,
                format!("title is {len} chars, minimum {}", self.config.min_title_len),
            ));
        }

        let word_count = title.split_whitespace().count();
        if len > self.config.max_title_len {
            return Err((
                QuarantineReason::DescriptionFragment,
                format!("title is {len} chars, maximum {}", self.config.max_title_len),
            ));
        }
        if word_count > self.config.max_title_words {
            return Err((
                QuarantineReason::DescriptionFragment,
                format!("title has {word_count} words, maximum {}", self.config.max_title_words),
            ));
        }
        if title.contains('<') && title.contains('>') {
            return Err((
                QuarantineReason::DescriptionFragment,
                "title contains markup".to_string(),
            ));
        }
        if word_count >= 6 && title.ends_with(['.', '!', '?']) {
            return Err((
                QuarantineReason::DescriptionFragment,
                "title reads like a sentence".to_string(),
            ));
        }

        if let Some(handle) = record.handle() {
            let bad = handle
                .chars()
                .find(|c| c.is_whitespace() || self.config.forbidden_handle_chars.contains(*c));
            if let Some(c) = bad {
                return Err((
                    QuarantineReason::ForbiddenHandle,
                    format!("handle {handle:?} contains {c:?}"),
                ));
            }
        }

        Ok(())
    }
}
