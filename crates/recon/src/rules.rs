//! Ordered rule tables: `(pattern, label, rank)` rows where the first
//! matching row wins.
//!
//! Size detection, curated brand detection and the category priority order
//! are all expressed as a [`RuleTable`]; table order is precedence.

use regex::{Regex, RegexBuilder};

use crate::error::CatalogError;

#[derive(Debug, Clone)]
pub struct Rule<M = ()> {
    pub pattern: Regex,
    pub label: String,
    pub rank: u32,
    pub meta: M,
}

#[derive(Debug, Clone)]
pub struct RuleTable<M = ()> {
    rules: Vec<Rule<M>>,
}

impl<M> RuleTable<M> {
    /// Compile `(pattern, label, rank, meta)` rows in order. Patterns are
    /// case-insensitive.
    pub fn compile<I>(name: &str, rows: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (String, String, u32, M)>,
    {
        let mut rules = Vec::new();
        for (pattern, label, rank, meta) in rows {
            let compiled = RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| CatalogError::InvalidPattern {
                    table: name.to_string(),
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
            rules.push(Rule {
                pattern: compiled,
                label,
                rank,
                meta,
            });
        }
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule<M>] {
        &self.rules
    }

    /// The single evaluator: first rule (in table order) whose pattern
    /// matches anywhere in `text`.
    pub fn first_match(&self, text: &str) -> Option<&Rule<M>> {
        self.rules.iter().find(|r| r.pattern.is_match(text))
    }

    /// Rank of the first rule carrying `label`.
    pub fn rank_of(&self, label: &str) -> Option<u32> {
        self.rules.iter().find(|r| r.label == label).map(|r| r.rank)
    }

    /// Remove every substring matched by any rule, applying rules in table
    /// order. Returns the remaining text and whether anything was removed.
    pub fn strip_all(&self, text: &str) -> (String, bool) {
        let mut out = text.to_string();
        let mut removed = false;
        for rule in &self.rules {
            if rule.pattern.is_match(&out) {
                out = rule.pattern.replace_all(&out, " ").into_owned();
                removed = true;
            }
        }
        (out, removed)
    }
}
