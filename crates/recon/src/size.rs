//! Size/variant token detection over free text.

use regex::Regex;

use crate::config::{SizeFamily, SizeRuleConfig};
use crate::error::CatalogError;
use crate::normalize::collapse_whitespace;
use crate::rules::RuleTable;

/// Label used when no size pattern matches.
pub const DEFAULT_SIZE: &str = "Default";
/// Rank of [`DEFAULT_SIZE`]; sorts after every real size.
pub const DEFAULT_RANK: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeToken {
    pub label: String,
    pub rank: u32,
    pub family: Option<SizeFamily>,
}

impl SizeToken {
    pub fn default_token() -> Self {
        Self {
            label: DEFAULT_SIZE.to_string(),
            rank: DEFAULT_RANK,
            family: None,
        }
    }

    pub fn is_default(&self) -> bool {
        self.label == DEFAULT_SIZE
    }
}

/// Separators trimmed from the ends of a title once sizes are cut out.
/// Brackets are handled separately so a closed group survives.
const STRAY_PUNCT: &[char] = &['-', '–', '—', ',', '/', '|', ':', ';', '.', '+', '&'];

/// A bracket pair holding nothing but whitespace and separators.
const EMPTY_BRACKETS: &str = r"[(\[][\s\-–—,/|:;.+&]*[)\]]";

#[derive(Debug, Clone)]
pub struct SizeDetector {
    table: RuleTable<SizeFamily>,
    empty_brackets: Regex,
}

impl SizeDetector {
    pub fn new(rules: &[SizeRuleConfig]) -> Result<Self, CatalogError> {
        let table = RuleTable::compile(
            "size",
            rules
                .iter()
                .map(|r| (r.pattern.clone(), r.label.clone(), r.rank, r.family)),
        )?;
        let empty_brackets = Regex::new(EMPTY_BRACKETS).map_err(|e| CatalogError::InvalidPattern {
            table: "size".into(),
            pattern: EMPTY_BRACKETS.into(),
            message: e.to_string(),
        })?;
        Ok(Self {
            table,
            empty_brackets,
        })
    }

    /// First matching table entry, or the `Default` token.
    pub fn detect(&self, text: &str) -> SizeToken {
        match self.table.first_match(text) {
            Some(rule) => SizeToken {
                label: rule.label.clone(),
                rank: rule.rank,
                family: Some(rule.meta),
            },
            None => SizeToken::default_token(),
        }
    }

    /// Rank for a label produced by [`detect`](Self::detect).
    pub fn rank_of(&self, label: &str) -> u32 {
        if label == DEFAULT_SIZE {
            return DEFAULT_RANK;
        }
        self.table.rank_of(label).unwrap_or(DEFAULT_RANK)
    }

    /// Base title: `title` with every size substring removed.
    ///
    /// A title without size tokens comes back unchanged apart from
    /// whitespace collapsing.
    pub fn strip_size(&self, title: &str) -> String {
        let (stripped, removed) = self.table.strip_all(title);
        if !removed {
            return collapse_whitespace(title);
        }
        let mut out = collapse_whitespace(&stripped);
        loop {
            let next = collapse_whitespace(&self.empty_brackets.replace_all(&out, " "));
            if next == out {
                break;
            }
            out = next;
        }
        trim_stray(&out)
    }
}

/// Trim separators and brackets left dangling at either end. A bracket
/// is dangling when it opens at the end, closes at the start, or has no
/// partner anywhere in the text.
fn trim_stray(text: &str) -> String {
    let mut out = text.to_string();
    loop {
        let trimmed = out.trim_matches(|c: char| c.is_whitespace() || STRAY_PUNCT.contains(&c));
        let mut next = trimmed.to_string();
        if let Some(last) = next.chars().last() {
            if matches!(last, '(' | '[') || unmatched_closer(&next, last) {
                next.pop();
            }
        }
        if let Some(first) = next.chars().next() {
            if matches!(first, ')' | ']') || unmatched_opener(&next, first) {
                next.remove(0);
            }
        }
        if next == out {
            return out;
        }
        out = next;
    }
}

fn bracket_counts(text: &str, open: char, close: char) -> (usize, usize) {
    (text.matches(open).count(), text.matches(close).count())
}

fn unmatched_closer(text: &str, c: char) -> bool {
    let (open, close) = match c {
        ')' => bracket_counts(text, '(', ')'),
        ']' => bracket_counts(text, '[', ']'),
        _ => return false,
    };
    close > open
}

fn unmatched_opener(text: &str, c: char) -> bool {
    let (open, close) = match c {
        '(' => bracket_counts(text, '(', ')'),
        '[' => bracket_counts(text, '[', ']'),
        _ => return false,
    };
    open > close
}
