//! Heuristic key matching (prefix and substring containment).
//!
//! The policy lives in [`FuzzyThresholds`]; the lookup structure sits
//! behind [`CandidateIndex`] so the linear scan can be swapped for an
//! indexed structure without touching the policy.

use crate::config::MatchingConfig;
use crate::model::MatchRule;

/// Index of a group in the reconciler's arena.
pub type GroupId = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyThresholds {
    pub prefix_min_len: usize,
    pub substring_min_len: usize,
    pub substring_min_ratio: f64,
}

impl From<&MatchingConfig> for FuzzyThresholds {
    fn from(m: &MatchingConfig) -> Self {
        Self {
            prefix_min_len: m.prefix_min_len,
            substring_min_len: m.substring_min_len,
            substring_min_ratio: m.substring_min_ratio,
        }
    }
}

impl Default for FuzzyThresholds {
    fn default() -> Self {
        Self::from(&MatchingConfig::default())
    }
}

impl FuzzyThresholds {
    /// One key is a prefix of the other and the shorter is long enough.
    pub fn is_prefix_match(&self, a: &str, b: &str) -> bool {
        let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        short.len() >= self.prefix_min_len && long.starts_with(short)
    }

    /// One key contains the other, the shorter is long enough, and the
    /// lengths are within `substring_min_ratio` of each other.
    pub fn is_substring_match(&self, a: &str, b: &str) -> bool {
        let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        if short.len() < self.substring_min_len || long.is_empty() {
            return false;
        }
        let ratio = short.len() as f64 / long.len() as f64;
        ratio >= self.substring_min_ratio && long.contains(short)
    }
}

pub trait CandidateIndex {
    /// Register a group's canonical key. Insertion order is scan order.
    fn insert(&mut self, key: &str, group: GroupId);

    /// First group (in insertion order) satisfying `rule` against `key`.
    /// Only [`MatchRule::Prefix`] and [`MatchRule::Substring`] are heuristic;
    /// any other rule yields `None`.
    fn find(&self, key: &str, rule: MatchRule, thresholds: &FuzzyThresholds) -> Option<GroupId>;
}

/// Bounded O(n) scan over every registered key.
#[derive(Debug, Clone, Default)]
pub struct LinearScan {
    entries: Vec<(String, GroupId)>,
}

impl LinearScan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CandidateIndex for LinearScan {
    fn insert(&mut self, key: &str, group: GroupId) {
        self.entries.push((key.to_string(), group));
    }

    fn find(&self, key: &str, rule: MatchRule, thresholds: &FuzzyThresholds) -> Option<GroupId> {
        let test: fn(&FuzzyThresholds, &str, &str) -> bool = match rule {
            MatchRule::Prefix => FuzzyThresholds::is_prefix_match,
            MatchRule::Substring => FuzzyThresholds::is_substring_match,
            _ => return None,
        };
        self.entries
            .iter()
            .find(|(candidate, _)| test(thresholds, key, candidate))
            .map(|(_, id)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_needs_five_chars() {
        let t = FuzzyThresholds::default();
        assert!(t.is_prefix_match("flora", "florablend"));
        assert!(t.is_prefix_match("florablend", "flora"));
        assert!(!t.is_prefix_match("flor", "florablend"));
        assert!(!t.is_prefix_match("blend", "florablend"));
    }

    #[test]
    fn substring_needs_ratio_and_length() {
        let t = FuzzyThresholds::default();
        // 5 / 10 = 0.5
        assert!(t.is_substring_match("blend", "florablend"));
        // 5 / 15 < 0.4
        assert!(!t.is_substring_match("blend", "superflorablend"));
        // too short
        assert!(!t.is_substring_match("lend", "lends"));
        // 6 / 15 = 0.4 exactly
        assert!(t.is_substring_match("rablen", "superflorablend"));
    }

    #[test]
    fn thresholds_are_overridable() {
        let t = FuzzyThresholds {
            prefix_min_len: 3,
            substring_min_len: 3,
            substring_min_ratio: 0.2,
        };
        assert!(t.is_prefix_match("flo", "florablend"));
        assert!(t.is_substring_match("blend", "superflorablend"));
    }

    #[test]
    fn linear_scan_returns_first_inserted() {
        let mut idx = LinearScan::new();
        idx.insert("florablendbloom", 0);
        idx.insert("florablendgrow", 1);
        let t = FuzzyThresholds::default();
        assert_eq!(idx.find("florablend", MatchRule::Prefix, &t), Some(0));
        assert_eq!(idx.find("blendgrow", MatchRule::Substring, &t), Some(1));
        assert_eq!(idx.find("florablend", MatchRule::ExactKey, &t), None);
        assert_eq!(idx.find("rootjuice", MatchRule::Prefix, &t), None);
        assert_eq!(idx.len(), 2);
    }
}
