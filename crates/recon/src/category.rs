//! Category resolution over the category master files.
//!
//! Rows pass through the removal rules first (each action lands in an
//! append-only [`RemovalLog`]), then surviving claims are aggregated per
//! product identity. One distinct label is taken as-is; several labels
//! resolve by the priority table and are reported as a conflict.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{debug, warn};

use crate::config::{file_stem, RemovalRuleConfig, REMOVE_TARGET};
use crate::error::CatalogError;
use crate::keyer::derive_key;
use crate::model::{
    CategoryAssignment, CategoryClaim, CategoryRow, ClaimSource, ConflictRecord, RemovalAction,
    RemovalLogEntry,
};
use crate::normalize::normalize;
use crate::rules::{Rule, RuleTable};
use crate::size::SizeDetector;
use crate::tables::Tables;

/// Primary category of an identity whose every claim was removed.
pub const UNCATEGORIZED: &str = "uncategorized";

const SKU_PLACEHOLDERS: &[&str] = &["n/a", "na", "nan", "none", "null", "tbd", "-"];

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Looks like a real SKU rather than a blank or spreadsheet placeholder.
pub fn is_well_formed_sku(sku: &str) -> bool {
    let s = sku.trim();
    s.chars().count() >= 3
        && !SKU_PLACEHOLDERS.contains(&s.to_ascii_lowercase().as_str())
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
        && s.chars().any(|c| c.is_ascii_alphanumeric())
}

pub fn sku_identity(sku: &str) -> Option<String> {
    if !is_well_formed_sku(sku) {
        return None;
    }
    Some(format!("sku:{}", normalize(sku)))
}

pub fn handle_identity(handle: &str) -> Option<String> {
    let h = handle.trim();
    if h.is_empty() || h.contains(char::is_whitespace) {
        return None;
    }
    Some(format!("handle:{}", h.to_ascii_lowercase()))
}

/// `key` is a reconciliation key, see [`derive_key`].
pub fn title_identity(key: &str) -> Option<String> {
    if key.is_empty() {
        return None;
    }
    Some(format!("title:{key}"))
}

/// Well-formed sku, else handle, else base-title key.
pub fn row_identity(sizes: &SizeDetector, row: &CategoryRow) -> Option<String> {
    sku_identity(&row.sku)
        .or_else(|| handle_identity(&row.handle))
        .or_else(|| title_identity(&derive_key(sizes, &row.title).key))
}

/// `"Odor Control"` → `"odor_control"`.
pub fn canonical_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

// ---------------------------------------------------------------------------
// Priority table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CategoryPriorityTable {
    table: RuleTable,
}

impl CategoryPriorityTable {
    /// `labels` is highest priority first.
    pub fn new(labels: &[String]) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(labels.len());
        let n = labels.len() as u32;
        for (i, label) in labels.iter().enumerate() {
            let label = canonical_label(label);
            if !seen.insert(label.clone()) {
                return Err(CatalogError::DuplicatePriority(label));
            }
            rows.push((format!("^{}$", regex::escape(&label)), label, n - i as u32, ()));
        }
        Ok(Self {
            table: RuleTable::compile("category priority", rows)?,
        })
    }

    /// Higher wins; `None` for labels the table does not list.
    pub fn priority(&self, label: &str) -> Option<u32> {
        self.table.first_match(label).map(|r| r.rank)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Highest-priority label. Unlisted labels rank below every listed one;
    /// ties go to the lexically smallest label.
    pub fn primary<'a>(&self, labels: &[&'a str]) -> Option<&'a str> {
        labels.iter().copied().max_by(|a, b| {
            let pa = self.priority(a).unwrap_or(0);
            let pb = self.priority(b).unwrap_or(0);
            pa.cmp(&pb).then_with(|| b.cmp(a))
        })
    }
}

// ---------------------------------------------------------------------------
// Removal rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    Remove,
    Category(String),
}

#[derive(Debug, Clone)]
pub struct RemovalScope {
    /// Category file stems the rule applies to.
    pub files: Vec<String>,
    pub target: RuleTarget,
}

#[derive(Debug, Clone)]
pub struct RemovalRules {
    /// Rank is the 1-based position in the configured list.
    table: RuleTable<RemovalScope>,
}

impl RemovalRules {
    pub fn new(rules: &[RemovalRuleConfig]) -> Result<Self, CatalogError> {
        let rows = rules.iter().enumerate().map(|(i, r)| {
            let target = if r.target.trim().eq_ignore_ascii_case(REMOVE_TARGET) {
                RuleTarget::Remove
            } else {
                RuleTarget::Category(canonical_label(&r.target))
            };
            let scope = RemovalScope {
                files: r.remove_from.iter().map(|f| file_stem(f)).collect(),
                target,
            };
            (r.pattern.clone(), r.target.clone(), i as u32 + 1, scope)
        });
        Ok(Self {
            table: RuleTable::compile("category rule", rows)?,
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// First rule scoped to `stem` whose pattern matches `title`.
    pub fn first_applicable(&self, stem: &str, title: &str) -> Option<&Rule<RemovalScope>> {
        self.table
            .rules()
            .iter()
            .find(|r| r.meta.files.iter().any(|f| f == stem) && r.pattern.is_match(title))
    }
}

/// Append-only record of every removal and reassignment.
#[derive(Debug, Clone, Default)]
pub struct RemovalLog {
    entries: Vec<RemovalLogEntry>,
}

impl RemovalLog {
    fn append(&mut self, entry: RemovalLogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RemovalLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<RemovalLogEntry> {
        self.entries
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct CategoryResolution {
    /// One per identity, sorted by identity.
    pub assignments: Vec<CategoryAssignment>,
    pub conflicts: Vec<ConflictRecord>,
    pub removal_log: Vec<RemovalLogEntry>,
    /// Rows without sku, handle or usable title.
    pub unidentified_rows: usize,
}

pub struct CategoryResolver<'t> {
    tables: &'t Tables,
    identities: BTreeSet<String>,
    claims: Vec<CategoryClaim>,
    log: RemovalLog,
    unidentified: usize,
}

impl<'t> CategoryResolver<'t> {
    pub fn new(tables: &'t Tables) -> Self {
        Self {
            tables,
            identities: BTreeSet::new(),
            claims: Vec::new(),
            log: RemovalLog::default(),
            unidentified: 0,
        }
    }

    pub fn removal_log(&self) -> &RemovalLog {
        &self.log
    }

    pub fn add_row(&mut self, row: CategoryRow) {
        let Some(identity) = row_identity(&self.tables.sizes, &row) else {
            warn!(
                "{} row {}: no sku, handle or title key; row skipped",
                row.source_file, row.row
            );
            self.unidentified += 1;
            return;
        };
        self.identities.insert(identity.clone());

        let label = canonical_label(&row.category);
        let mut category = label.clone();
        let stem = file_stem(&row.source_file);
        if let Some(rule) = self.tables.removal_rules.first_applicable(&stem, &row.title) {
            let action = match &rule.meta.target {
                RuleTarget::Remove => Some(RemovalAction::Removed),
                RuleTarget::Category(to) if *to != label => {
                    Some(RemovalAction::Reassigned { to: to.clone() })
                }
                RuleTarget::Category(_) => None,
            };
            if let Some(action) = action {
                debug!(
                    "category rule #{} on {} row {} ({identity}): {action:?}",
                    rule.rank, row.source_file, row.row
                );
                self.log.append(RemovalLogEntry {
                    rule: rule.rank as usize,
                    pattern: rule.pattern.as_str().to_string(),
                    source_file: row.source_file.clone(),
                    row: row.row,
                    identity: identity.clone(),
                    title: row.title.clone(),
                    from_category: label.clone(),
                    action: action.clone(),
                });
                match action {
                    RemovalAction::Removed => return,
                    RemovalAction::Reassigned { to } => category = to,
                }
            }
        }

        if category.is_empty() {
            warn!("{} row {}: empty category; no claim recorded", row.source_file, row.row);
            return;
        }
        self.claims.push(CategoryClaim {
            identity,
            category,
            source_file: row.source_file,
        });
    }

    pub fn resolve(self) -> CategoryResolution {
        let mut by_identity: BTreeMap<&str, Vec<&CategoryClaim>> = BTreeMap::new();
        for claim in &self.claims {
            by_identity.entry(&claim.identity).or_default().push(claim);
        }

        let priority = &self.tables.category_priority;
        let mut warned = BTreeSet::new();
        let mut assignments = Vec::with_capacity(self.identities.len());
        let mut conflicts = Vec::new();

        for identity in &self.identities {
            let claims = by_identity
                .get(identity.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let mut labels: Vec<&str> = Vec::new();
            for claim in claims {
                if !labels.contains(&claim.category.as_str()) {
                    labels.push(&claim.category);
                }
            }
            for label in &labels {
                if priority.priority(label).is_none() && warned.insert(label.to_string()) {
                    warn!("category '{label}' is not in the priority table; it ranks last");
                }
            }

            let (primary, conflict) = match labels.as_slice() {
                [] => (UNCATEGORIZED.to_string(), false),
                [only] => (only.to_string(), false),
                many => (
                    priority.primary(many).unwrap_or(many[0]).to_string(),
                    true,
                ),
            };

            if conflict {
                let mut pairs: Vec<ClaimSource> = Vec::new();
                for claim in claims {
                    let pair = ClaimSource {
                        category: claim.category.clone(),
                        source_file: claim.source_file.clone(),
                    };
                    if !pairs.contains(&pair) {
                        pairs.push(pair);
                    }
                }
                conflicts.push(ConflictRecord {
                    identity: identity.clone(),
                    primary_category: primary.clone(),
                    claims: pairs,
                });
            }

            assignments.push(CategoryAssignment {
                identity: identity.clone(),
                primary_category: primary,
                conflict,
                claim_count: claims.len(),
            });
        }

        CategoryResolution {
            assignments,
            conflicts,
            removal_log: self.log.into_entries(),
            unidentified_rows: self.unidentified,
        }
    }
}
