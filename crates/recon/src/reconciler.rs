//! Groups records from every source into [`ProductGroup`]s.
//!
//! Matching order per record, first hit wins: exact canonical key, exact
//! alias key, prefix containment, substring containment, new group.
//! Assignment is final. Because heuristic matches scan existing groups,
//! results depend on ingestion order: sources by priority, rows in file
//! order.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::keyer::{derive_key, singleton_key, DerivedKey};
use crate::matcher::{CandidateIndex, GroupId, LinearScan};
use crate::model::{
    GroupMember, MatchRule, ProductGroup, QuarantineEntry, QuarantineReason, RawRecord,
};
use crate::normalize::{collapse_whitespace, slugify};
use crate::tables::Tables;

/// What happened to one ingested record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingestion {
    Grouped { group: GroupId, rule: MatchRule },
    Quarantined(QuarantineReason),
}

/// Frozen reconciliation state.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub groups: Vec<ProductGroup>,
    pub quarantine: Vec<QuarantineEntry>,
    pub ingested: usize,
}

pub struct Reconciler<'t, I: CandidateIndex = LinearScan> {
    tables: &'t Tables,
    index: I,
    groups: Vec<ProductGroup>,
    by_key: HashMap<String, GroupId>,
    by_alias: HashMap<String, GroupId>,
    handles: HashSet<String>,
    quarantine: Vec<QuarantineEntry>,
    ingested: usize,
    source_order: Vec<String>,
    furthest_source: Option<usize>,
    warned_order: HashSet<String>,
}

impl<'t> Reconciler<'t, LinearScan> {
    pub fn new(tables: &'t Tables) -> Self {
        Self::with_index(tables, LinearScan::new())
    }
}

impl<'t, I: CandidateIndex> Reconciler<'t, I> {
    pub fn with_index(tables: &'t Tables, index: I) -> Self {
        Self {
            tables,
            index,
            groups: Vec::new(),
            by_key: HashMap::new(),
            by_alias: HashMap::new(),
            handles: HashSet::new(),
            quarantine: Vec::new(),
            ingested: 0,
            source_order: Vec::new(),
            furthest_source: None,
            warned_order: HashSet::new(),
        }
    }

    /// Expected source order; a record from an earlier source arriving after
    /// a later one is logged.
    pub fn set_source_order(&mut self, order: Vec<String>) {
        self.source_order = order;
    }

    pub fn groups(&self) -> &[ProductGroup] {
        &self.groups
    }

    pub fn quarantine(&self) -> &[QuarantineEntry] {
        &self.quarantine
    }

    pub fn ingest(&mut self, record: RawRecord) -> Ingestion {
        self.ingested += 1;
        self.check_order(&record.source);

        if let Err((reason, detail)) = self.tables.validator.check(&record) {
            debug!(
                "quarantine {} row {}: {reason} ({detail})",
                record.source, record.row
            );
            self.quarantine.push(QuarantineEntry {
                source: record.source.clone(),
                row: record.row,
                title: record.title().to_string(),
                reason,
                detail,
            });
            return Ingestion::Quarantined(reason);
        }

        let derived = derive_key(&self.tables.sizes, record.title());
        if derived.key.is_empty() {
            return self.ingest_singleton(record);
        }

        let (group, rule) = match self.lookup(&derived.key) {
            Some(hit) => hit,
            None => (self.create_group(&derived), MatchRule::Created),
        };
        if rule.is_heuristic() {
            debug!(
                "{} row {} {:?} joined '{}' by {rule}",
                record.source,
                record.row,
                record.title(),
                self.groups[group].key
            );
        }
        self.groups[group].members.push(GroupMember {
            record,
            key: derived.key,
            rule,
        });
        Ingestion::Grouped { group, rule }
    }

    /// Freeze: no further ingestion is possible.
    pub fn finalize(self) -> Reconciled {
        Reconciled {
            groups: self.groups,
            quarantine: self.quarantine,
            ingested: self.ingested,
        }
    }

    fn lookup(&self, key: &str) -> Option<(GroupId, MatchRule)> {
        if let Some(&id) = self.by_key.get(key) {
            return Some((id, MatchRule::ExactKey));
        }
        if let Some(&id) = self.by_alias.get(key) {
            return Some((id, MatchRule::AliasKey));
        }
        for rule in [MatchRule::Prefix, MatchRule::Substring] {
            if let Some(id) = self.index.find(key, rule, &self.tables.thresholds) {
                return Some((id, rule));
            }
        }
        None
    }

    fn create_group(&mut self, derived: &DerivedKey) -> GroupId {
        let id = self.groups.len();
        let handle = self.unique_handle(&slugify(&derived.base_title));
        let aliases = self
            .tables
            .aliases
            .aliases(&derived.base_title, &derived.key);

        let mut claimed = Vec::new();
        for alias in aliases {
            if self.by_key.contains_key(&alias) || self.by_alias.contains_key(&alias) {
                continue;
            }
            self.by_alias.insert(alias.clone(), id);
            claimed.push(alias);
        }

        self.by_key.insert(derived.key.clone(), id);
        self.index.insert(&derived.key, id);
        self.groups.push(ProductGroup {
            key: derived.key.clone(),
            base_title: derived.base_title.clone(),
            handle,
            aliases: claimed,
            members: Vec::new(),
        });
        id
    }

    /// Records whose base title normalizes to nothing get a private key
    /// from their own sku/handle. They never take part in alias or
    /// heuristic matching.
    fn ingest_singleton(&mut self, record: RawRecord) -> Ingestion {
        let key = singleton_key(&record);
        let (group, rule) = match self.by_key.get(&key) {
            Some(&id) => (id, MatchRule::ExactKey),
            None => {
                let id = self.groups.len();
                let title = collapse_whitespace(record.title());
                let handle = self.unique_handle(&slugify(&title));
                self.by_key.insert(key.clone(), id);
                self.groups.push(ProductGroup {
                    key: key.clone(),
                    base_title: title,
                    handle,
                    aliases: Vec::new(),
                    members: Vec::new(),
                });
                (id, MatchRule::Singleton)
            }
        };
        debug!("{} row {} keyed privately as '{key}'", record.source, record.row);
        self.groups[group].members.push(GroupMember {
            record,
            key,
            rule,
        });
        Ingestion::Grouped { group, rule }
    }

    fn unique_handle(&mut self, slug: &str) -> String {
        let base = if slug.is_empty() { "product" } else { slug };
        let mut handle = base.to_string();
        let mut n = 2;
        while self.handles.contains(&handle) {
            handle = format!("{base}-{n}");
            n += 1;
        }
        self.handles.insert(handle.clone());
        handle
    }

    fn check_order(&mut self, source: &str) {
        let Some(pos) = self.source_order.iter().position(|s| s == source) else {
            return;
        };
        match self.furthest_source {
            Some(furthest) if pos < furthest => {
                if self.warned_order.insert(source.to_string()) {
                    warn!(
                        "source '{source}' ingested after '{}'; heuristic matches depend on source priority order",
                        self.source_order[furthest]
                    );
                }
            }
            _ => self.furthest_source = Some(pos),
        }
    }
}
