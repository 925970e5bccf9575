//! Per-size variants for one product group.
//!
//! The first record carrying a size label creates that variant. Records
//! from other non-content sources then enrich it: a record with the same
//! sku or the same full-title key is preferred, whatever size its own title
//! carries, otherwise the first record with the same label. Pricing sources overwrite price fields;
//! identifiers are only filled in where missing.

use crate::config::SourceKind;
use crate::model::{GroupMember, ProductGroup, Provenance, RawRecord, Variant};
use crate::normalize::normalize;
use crate::size::{SizeDetector, SizeToken, DEFAULT_SIZE};

struct Draft {
    variant: Variant,
    origin_source: String,
    origin_kind: SourceKind,
    origin_sku: Option<String>,
    origin_title_key: String,
}

impl Draft {
    fn new(record: &RawRecord, token: &SizeToken) -> Self {
        let provenance = match record.kind() {
            SourceKind::Content => Provenance::Content,
            _ => Provenance::Pricing,
        };
        Self {
            variant: Variant {
                size: token.label.clone(),
                rank: token.rank,
                sku: record.sku().map(str::to_string),
                price_cents: record.price_cents(),
                compare_at_cents: record.compare_at_cents(),
                cost_cents: record.cost_cents(),
                barcode: record.barcode().map(str::to_string),
                inventory: record.inventory(),
                weight: record.weight().map(str::to_string),
                provenance,
                contributors: vec![contributor(record)],
            },
            origin_source: record.source.clone(),
            origin_kind: record.kind(),
            origin_sku: record.sku().map(normalize),
            origin_title_key: normalize(record.title()),
        }
    }

    /// Same sku or same full title, ignoring case and punctuation.
    fn is_direct_match(&self, record: &RawRecord) -> bool {
        let sku_match = match (&self.origin_sku, record.sku().map(normalize)) {
            (Some(a), Some(b)) => !a.is_empty() && *a == b,
            _ => false,
        };
        let title_match =
            !self.origin_title_key.is_empty() && self.origin_title_key == normalize(record.title());
        sku_match || title_match
    }

    fn enrich(&mut self, record: &RawRecord) {
        let v = &mut self.variant;
        match record.kind() {
            SourceKind::Pricing => {
                overwrite(&mut v.price_cents, record.price_cents());
                overwrite(&mut v.compare_at_cents, record.compare_at_cents());
                overwrite(&mut v.cost_cents, record.cost_cents());
                overwrite(&mut v.inventory, record.inventory());
            }
            SourceKind::Inventory => {
                overwrite(&mut v.inventory, record.inventory());
                overwrite(&mut v.cost_cents, record.cost_cents());
                fill(&mut v.price_cents, record.price_cents());
            }
            SourceKind::Content => {}
        }
        fill(&mut v.sku, record.sku().map(str::to_string));
        fill(&mut v.barcode, record.barcode().map(str::to_string));
        fill(&mut v.weight, record.weight().map(str::to_string));

        if self.origin_kind == SourceKind::Content && record.kind() != SourceKind::Content {
            v.provenance = Provenance::Both;
        }
        v.contributors.push(contributor(record));
    }

    /// A same-label record that enrichment did not pick: contributes only
    /// what is still missing.
    fn absorb(&mut self, record: &RawRecord) {
        let v = &mut self.variant;
        fill(&mut v.sku, record.sku().map(str::to_string));
        fill(&mut v.barcode, record.barcode().map(str::to_string));
        fill(&mut v.weight, record.weight().map(str::to_string));
        fill(&mut v.price_cents, record.price_cents());
        fill(&mut v.compare_at_cents, record.compare_at_cents());
        fill(&mut v.cost_cents, record.cost_cents());
        fill(&mut v.inventory, record.inventory());
        v.contributors.push(contributor(record));
    }
}

fn overwrite<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn contributor(record: &RawRecord) -> String {
    format!("{}:{}", record.source, record.row)
}

/// Label of the draft a non-content record directly matches, if any.
fn direct_draft_label(drafts: &[Draft], record: &RawRecord) -> Option<String> {
    if record.kind() == SourceKind::Content {
        return None;
    }
    drafts
        .iter()
        .find(|d| d.origin_source != record.source && d.is_direct_match(record))
        .map(|d| d.variant.size.clone())
}

/// Variants sorted by size rank, `Default` only when nothing else exists.
pub fn build_variants(sizes: &SizeDetector, group: &ProductGroup) -> Vec<Variant> {
    let mut drafts: Vec<Draft> = Vec::new();
    let mut pending: Vec<(&GroupMember, String)> = Vec::new();

    for member in &group.members {
        let token = sizes.detect(member.record.title());
        if drafts.iter().any(|d| d.variant.size == token.label) {
            pending.push((member, token.label));
        } else if let Some(label) = direct_draft_label(&drafts, &member.record) {
            // same sku or full title as an existing variant: enrich it
            // instead of starting a new size
            pending.push((member, label));
        } else {
            drafts.push(Draft::new(&member.record, &token));
        }
    }

    let mut used = vec![false; pending.len()];
    for draft in &mut drafts {
        let sources: Vec<String> = pending
            .iter()
            .filter(|(m, _)| {
                m.record.kind() != SourceKind::Content && m.record.source != draft.origin_source
            })
            .map(|(m, _)| m.record.source.clone())
            .fold(Vec::new(), |mut acc, s| {
                if !acc.contains(&s) {
                    acc.push(s);
                }
                acc
            });

        for source in sources {
            let candidates = || {
                pending
                    .iter()
                    .enumerate()
                    .filter(|(i, (m, _))| !used[*i] && m.record.source == source)
            };
            let pick = candidates()
                .find(|(_, (m, _))| draft.is_direct_match(&m.record))
                .or_else(|| candidates().find(|(_, (_, label))| *label == draft.variant.size))
                .map(|(i, _)| i);
            if let Some(i) = pick {
                used[i] = true;
                draft.enrich(&pending[i].0.record);
            }
        }
    }

    // leftovers: duplicates of an existing label
    for (i, (member, label)) in pending.iter().enumerate() {
        if used[i] {
            continue;
        }
        if let Some(draft) = drafts.iter_mut().find(|d| d.variant.size == *label) {
            draft.absorb(&member.record);
        }
    }

    let mut variants: Vec<Variant> = drafts.into_iter().map(|d| d.variant).collect();
    if variants.iter().any(|v| v.size != DEFAULT_SIZE) {
        variants.retain(|v| v.size != DEFAULT_SIZE);
    }
    variants.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.size.cmp(&b.size)));
    variants
}
