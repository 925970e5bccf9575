use std::collections::BTreeMap;

use crate::category::CategoryResolution;
use crate::model::{CatalogSummary, ConsolidatedProduct, ProductGroup};
use crate::reconciler::Reconciled;

/// Compute run statistics from the frozen reconciliation and its outputs.
pub fn compute_summary(
    reconciled: &Reconciled,
    products: &[ConsolidatedProduct],
    categories: &CategoryResolution,
) -> CatalogSummary {
    let joins_by_rule = joins_by_rule(&reconciled.groups);
    let heuristic_joins = reconciled
        .groups
        .iter()
        .flat_map(|g| &g.members)
        .filter(|m| m.rule.is_heuristic())
        .count();

    CatalogSummary {
        records_ingested: reconciled.ingested,
        quarantined: reconciled.quarantine.len(),
        products: products.len(),
        variants: products.iter().map(|p| p.variants.len()).sum(),
        heuristic_joins,
        joins_by_rule,
        mean_confidence: mean_confidence(products),
        category_identities: categories.assignments.len(),
        category_conflicts: categories.conflicts.len(),
        removals: categories.removal_log.len(),
    }
}

fn joins_by_rule(groups: &[ProductGroup]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for member in groups.iter().flat_map(|g| &g.members) {
        *counts.entry(member.rule.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Rounded to the nearest point; 0 for an empty catalog.
fn mean_confidence(products: &[ConsolidatedProduct]) -> u8 {
    if products.is_empty() {
        return 0;
    }
    let n = products.len() as u64;
    let total: u64 = products.iter().map(|p| u64::from(p.confidence)).sum();
    ((total + n / 2) / n) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ContentRow, GroupMember, MatchRule, QuarantineEntry, QuarantineReason, RawRecord,
        SourceFields,
    };

    fn member(rule: MatchRule) -> GroupMember {
        GroupMember {
            record: RawRecord::new("current", 1, SourceFields::Content(ContentRow::default())),
            key: "k".into(),
            rule,
        }
    }

    fn product(confidence: u8) -> ConsolidatedProduct {
        ConsolidatedProduct {
            handle: "h".into(),
            key: "k".into(),
            title: "t".into(),
            description: None,
            vendor: None,
            manufacturer: None,
            product_type: None,
            category: None,
            sources: vec![],
            variants: vec![],
            confidence,
            match_notes: vec![],
        }
    }

    #[test]
    fn summary_counts() {
        let reconciled = Reconciled {
            groups: vec![ProductGroup {
                key: "k".into(),
                base_title: "t".into(),
                handle: "h".into(),
                aliases: vec![],
                members: vec![
                    member(MatchRule::Created),
                    member(MatchRule::ExactKey),
                    member(MatchRule::Prefix),
                    member(MatchRule::Substring),
                ],
            }],
            quarantine: vec![QuarantineEntry {
                source: "current".into(),
                row: 9,
                title: "???".into(),
                reason: QuarantineReason::InvalidTitle,
                detail: String::new(),
            }],
            ingested: 5,
        };
        let products = vec![product(40), product(55)];
        let summary = compute_summary(&reconciled, &products, &CategoryResolution::default());

        assert_eq!(summary.records_ingested, 5);
        assert_eq!(summary.quarantined, 1);
        assert_eq!(summary.products, 2);
        assert_eq!(summary.heuristic_joins, 2);
        assert_eq!(summary.joins_by_rule["exact_key"], 1);
        assert_eq!(summary.joins_by_rule["created"], 1);
        assert_eq!(summary.mean_confidence, 48);
        assert_eq!(summary.removals, 0);
    }

    #[test]
    fn empty_catalog_has_zero_confidence() {
        assert_eq!(mean_confidence(&[]), 0);
    }
}
