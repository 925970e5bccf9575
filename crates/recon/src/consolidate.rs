//! Turns a frozen [`ProductGroup`] into a [`ConsolidatedProduct`].

use crate::brand::BrandEvidence;
use crate::category::{handle_identity, sku_identity, title_identity};
use crate::keyer::is_singleton_key;
use crate::model::{ConsolidatedProduct, ProductGroup, RawRecord};
use crate::tables::Tables;
use crate::{confidence, variants};

/// Identities under which the category master files may know this group:
/// member skus, then member handles, then the base-title key.
pub fn product_identities(group: &ProductGroup) -> Vec<String> {
    let mut out = Vec::new();
    let mut push = |id: Option<String>| {
        if let Some(id) = id {
            if !out.contains(&id) {
                out.push(id);
            }
        }
    };
    for m in &group.members {
        push(m.record.sku().and_then(sku_identity));
    }
    for m in &group.members {
        push(m.record.handle().and_then(handle_identity));
    }
    if !is_singleton_key(&group.key) {
        push(title_identity(&group.key));
    }
    out
}

fn first<'a>(
    group: &'a ProductGroup,
    field: impl Fn(&'a RawRecord) -> Option<&'a str>,
) -> Option<&'a str> {
    group.members.iter().find_map(|m| field(&m.record))
}

pub fn consolidate(
    tables: &Tables,
    group: &ProductGroup,
    category: Option<String>,
) -> ConsolidatedProduct {
    let primary = group.members.first().map(|m| &m.record);
    let primary_source = primary.map(|r| r.source.as_str()).unwrap_or("");

    let evidence = BrandEvidence {
        title: primary.map(|r| r.title()).unwrap_or(&group.base_title),
        tags: first(group, RawRecord::tags).unwrap_or(""),
        vendor: primary.and_then(RawRecord::vendor),
        alternate_vendor: group
            .members
            .iter()
            .filter(|m| m.record.source != primary_source)
            .find_map(|m| m.record.vendor()),
        fallback: first(group, RawRecord::manufacturer),
    };

    let match_notes = group
        .members
        .iter()
        .filter(|m| m.rule.is_heuristic())
        .map(|m| {
            format!(
                "{}:{} {:?} joined '{}' by {} match",
                m.record.source,
                m.record.row,
                m.record.title(),
                group.key,
                m.rule
            )
        })
        .collect();

    let mut product = ConsolidatedProduct {
        handle: group.handle.clone(),
        key: group.key.clone(),
        title: group.base_title.clone(),
        description: first(group, RawRecord::description).map(str::to_string),
        vendor: tables.brands.resolve(&evidence),
        manufacturer: first(group, RawRecord::manufacturer).map(str::to_string),
        product_type: first(group, RawRecord::product_type).map(str::to_string),
        category,
        sources: group.sources(),
        variants: variants::build_variants(&tables.sizes, group),
        confidence: 0,
        match_notes,
    };
    product.confidence = confidence::score(&product, &tables.scoring);
    product
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::model::{ContentRow, GroupMember, InventoryRow, MatchRule, SourceFields};

    const CONFIG: &str = r#"
name = "t"
[[sources]]
name = "current"
kind = "content"
file = "c.csv"
priority = 1
[sources.columns]
title = "Title"
"#;

    fn tables() -> Tables {
        Tables::compile(&CatalogConfig::from_toml(CONFIG).unwrap()).unwrap()
    }

    fn group() -> ProductGroup {
        let content = RawRecord::new(
            "current",
            1,
            SourceFields::Content(ContentRow {
                handle: "root-tonic".into(),
                title: "Root Tonic Quart".into(),
                sku: "RT-QT".into(),
                vendor: "Grow Depot".into(),
                description: "Kelp and humic acids to build a dense, healthy root zone.".into(),
                ..Default::default()
            }),
        );
        let feed = RawRecord::new(
            "vendor",
            3,
            SourceFields::Inventory(InventoryRow {
                title: "Root Tonic".into(),
                vendor: "green leaf labs".into(),
                manufacturer: "Green Leaf Labs LLC".into(),
                inventory: Some(4),
                ..Default::default()
            }),
        );
        ProductGroup {
            key: "roottonic".into(),
            base_title: "Root Tonic".into(),
            handle: "root-tonic".into(),
            aliases: vec![],
            members: vec![
                GroupMember { record: content, key: "roottonic".into(), rule: MatchRule::Created },
                GroupMember { record: feed, key: "roottonicx".into(), rule: MatchRule::Prefix },
            ],
        }
    }

    #[test]
    fn fields_come_from_first_member_that_has_them() {
        let p = consolidate(&tables(), &group(), None);
        assert_eq!(p.title, "Root Tonic");
        assert!(p.description.as_deref().unwrap().starts_with("Kelp"));
        assert_eq!(p.manufacturer.as_deref(), Some("Green Leaf Labs LLC"));
        // "Grow Depot" is blocklisted, the other source's vendor is next
        assert_eq!(p.vendor.as_deref(), Some("Green Leaf Labs"));
        assert_eq!(p.sources, vec!["current", "vendor"]);
    }

    #[test]
    fn heuristic_joins_leave_notes() {
        let p = consolidate(&tables(), &group(), None);
        assert_eq!(p.match_notes.len(), 1);
        assert!(p.match_notes[0].starts_with("vendor:3"));
        assert!(p.match_notes[0].ends_with("by prefix match"));
    }

    #[test]
    fn confidence_counts_category() {
        let t = tables();
        let without = consolidate(&t, &group(), None).confidence;
        let with = consolidate(&t, &group(), Some("nutrients".into())).confidence;
        assert_eq!(with, without + 10);
    }

    #[test]
    fn identities_in_lookup_order() {
        assert_eq!(
            product_identities(&group()),
            vec!["sku:rtqt", "handle:root-tonic", "title:roottonic"]
        );
    }
}
