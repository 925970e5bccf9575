//! Data-completeness score for a consolidated product, 0..=100.
//!
//! Each bucket adds a fixed number of points; filling a field can only
//! raise the score.

use crate::config::ScoringConfig;
use crate::model::ConsolidatedProduct;

pub const DESCRIPTION_POINTS: u32 = 25;
pub const VENDOR_POINTS: u32 = 15;
pub const MANUFACTURER_POINTS: u32 = 10;
pub const CATEGORY_POINTS: u32 = 10;
pub const BARCODE_POINTS_EACH: u32 = 5;
pub const BARCODE_POINTS_MAX: u32 = 20;
pub const PRICE_POINTS: u32 = 10;
pub const STOCK_POINTS: u32 = 10;

pub const MAX_SCORE: u32 = 100;

pub fn score(product: &ConsolidatedProduct, scoring: &ScoringConfig) -> u8 {
    let mut points = 0;

    let description_len = product
        .description
        .as_deref()
        .map(|d| d.trim().chars().count())
        .unwrap_or(0);
    if description_len >= scoring.min_description_len {
        points += DESCRIPTION_POINTS;
    }
    if product.vendor.is_some() {
        points += VENDOR_POINTS;
    }
    if product.manufacturer.is_some() {
        points += MANUFACTURER_POINTS;
    }
    if product.product_type.is_some() || product.category.is_some() {
        points += CATEGORY_POINTS;
    }

    let barcodes = product.variants.iter().filter(|v| v.barcode.is_some()).count() as u32;
    points += (barcodes * BARCODE_POINTS_EACH).min(BARCODE_POINTS_MAX);

    if product.variants.iter().any(|v| v.price_cents.is_some_and(|p| p > 0)) {
        points += PRICE_POINTS;
    }
    if product.variants.iter().any(|v| v.inventory.is_some_and(|n| n > 0)) {
        points += STOCK_POINTS;
    }

    points.min(MAX_SCORE) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Provenance, Variant};

    fn variant(barcode: Option<&str>, price: Option<i64>, stock: Option<i64>) -> Variant {
        Variant {
            size: "Quart".into(),
            rank: 117,
            sku: None,
            price_cents: price,
            compare_at_cents: None,
            cost_cents: None,
            barcode: barcode.map(String::from),
            inventory: stock,
            weight: None,
            provenance: Provenance::Content,
            contributors: vec![],
        }
    }

    fn bare() -> ConsolidatedProduct {
        ConsolidatedProduct {
            handle: "florablend".into(),
            key: "florablend".into(),
            title: "FloraBlend".into(),
            description: None,
            vendor: None,
            manufacturer: None,
            product_type: None,
            category: None,
            sources: vec!["current".into()],
            variants: vec![variant(None, None, None)],
            confidence: 0,
            match_notes: vec![],
        }
    }

    #[test]
    fn empty_product_scores_zero() {
        assert_eq!(score(&bare(), &ScoringConfig::default()), 0);
    }

    #[test]
    fn full_product_scores_one_hundred() {
        let mut p = bare();
        p.description = Some("A vegan, biodynamic bloom formula for soil and hydro.".into());
        p.vendor = Some("FoxFarm".into());
        p.manufacturer = Some("FoxFarm Soil & Fertilizer Co.".into());
        p.product_type = Some("Nutrients".into());
        p.variants = (0..5)
            .map(|i| variant(Some("0123"), Some(1999 + i), Some(3)))
            .collect();
        assert_eq!(score(&p, &ScoringConfig::default()), 100);
    }

    #[test]
    fn short_description_earns_nothing() {
        let mut p = bare();
        p.description = Some("Great stuff.".into());
        assert_eq!(score(&p, &ScoringConfig::default()), 0);
        let lenient = ScoringConfig { min_description_len: 5 };
        assert_eq!(score(&p, &lenient), DESCRIPTION_POINTS as u8);
    }

    #[test]
    fn barcode_points_are_capped() {
        let mut p = bare();
        p.variants = (0..2).map(|_| variant(Some("1"), None, None)).collect();
        assert_eq!(score(&p, &ScoringConfig::default()), 10);
        p.variants = (0..9).map(|_| variant(Some("1"), None, None)).collect();
        assert_eq!(score(&p, &ScoringConfig::default()), 20);
    }

    #[test]
    fn zero_price_and_stock_do_not_count() {
        let mut p = bare();
        p.variants = vec![variant(None, Some(0), Some(0))];
        assert_eq!(score(&p, &ScoringConfig::default()), 0);
        p.category = Some("nutrients".into());
        assert_eq!(score(&p, &ScoringConfig::default()), 10);
    }
}
