//! Built-in tables used when a config file leaves a table out.

use std::collections::BTreeMap;

use crate::config::{BrandRuleConfig, SizeFamily, SizeRuleConfig};

/// Ordered size table. Compound patterns sit above the generic pattern that
/// would otherwise absorb them ("2.5 Gallon" before "5 Gallon" and "Gallon").
const SIZE_TABLE: &[(&str, &str, u32, SizeFamily)] = &[
    // liquid volume
    (r"\b2\.5\s*-?\s*gal(?:lon)?s?\b", "2.5 Gallon", 140, SizeFamily::LiquidVolume),
    (r"\b5\s*-?\s*gal(?:lon)?s?\b", "5 Gallon", 150, SizeFamily::LiquidVolume),
    (r"\b4\s*-?\s*(?:l|lt|liters?|litres?)\b", "4 Liter", 129, SizeFamily::LiquidVolume),
    (r"\b(?:1\s*-?\s*)?gal(?:lon)?s?\b", "Gallon", 130, SizeFamily::LiquidVolume),
    (r"\b(?:1\s*-?\s*)?(?:qt|quarts?)\b", "Quart", 117, SizeFamily::LiquidVolume),
    (r"\b32\s*-?\s*(?:fl\.?\s*)?(?:oz|ounces?)\b", "32 oz", 116, SizeFamily::LiquidVolume),
    (r"\b(?:1\s*-?\s*(?:l|lt|liters?|litres?)|liters?|litres?)\b", "1 Liter", 115, SizeFamily::LiquidVolume),
    (r"\b(?:1\s*-?\s*)?(?:pt|pints?)\b", "Pint", 112, SizeFamily::LiquidVolume),
    (r"\b16\s*-?\s*(?:fl\.?\s*)?(?:oz|ounces?)\b", "16 oz", 111, SizeFamily::LiquidVolume),
    (r"\b500\s*-?\s*ml\b", "500 ml", 110, SizeFamily::LiquidVolume),
    (r"\b8\s*-?\s*(?:fl\.?\s*)?(?:oz|ounces?)\b", "8 oz", 107, SizeFamily::LiquidVolume),
    (r"\b250\s*-?\s*ml\b", "250 ml", 106, SizeFamily::LiquidVolume),
    (r"\b4\s*-?\s*(?:fl\.?\s*)?(?:oz|ounces?)\b", "4 oz", 104, SizeFamily::LiquidVolume),
    (r"\b2\s*-?\s*(?:fl\.?\s*)?(?:oz|ounces?)\b", "2 oz", 102, SizeFamily::LiquidVolume),
    (r"\b1\s*-?\s*(?:fl\.?\s*)?(?:oz|ounces?)\b", "1 oz", 100, SizeFamily::LiquidVolume),
    // weight
    (r"\b50\s*-?\s*(?:lb|lbs|pounds?)\b", "50 lb", 250, SizeFamily::Weight),
    (r"\b25\s*-?\s*(?:lb|lbs|pounds?)\b", "25 lb", 240, SizeFamily::Weight),
    (r"\b10\s*-?\s*(?:lb|lbs|pounds?)\b", "10 lb", 230, SizeFamily::Weight),
    (r"\b5\s*-?\s*(?:lb|lbs|pounds?)\b", "5 lb", 220, SizeFamily::Weight),
    (r"\b1\s*-?\s*kg\b", "1 kg", 215, SizeFamily::Weight),
    (r"\b2\s*-?\s*(?:lb|lbs|pounds?)\b", "2 lb", 212, SizeFamily::Weight),
    (r"\b500\s*-?\s*g(?:rams?)?\b", "500 g", 211, SizeFamily::Weight),
    (r"\b(?:1\s*-?\s*)?(?:lb|lbs|pounds?)\b", "1 lb", 210, SizeFamily::Weight),
    (r"\b100\s*-?\s*g(?:rams?)?\b", "100 g", 205, SizeFamily::Weight),
    // linear dimension
    (r"\b4\s*x\s*8\b", "4x8", 340, SizeFamily::Dimension),
    (r"\b5\s*x\s*5\b", "5x5", 330, SizeFamily::Dimension),
    (r"\b4\s*x\s*4\b", "4x4", 320, SizeFamily::Dimension),
    (r"\b2\s*x\s*4\b", "2x4", 310, SizeFamily::Dimension),
    (r"\b8\s*-?\s*(?:ft|foot|feet)\b", "8 ft", 306, SizeFamily::Dimension),
    (r"\b6\s*-?\s*(?:ft|foot|feet)\b", "6 ft", 304, SizeFamily::Dimension),
    (r"\b4\s*-?\s*(?:ft|foot|feet)\b", "4 ft", 302, SizeFamily::Dimension),
    // wattage
    (r"\b1000\s*-?\s*w(?:atts?)?\b", "1000W", 440, SizeFamily::Wattage),
    (r"\b600\s*-?\s*w(?:atts?)?\b", "600W", 430, SizeFamily::Wattage),
    (r"\b400\s*-?\s*w(?:atts?)?\b", "400W", 420, SizeFamily::Wattage),
    (r"\b315\s*-?\s*w(?:atts?)?\b", "315W", 415, SizeFamily::Wattage),
    (r"\b100\s*-?\s*w(?:atts?)?\b", "100W", 405, SizeFamily::Wattage),
    // tier
    (r"\b(?:x-?large|xl)\b", "XL", 540, SizeFamily::Tier),
    (r"\blarge\b", "Large", 530, SizeFamily::Tier),
    (r"\bmedium\b", "Medium", 520, SizeFamily::Tier),
    (r"\bsmall\b", "Small", 510, SizeFamily::Tier),
    // count
    (r"\b12\s*-?\s*(?:pack|pk|ct|count)\b", "12 Pack", 630, SizeFamily::Count),
    (r"\b6\s*-?\s*(?:pack|pk|ct|count)\b", "6 Pack", 620, SizeFamily::Count),
    (r"\b2\s*-?\s*(?:pack|pk|ct|count)\b", "2 Pack", 610, SizeFamily::Count),
];

pub fn size_rules() -> Vec<SizeRuleConfig> {
    SIZE_TABLE
        .iter()
        .map(|(pattern, label, rank, family)| SizeRuleConfig {
            pattern: pattern.to_string(),
            label: label.to_string(),
            rank: *rank,
            family: *family,
        })
        .collect()
}

const BRAND_TABLE: &[(&str, &str)] = &[
    (r"\bfox\s*farm\b", "FoxFarm"),
    (r"\badvanced\s+nutrients\b", "Advanced Nutrients"),
    (r"\bgeneral\s+hydroponics\b", "General Hydroponics"),
    (r"\bbotanicare\b", "Botanicare"),
    (r"\bac\s+infinity\b", "AC Infinity"),
    (r"\bhydrofarm\b", "Hydrofarm"),
    (r"\bgrodan\b", "Grodan"),
    (r"\bcanna\b", "Canna"),
    (r"\bona\b", "ONA"),
];

pub fn brand_rules() -> Vec<BrandRuleConfig> {
    BRAND_TABLE
        .iter()
        .map(|(pattern, brand)| BrandRuleConfig {
            pattern: pattern.to_string(),
            brand: brand.to_string(),
        })
        .collect()
}

pub fn brand_aliases() -> BTreeMap<String, String> {
    [
        ("foxfarm", "FoxFarm"),
        ("fox farm", "FoxFarm"),
        ("ac infinity", "AC Infinity"),
        ("ph up", "pH Up"),
        ("ph down", "pH Down"),
        ("ona", "ONA"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn brand_blocklist() -> Vec<String> {
    ["grow depot", "growdepot", "the grow depot", "house brand", "default", "vendor", "unknown", "none", "n/a"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn connectives() -> Vec<String> {
    ["with", "for", "and", "the", "a", "an", "is", "of", "in", "to", "or", "by", "on", "from"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn abbreviations() -> BTreeMap<String, String> {
    [
        ("qt", "quart"),
        ("gal", "gallon"),
        ("oz", "ounce"),
        ("lb", "pound"),
        ("lbs", "pounds"),
        ("pt", "pint"),
        ("pk", "pack"),
        ("ft", "feet"),
        ("nutes", "nutrients"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn boilerplate_suffixes() -> Vec<String> {
    ["kit", "bundle", "combo", "set", "refill", "bottle", "bag", "new"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Highest priority first.
pub fn category_priority() -> Vec<String> {
    [
        "odor_control",
        "nutrients",
        "grow_lights",
        "ventilation",
        "pest_control",
        "ph_testing",
        "growing_media",
        "hydroponics",
        "propagation",
        "containers",
        "harvesting",
        "accessories",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
