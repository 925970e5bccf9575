//! CSV loading for source exports and category master files.
//!
//! Headers are matched exactly (after trimming). A configured column that
//! the file lacks is an error; unparsable money or stock cells are logged
//! and read as empty.

use csv::StringRecord;
use log::warn;

use crate::config::{CategoryFileConfig, SourceConfig, SourceKind};
use crate::error::CatalogError;
use crate::model::{CategoryRow, ContentRow, InventoryRow, PricingRow, RawRecord, SourceFields};

struct Headers<'a> {
    owner: &'a str,
    names: Vec<String>,
}

impl Headers<'_> {
    fn required(&self, name: &str) -> Result<usize, CatalogError> {
        self.names
            .iter()
            .position(|h| h == name.trim())
            .ok_or_else(|| CatalogError::MissingColumn {
                source: self.owner.to_string(),
                column: name.to_string(),
            })
    }

    fn optional(&self, name: Option<&String>) -> Result<Option<usize>, CatalogError> {
        name.map(|n| self.required(n)).transpose()
    }
}

fn reader(csv_data: &str) -> csv::Reader<&[u8]> {
    let data = csv_data.strip_prefix('\u{feff}').unwrap_or(csv_data);
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes())
}

fn read_headers<'a>(
    owner: &'a str,
    reader: &mut csv::Reader<&[u8]>,
) -> Result<Headers<'a>, CatalogError> {
    let names = reader
        .headers()
        .map_err(|e| CatalogError::Csv {
            source: owner.to_string(),
            message: e.to_string(),
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    Ok(Headers { owner, names })
}

fn text(record: &StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| record.get(i))
        .unwrap_or("")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

struct SourceColumns {
    title: usize,
    handle: Option<usize>,
    sku: Option<usize>,
    vendor: Option<usize>,
    description: Option<usize>,
    product_type: Option<usize>,
    tags: Option<usize>,
    manufacturer: Option<usize>,
    category: Option<usize>,
    barcode: Option<usize>,
    price: Option<usize>,
    compare_at: Option<usize>,
    cost: Option<usize>,
    inventory: Option<usize>,
    weight: Option<usize>,
}

/// Parse one source export into typed records, 1-based row numbers.
pub fn load_source_rows(
    source: &SourceConfig,
    csv_data: &str,
) -> Result<Vec<RawRecord>, CatalogError> {
    let mut rdr = reader(csv_data);
    let headers = read_headers(&source.name, &mut rdr)?;
    let c = &source.columns;
    let cols = SourceColumns {
        title: headers.required(&c.title)?,
        handle: headers.optional(c.handle.as_ref())?,
        sku: headers.optional(c.sku.as_ref())?,
        vendor: headers.optional(c.vendor.as_ref())?,
        description: headers.optional(c.description.as_ref())?,
        product_type: headers.optional(c.product_type.as_ref())?,
        tags: headers.optional(c.tags.as_ref())?,
        manufacturer: headers.optional(c.manufacturer.as_ref())?,
        category: headers.optional(c.category.as_ref())?,
        barcode: headers.optional(c.barcode.as_ref())?,
        price: headers.optional(c.price.as_ref())?,
        compare_at: headers.optional(c.compare_at.as_ref())?,
        cost: headers.optional(c.cost.as_ref())?,
        inventory: headers.optional(c.inventory.as_ref())?,
        weight: headers.optional(c.weight.as_ref())?,
    };

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| CatalogError::Csv {
            source: source.name.clone(),
            message: e.to_string(),
        })?;
        let row = i + 1;
        let cell = CellReader {
            source: &source.name,
            row,
            record: &record,
        };
        let fields = match source.kind {
            SourceKind::Content => SourceFields::Content(ContentRow {
                handle: text(&record, cols.handle),
                title: text(&record, Some(cols.title)),
                sku: text(&record, cols.sku),
                vendor: text(&record, cols.vendor),
                description: text(&record, cols.description),
                product_type: text(&record, cols.product_type),
                tags: text(&record, cols.tags),
                barcode: text(&record, cols.barcode),
                price_cents: cell.money(cols.price),
                compare_at_cents: cell.money(cols.compare_at),
                inventory: cell.count(cols.inventory),
                weight: text(&record, cols.weight),
            }),
            SourceKind::Pricing => SourceFields::Pricing(PricingRow {
                sku: text(&record, cols.sku),
                handle: text(&record, cols.handle),
                title: text(&record, Some(cols.title)),
                brand: text(&record, cols.vendor),
                category: text(&record, cols.category.or(cols.product_type)),
                barcode: text(&record, cols.barcode),
                price_cents: cell.money(cols.price),
                compare_at_cents: cell.money(cols.compare_at),
                cost_cents: cell.money(cols.cost),
                inventory: cell.count(cols.inventory),
                weight: text(&record, cols.weight),
            }),
            SourceKind::Inventory => SourceFields::Inventory(InventoryRow {
                sku: text(&record, cols.sku),
                title: text(&record, Some(cols.title)),
                vendor: text(&record, cols.vendor),
                manufacturer: text(&record, cols.manufacturer),
                category: text(&record, cols.category.or(cols.product_type)),
                barcode: text(&record, cols.barcode),
                cost_cents: cell.money(cols.cost),
                price_cents: cell.money(cols.price),
                inventory: cell.count(cols.inventory),
                weight: text(&record, cols.weight),
            }),
        };
        rows.push(RawRecord::new(source.name.clone(), row, fields));
    }
    Ok(rows)
}

struct CellReader<'a> {
    source: &'a str,
    row: usize,
    record: &'a StringRecord,
}

impl CellReader<'_> {
    fn money(&self, idx: Option<usize>) -> Option<i64> {
        let raw = text(self.record, idx);
        match parse_money_cents(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("{} row {}: ignoring amount {raw:?}: {e}", self.source, self.row);
                None
            }
        }
    }

    fn count(&self, idx: Option<usize>) -> Option<i64> {
        let raw = text(self.record, idx);
        match parse_count(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("{} row {}: ignoring count {raw:?}: {e}", self.source, self.row);
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Category master files
// ---------------------------------------------------------------------------

pub fn load_category_rows(
    file: &CategoryFileConfig,
    csv_data: &str,
) -> Result<Vec<CategoryRow>, CatalogError> {
    let mut rdr = reader(csv_data);
    let headers = read_headers(&file.file, &mut rdr)?;
    let title = headers.required(&file.columns.title)?;
    let sku = headers.optional(file.columns.sku.as_ref())?;
    let handle = headers.optional(file.columns.handle.as_ref())?;
    let category = headers.optional(file.columns.category.as_ref())?;

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| CatalogError::Csv {
            source: file.file.clone(),
            message: e.to_string(),
        })?;
        // a per-row category column wins over the file label
        let label = match (category, &file.label) {
            (Some(idx), label) => {
                let cell = text(&record, Some(idx));
                if cell.is_empty() {
                    label.clone().unwrap_or_default()
                } else {
                    cell
                }
            }
            (None, Some(label)) => label.clone(),
            (None, None) => String::new(),
        };
        rows.push(CategoryRow {
            source_file: file.file.clone(),
            row: i + 1,
            title: text(&record, Some(title)),
            sku: text(&record, sku),
            handle: text(&record, handle),
            category: label,
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Decimal currency string to cents without going through `f64`.
///
/// Accepts `$`, thousands separators, a leading `-` or accounting
/// parentheses. Empty input is `Ok(None)`.
pub fn parse_money_cents(s: &str) -> Result<Option<i64>, String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let (negative, s) = if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        (true, inner.trim())
    } else if let Some(rest) = s.strip_prefix('-') {
        (true, rest.trim())
    } else {
        (false, s)
    };
    let s = s.trim_start_matches('$').trim();
    let s: String = s.chars().filter(|c| *c != ',').collect();
    if s.is_empty() {
        return Err("no digits".into());
    }

    let (dollars, frac) = match s.split_once('.') {
        Some((d, f)) => (d, f),
        None => (s.as_str(), ""),
    };
    if dollars.is_empty() && frac.is_empty() {
        return Err(format!("no digits: {s}"));
    }
    if !dollars.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("not a number: {s}"));
    }
    let whole: i64 = if dollars.is_empty() {
        0
    } else {
        dollars.parse().map_err(|e| format!("bad dollars: {e}"))?
    };
    let cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|e| format!("bad cents: {e}"))? * 10,
        2 => frac.parse().map_err(|e| format!("bad cents: {e}"))?,
        _ => return Err(format!("too many decimal places: {s}")),
    };
    let minor = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(cents))
        .ok_or_else(|| format!("amount out of range: {s}"))?;
    Ok(Some(if negative { -minor } else { minor }))
}

/// Whole-unit stock count; `"12.0"` is accepted, `"12.5"` is not.
pub fn parse_count(s: &str) -> Result<Option<i64>, String> {
    let s = s.trim().replace(',', "");
    if s.is_empty() {
        return Ok(None);
    }
    let int_part = match s.split_once('.') {
        Some((i, f)) if f.chars().all(|c| c == '0') => i.to_string(),
        Some(_) => return Err(format!("fractional count: {s}")),
        None => s,
    };
    int_part
        .parse::<i64>()
        .map(Some)
        .map_err(|e| format!("bad count: {e}"))
}
