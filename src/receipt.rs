//! Turns OCR text from a receipt photo into stock candidates.
//!
//! Nothing here writes to the store: the candidates are shown to the user,
//! edited, and only then committed through `commands::stock`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::models::{new_id, ReceiptCandidate, Unit};

pub const DEFAULT_LOCATION: &str = "Unassigned";
pub const DEFAULT_SUPPLIER: &str = "Unknown";

static SKIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:sub\s?-?total|total|tax|vat|change|balance)\b").unwrap());

/// An amount carrying a currency sign or code, before or after the number.
static CURRENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[£$€]\s?\d+(?:[.,]\d{1,2})?|\b\d+[.,]\d{2}\s?(?:[£$€]|gbp\b|eur\b|usd\b)").unwrap()
});

static BARE_AMOUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+\.\d{2}\b").unwrap());

static UNIT_AFTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\s?(?:kg|g|ml|l)\b").unwrap());

static WEIGHT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(\d+(?:[.,]\d+)?)\s?(kg|g|ml|l)\b").unwrap());

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());

fn to_number(raw: &str) -> Option<f64> {
    NUMBER.find(raw)?.as_str().replace(',', ".").parse().ok()
}

/// Canonical quantity for a weight token: grams become kilograms, millilitres
/// and litres become a unit count.
fn canonical_quantity(amount: f64, suffix: &str) -> (f64, Unit) {
    match suffix.to_ascii_lowercase().as_str() {
        "g" => (amount / 1000.0, Unit::Kg),
        "kg" => (amount, Unit::Kg),
        "ml" => (amount / 1000.0, Unit::Unit),
        _ => (amount, Unit::Unit),
    }
}

/// Reads one receipt line. `None` for totals and for lines without a usable name.
pub fn parse_line(line: &str) -> Option<ReceiptCandidate> {
    let line = line.trim();
    if line.is_empty() || SKIP.is_match(line) {
        return None;
    }

    let mut rest = line.to_string();

    // A marked amount wins; otherwise the last bare amount that is not a weight.
    let price = CURRENCY
        .find(&rest)
        .or_else(|| {
            BARE_AMOUNT
                .find_iter(&rest)
                .filter(|m| !UNIT_AFTER.is_match(&rest[m.end()..]))
                .last()
        })
        .map(|m| (m.range(), to_number(m.as_str())));
    let price = match price {
        Some((range, value)) => {
            rest.replace_range(range, " ");
            value
        }
        None => None,
    };

    let weight = WEIGHT.captures(&rest).and_then(|caps| {
        let whole = caps.get(0)?;
        let amount = to_number(caps.get(1)?.as_str())?;
        Some((whole.range(), whole.as_str().to_string(), canonical_quantity(amount, caps.get(2)?.as_str())))
    });
    let (raw_weight, (quantity, unit)) = match weight {
        Some((range, raw, canonical)) => {
            rest.replace_range(range, " ");
            (Some(raw), canonical)
        }
        None => (None, (1.0, Unit::Unit)),
    };

    let name = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.chars().count() < 2 {
        return None;
    }

    Some(ReceiptCandidate {
        id: new_id(),
        name,
        quantity,
        unit,
        price,
        raw_weight,
        location: DEFAULT_LOCATION.to_string(),
        supplier: DEFAULT_SUPPLIER.to_string(),
    })
}

/// Lazily yields a candidate per usable line.
pub struct ReceiptLines<'a> {
    lines: std::str::Lines<'a>,
}

impl<'a> ReceiptLines<'a> {
    pub fn new(text: &'a str) -> Self {
        ReceiptLines { lines: text.lines() }
    }
}

impl Iterator for ReceiptLines<'_> {
    type Item = ReceiptCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.by_ref().find_map(parse_line)
    }
}

/// Every candidate on the receipt, or [`Error::NoItemsParsed`] when none.
pub fn parse_receipt(text: &str) -> Result<Vec<ReceiptCandidate>> {
    let candidates: Vec<_> = ReceiptLines::new(text).collect();

    if candidates.is_empty() {
        tracing::info!("Receipt text produced no stock candidates");
        return Err(Error::NoItemsParsed);
    }

    tracing::debug!(count = candidates.len(), "Parsed receipt");
    Ok(candidates)
}
