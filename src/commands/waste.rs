use std::collections::BTreeMap;

use serde::Serialize;

use super::{optional, required};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{new_id, timestamp, CreateWasteEntry, WasteEntry, WasteReason};
use crate::store::{Direction, Document};

pub fn log_waste(db: &Database, entry: CreateWasteEntry) -> Result<WasteEntry> {
    if !entry.quantity.is_finite() || entry.quantity <= 0.0 {
        return Err(Error::validation("Quantity must be positive"));
    }
    if matches!(entry.estimated_cost, Some(cost) if !cost.is_finite() || cost < 0.0) {
        return Err(Error::validation("Estimated cost cannot be negative"));
    }

    let entry = WasteEntry {
        id: new_id(),
        site: required(&entry.site, "Site")?,
        item: required(&entry.item, "Item")?,
        quantity: entry.quantity,
        unit: entry.unit,
        reason: entry.reason,
        notes: optional(entry.notes),
        estimated_cost: entry.estimated_cost,
        recorded_by: required(&entry.recorded_by, "Name")?,
        recorded_at: timestamp(),
    };
    db.insert(&entry)?;
    tracing::info!(entry_id = %entry.id, reason = ?entry.reason, "Logged waste: {}", entry.item);

    Ok(entry)
}

pub fn get_waste_log(db: &Database, site: &str) -> Result<Vec<WasteEntry>> {
    db.query(&WasteEntry::query().eq("site", site).order_by("recorded_at", Direction::Desc))
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ReasonTotal {
    pub reason: WasteReason,
    pub entries: usize,
    pub estimated_cost: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WasteSummary {
    pub entries: usize,
    pub estimated_cost: f64,
    pub by_reason: Vec<ReasonTotal>,
}

/// Entries without a cost estimate count towards `entries` only.
pub fn waste_summary(entries: &[WasteEntry]) -> WasteSummary {
    let mut by_reason: BTreeMap<WasteReason, ReasonTotal> = BTreeMap::new();

    for entry in entries {
        let total = by_reason.entry(entry.reason).or_insert(ReasonTotal {
            reason: entry.reason,
            entries: 0,
            estimated_cost: 0.0,
        });
        total.entries += 1;
        total.estimated_cost += entry.estimated_cost.unwrap_or(0.0);
    }

    WasteSummary {
        entries: entries.len(),
        estimated_cost: by_reason.values().map(|t| t.estimated_cost).sum(),
        by_reason: by_reason.into_values().collect(),
    }
}
