use chrono::{Local, Timelike};
use serde::Serialize;

use super::required;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::haccp::{evaluate, parse_reading, Limits, Verdict};
use crate::models::{new_id, Ccp, Equipment, EquipmentKind, NewEquipment, NewReading, Reading};
use crate::store::{Direction, Document};

pub fn get_equipment(db: &Database, site: &str, kind: Option<EquipmentKind>) -> Result<Vec<Equipment>> {
    let mut query = Equipment::query().eq("site", site).order_by("name", Direction::Asc);
    if let Some(kind) = kind {
        query = query.eq("kind", serde_json::to_value(kind)?);
    }

    db.query(&query)
}

pub fn add_equipment(db: &Database, equipment: NewEquipment) -> Result<Equipment> {
    let equipment = Equipment {
        id: new_id(),
        site: required(&equipment.site, "Site")?,
        name: required(&equipment.name, "Name")?,
        kind: equipment.kind,
        readings: Vec::new(),
    };
    db.insert(&equipment)?;
    tracing::info!(equipment_id = %equipment.id, "Added {:?} {}", equipment.kind, equipment.name);

    Ok(equipment)
}

/// Deletes the equipment and unlinks it from every CCP on the site.
pub fn delete_equipment(db: &Database, id: &str) -> Result<()> {
    let equipment: Equipment = db.get(id)?;
    db.delete::<Equipment>(id)?;

    let ccps: Vec<Ccp> = db.query(&Ccp::query().eq("site", equipment.site.as_str()))?;
    for mut ccp in ccps.into_iter().filter(|c| c.equipment_ids.iter().any(|e| e == id)) {
        ccp.equipment_ids.retain(|e| e != id);
        db.set(&ccp)?;
    }
    tracing::info!(equipment_id = id, "Deleted equipment {}", equipment.name);

    Ok(())
}

/// Appends a reading. The value must be numeric; date and time default to now.
pub fn record_reading(db: &Database, equipment_id: &str, reading: NewReading) -> Result<Equipment> {
    let mut equipment: Equipment = db.get(equipment_id)?;

    let value = required(&reading.value, "Reading")?;
    if parse_reading(&value).is_none() {
        return Err(Error::validation(format!("Reading must be a number, got {value:?}")));
    }
    let recorded_by = required(&reading.recorded_by, "Name")?;

    let now = Local::now();
    equipment.readings.push(Reading {
        value,
        date: reading.date.unwrap_or_else(|| now.date_naive()),
        time: reading.time.unwrap_or_else(|| now.time().with_nanosecond(0).unwrap_or(now.time())),
        recorded_by,
    });
    db.set(&equipment)?;
    tracing::info!(equipment_id, "Recorded reading for {}", equipment.name);

    Ok(equipment)
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct EquipmentRow {
    pub equipment_id: String,
    pub name: String,
    pub kind: EquipmentKind,
    pub latest: Option<Reading>,
    pub verdict: Option<Verdict>,
}

/// Latest reading per piece of equipment, judged against every CCP that
/// links it. The first failing CCP wins; with no linking CCP the reading is
/// judged against no limits.
pub fn equipment_rows(equipment: &[Equipment], ccps: &[Ccp]) -> Vec<EquipmentRow> {
    equipment
        .iter()
        .map(|eq| {
            let latest = eq.latest_reading().cloned();
            let verdict = latest.as_ref().map(|reading| {
                let verdicts: Vec<Verdict> = ccps
                    .iter()
                    .filter(|ccp| ccp.equipment_ids.contains(&eq.id))
                    .map(|ccp| evaluate(&Limits::of(ccp), Some(&reading.value)))
                    .collect();

                match verdicts.iter().find(|v| !v.passed()).or(verdicts.first()) {
                    Some(verdict) => verdict.clone(),
                    None => evaluate(&Limits::default(), Some(&reading.value)),
                }
            });

            EquipmentRow {
                equipment_id: eq.id.clone(),
                name: eq.name.clone(),
                kind: eq.kind,
                latest,
                verdict,
            }
        })
        .collect()
}
