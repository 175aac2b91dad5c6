use super::temperature::{get_equipment, record_reading};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Equipment, EquipmentKind, NewReading};

pub fn get_cooking_equipment(db: &Database, site: &str) -> Result<Vec<Equipment>> {
    get_equipment(db, site, Some(EquipmentKind::Cooking))
}

/// A core-temperature probe reading, only against cooking equipment.
pub fn record_probe(db: &Database, equipment_id: &str, reading: NewReading) -> Result<Equipment> {
    let equipment: Equipment = db.get(equipment_id)?;
    if equipment.kind != EquipmentKind::Cooking {
        return Err(Error::validation(format!("{} is not cooking equipment", equipment.name)));
    }

    record_reading(db, equipment_id, reading)
}
