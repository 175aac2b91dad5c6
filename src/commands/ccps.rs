use super::{optional, required};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::haccp::TextRule;
use crate::models::{new_id, timestamp, Ccp, CcpInput, StockItem};
use crate::store::{Direction, Document};

pub fn get_ccps(db: &Database, site: &str) -> Result<Vec<Ccp>> {
    db.query(&Ccp::query().eq("site", site).order_by("name", Direction::Asc))
}

fn build(id: String, input: CcpInput, created_at: chrono::DateTime<chrono::Utc>) -> Result<Ccp> {
    if let (Some(min), Some(max)) = (input.critical_min, input.critical_max) {
        if min > max {
            return Err(Error::validation(format!("Minimum {min} is above maximum {max}")));
        }
    }

    let critical_limit = optional(input.critical_limit);
    if let Some(rule) = &critical_limit {
        if TextRule::parse(rule).is_none() {
            tracing::warn!("Critical limit {rule:?} is not a comparison, it will not be evaluated");
        }
    }

    Ok(Ccp {
        id,
        site: required(&input.site, "Site")?,
        name: required(&input.name, "Name")?,
        process_step: required(&input.process_step, "Process step")?,
        hazard_type: input.hazard_type.trim().to_string(),
        critical_min: input.critical_min,
        critical_max: input.critical_max,
        critical_limit,
        monitoring: optional(input.monitoring),
        corrective_action: optional(input.corrective_action),
        equipment_ids: input.equipment_ids,
        stock_item_ids: input.stock_item_ids,
        created_at,
    })
}

pub fn create_ccp(db: &Database, input: CcpInput) -> Result<Ccp> {
    let ccp = build(new_id(), input, timestamp())?;
    db.insert(&ccp)?;
    tracing::info!(ccp_id = %ccp.id, "Created CCP {}", ccp.name);

    Ok(ccp)
}

pub fn update_ccp(db: &Database, id: &str, input: CcpInput) -> Result<Ccp> {
    let existing: Ccp = db.get(id)?;
    let ccp = build(existing.id, input, existing.created_at)?;
    db.set(&ccp)?;
    tracing::info!(ccp_id = id, "Updated CCP {}", ccp.name);

    Ok(ccp)
}

/// Deletes the CCP, then drops it from any stock item that links it.
pub fn delete_ccp(db: &Database, id: &str) -> Result<()> {
    let ccp: Ccp = db.get(id)?;
    db.delete::<Ccp>(id)?;

    let linked: Vec<StockItem> = db.query(&StockItem::query().eq("site", ccp.site.as_str()))?;
    for mut item in linked.into_iter().filter(|i| i.ccp_ids.iter().any(|c| c == id)) {
        item.ccp_ids.retain(|c| c != id);
        db.set(&item)?;
    }
    tracing::info!(ccp_id = id, "Deleted CCP {}", ccp.name);

    Ok(())
}
