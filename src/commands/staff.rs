use serde::{Deserialize, Serialize};

use super::required;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{new_id, timestamp, CreateStaff, StaffMember};
use crate::store::{Direction, Document};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StaffFilter {
    #[default]
    Active,
    All,
}

pub fn get_staff(db: &Database, filter: StaffFilter) -> Result<Vec<StaffMember>> {
    let mut query = StaffMember::query().order_by("name", Direction::Asc);
    if filter == StaffFilter::Active {
        query = query.eq("active", true);
    }

    db.query(&query)
}

pub fn create_staff(db: &Database, staff: CreateStaff) -> Result<StaffMember> {
    let name = required(&staff.name, "Name")?;

    let taken = db.query::<StaffMember>(&StaffMember::query().eq("name", name.as_str()))?;
    if !taken.is_empty() {
        return Err(Error::validation(format!("A staff member called {name} already exists")));
    }

    let member = StaffMember {
        id: new_id(),
        name,
        role: staff.role,
        active: true,
        created_at: timestamp(),
    };
    db.insert(&member)?;
    tracing::info!(staff_id = %member.id, "Added staff member {}", member.name);

    Ok(member)
}

/// Staff are deactivated, never deleted, so their shifts keep a name.
pub fn toggle_staff_active(db: &Database, id: &str) -> Result<StaffMember> {
    let mut member: StaffMember = db.get(id)?;
    member.active = !member.active;
    db.set(&member)?;
    tracing::info!(staff_id = id, active = member.active, "Toggled staff member");

    Ok(member)
}

/// Names offered by the login picker.
pub fn get_login_names(db: &Database) -> Result<Vec<String>> {
    Ok(get_staff(db, StaffFilter::Active)?.into_iter().map(|s| s.name).collect())
}
