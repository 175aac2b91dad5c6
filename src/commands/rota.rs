use chrono::{DateTime, Datelike, Duration, NaiveDate, SubsecRound, Utc};
use serde::Serialize;

use super::{optional, staff::get_staff, staff::StaffFilter};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{new_id, CreateShift, Shift, ShiftStatus, StaffMember, UpdateShift};
use crate::store::{Direction, Document, Op};

fn week_bounds(week_start: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = week_start.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::days(7))
}

fn check_times(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end <= start {
        return Err(Error::validation("Shift must end after it starts"));
    }
    Ok(())
}

/// Staff offered when building a rota: active members only.
pub fn get_rota_staff(db: &Database) -> Result<Vec<StaffMember>> {
    get_staff(db, StaffFilter::Active)
}

pub fn create_shift(db: &Database, shift: CreateShift) -> Result<Shift> {
    let member: StaffMember = db.get(&shift.staff_id)?;
    if !member.active {
        return Err(Error::validation(format!("{} is not active", member.name)));
    }
    check_times(shift.start, shift.end)?;

    let shift = Shift {
        id: new_id(),
        staff_id: member.id,
        role: shift.role.unwrap_or(member.role),
        start: shift.start.trunc_subsecs(0),
        end: shift.end.trunc_subsecs(0),
        status: ShiftStatus::Draft,
        notes: optional(shift.notes),
    };
    db.insert(&shift)?;
    tracing::info!(shift_id = %shift.id, staff_id = %shift.staff_id, "Created draft shift");

    Ok(shift)
}

pub fn update_shift(db: &Database, shift: UpdateShift) -> Result<Shift> {
    db.get::<Shift>(&shift.id)?;
    db.get::<StaffMember>(&shift.staff_id)?;
    check_times(shift.start, shift.end)?;

    let shift = Shift {
        id: shift.id,
        staff_id: shift.staff_id,
        role: shift.role,
        start: shift.start.trunc_subsecs(0),
        end: shift.end.trunc_subsecs(0),
        status: shift.status,
        notes: optional(shift.notes),
    };
    db.set(&shift)?;
    tracing::info!(shift_id = %shift.id, "Updated shift");

    Ok(shift)
}

pub fn delete_shift(db: &Database, id: &str) -> Result<()> {
    db.delete::<Shift>(id)?;
    tracing::info!(shift_id = id, "Deleted shift");
    Ok(())
}

/// Shifts starting in `[week_start, week_start + 7 days)`, earliest first.
pub fn get_week_shifts(db: &Database, week_start: NaiveDate) -> Result<Vec<Shift>> {
    let (start, end) = week_bounds(week_start);

    db.query(
        &Shift::query()
            .filter("start", Op::Gte, serde_json::to_value(start)?)
            .filter("start", Op::Lt, serde_json::to_value(end)?)
            .order_by("start", Direction::Asc),
    )
}

/// Publishes every draft in the week. Returns how many changed.
pub fn publish_week(db: &Database, week_start: NaiveDate) -> Result<usize> {
    let mut published = 0;
    for mut shift in get_week_shifts(db, week_start)? {
        if shift.status == ShiftStatus::Draft {
            shift.status = ShiftStatus::Published;
            db.set(&shift)?;
            published += 1;
        }
    }
    tracing::info!(%week_start, published, "Published rota week");

    Ok(published)
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RotaRow {
    pub staff_id: String,
    pub name: String,
    pub active: bool,
    /// Seven days, index 0 is `week_start`.
    pub days: Vec<Vec<Shift>>,
}

/// One row per active member, plus inactive members who still have shifts
/// in the week.
pub fn week_view(week_start: NaiveDate, staff: &[StaffMember], shifts: &[Shift]) -> Vec<RotaRow> {
    staff
        .iter()
        .filter_map(|member| {
            let mut days = vec![Vec::new(); 7];
            for shift in shifts.iter().filter(|s| s.staff_id == member.id) {
                let offset = (shift.start.date_naive() - week_start).num_days();
                if (0..7).contains(&offset) {
                    days[offset as usize].push(shift.clone());
                }
            }

            let has_shifts = days.iter().any(|d| !d.is_empty());
            (member.active || has_shifts).then(|| RotaRow {
                staff_id: member.id.clone(),
                name: member.name.clone(),
                active: member.active,
                days,
            })
        })
        .collect()
}

/// Monday of the week containing `day`.
pub fn week_containing(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}
