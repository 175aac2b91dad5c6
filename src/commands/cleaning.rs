use chrono::{Duration, NaiveDate, NaiveTime};

use super::required;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{new_id, timestamp, CleaningRecord};
use crate::store::{Direction, Document, Op};

pub const CLEANING_TASKS: &[&str] = &[
    "Clean food preparation surfaces",
    "Clean chopping boards",
    "Clean and sanitise fridges",
    "Defrost and clean freezers",
    "Clean ovens and hobs",
    "Clean extraction hood and filters",
    "Clean floors",
    "Empty and clean bins",
    "Clean hand wash basins",
    "Clean walls and doors",
];

pub fn get_cleaning_tasks() -> Vec<&'static str> {
    CLEANING_TASKS.to_vec()
}

pub fn log_cleaning(db: &Database, site: &str, task: &str, completed_by: &str) -> Result<CleaningRecord> {
    let Some(task) = CLEANING_TASKS.iter().find(|t| **t == task.trim()) else {
        return Err(Error::validation(format!("Unknown cleaning task: {task}")));
    };

    let record = CleaningRecord {
        id: new_id(),
        site: required(site, "Site")?,
        task: task.to_string(),
        completed_by: required(completed_by, "Name")?,
        completed_at: timestamp(),
    };
    db.insert(&record)?;
    tracing::info!(record_id = %record.id, "Logged cleaning: {}", record.task);

    Ok(record)
}

/// Newest first. `day` narrows to one UTC calendar day.
pub fn get_cleaning_records(db: &Database, site: &str, day: Option<NaiveDate>) -> Result<Vec<CleaningRecord>> {
    let mut query = CleaningRecord::query().eq("site", site);
    if let Some(day) = day {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        query = query
            .filter("completed_at", Op::Gte, serde_json::to_value(start)?)
            .filter("completed_at", Op::Lt, serde_json::to_value(start + Duration::days(1))?);
    }

    db.query(&query.order_by("completed_at", Direction::Desc))
}

/// Tasks with no record on `day`, in task-list order.
pub fn outstanding_tasks(records: &[CleaningRecord], day: NaiveDate) -> Vec<&'static str> {
    CLEANING_TASKS
        .iter()
        .copied()
        .filter(|task| {
            !records
                .iter()
                .any(|r| r.task == *task && r.completed_at.date_naive() == day)
        })
        .collect()
}
