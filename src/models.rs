use chrono::{DateTime, NaiveDate, NaiveTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::{Collection, Document};

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Whole seconds keep stored timestamps comparable as text.
pub fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

macro_rules! document {
    ($ty:ty, $collection:expr) => {
        impl Document for $ty {
            const COLLECTION: Collection = $collection;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

// ===== HACCP =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ccp {
    pub id: String,
    pub site: String,
    pub name: String,
    pub process_step: String,
    pub hazard_type: String,
    pub critical_min: Option<f64>,
    pub critical_max: Option<f64>,
    /// Free-text rule such as `<=5`, used when no numeric bound is set.
    pub critical_limit: Option<String>,
    pub monitoring: Option<String>,
    pub corrective_action: Option<String>,
    #[serde(default)]
    pub equipment_ids: Vec<String>,
    #[serde(default)]
    pub stock_item_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

document!(Ccp, Collection::Ccps);

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CcpInput {
    pub site: String,
    pub name: String,
    pub process_step: String,
    pub hazard_type: String,
    pub critical_min: Option<f64>,
    pub critical_max: Option<f64>,
    pub critical_limit: Option<String>,
    pub monitoring: Option<String>,
    pub corrective_action: Option<String>,
    #[serde(default)]
    pub equipment_ids: Vec<String>,
    #[serde(default)]
    pub stock_item_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum EquipmentKind {
    Fridge,
    Freezer,
    Cooking,
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Reading {
    /// As entered; evaluation parses it.
    pub value: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub recorded_by: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Equipment {
    pub id: String,
    pub site: String,
    pub name: String,
    pub kind: EquipmentKind,
    #[serde(default)]
    pub readings: Vec<Reading>,
}

document!(Equipment, Collection::Equipment);

impl Equipment {
    /// Latest by recorded date and time, not by position. Ties go to the
    /// reading appended last.
    pub fn latest_reading(&self) -> Option<&Reading> {
        self.readings.iter().max_by_key(|r| (r.date, r.time))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewEquipment {
    pub site: String,
    pub name: String,
    pub kind: EquipmentKind,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewReading {
    pub value: String,
    pub recorded_by: String,
    /// Defaults to the local date and time of recording.
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

// ===== STOCK =====

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Unit,
    Kg,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Unit => f.write_str("unit"),
            Unit::Kg => f.write_str("kg"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StockItem {
    pub id: String,
    pub site: String,
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub location: String,
    pub expiry_date: Option<NaiveDate>,
    pub supplier: String,
    #[serde(default)]
    pub ccp_ids: Vec<String>,
    pub price: Option<f64>,
    pub created_at: DateTime<Utc>,
}

document!(StockItem, Collection::StockItems);

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateStockItem {
    pub site: String,
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub location: String,
    pub expiry_date: Option<NaiveDate>,
    pub supplier: String,
    #[serde(default)]
    pub ccp_ids: Vec<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpdateStockItem {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub location: String,
    pub expiry_date: Option<NaiveDate>,
    pub supplier: String,
    #[serde(default)]
    pub ccp_ids: Vec<String>,
    pub price: Option<f64>,
}

/// A receipt line awaiting the user's confirmation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReceiptCandidate {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub price: Option<f64>,
    pub raw_weight: Option<String>,
    pub location: String,
    pub supplier: String,
}

// ===== CHECKLISTS =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Checklist {
    pub id: String,
    pub site: String,
    pub title: String,
    pub questions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub last_completed_by: Option<String>,
}

document!(Checklist, Collection::Checklists);

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateChecklist {
    pub site: String,
    pub title: String,
    pub questions: Vec<String>,
    pub created_by: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChecklistAnswer {
    pub question: String,
    pub answer: YesNo,
    pub corrective_action: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CompletedChecklist {
    pub id: String,
    pub checklist_id: String,
    pub title: String,
    pub site: String,
    pub answers: Vec<ChecklistAnswer>,
    pub completed_by: String,
    pub completed_at: DateTime<Utc>,
}

document!(CompletedChecklist, Collection::CompletedChecklists);

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompleteChecklist {
    pub checklist_id: String,
    pub answers: Vec<ChecklistAnswer>,
    pub completed_by: String,
}

// ===== CLEANING =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CleaningRecord {
    pub id: String,
    pub site: String,
    pub task: String,
    pub completed_by: String,
    pub completed_at: DateTime<Utc>,
}

document!(CleaningRecord, Collection::CleaningRecords);

// ===== STAFF & ROTA =====

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Manager,
    Staff,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

document!(StaffMember, Collection::Staff);

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateStaff {
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Draft,
    Published,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Shift {
    pub id: String,
    pub staff_id: String,
    pub role: Role,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: ShiftStatus,
    pub notes: Option<String>,
}

document!(Shift, Collection::Shifts);

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateShift {
    pub staff_id: String,
    /// Defaults to the staff member's own role.
    pub role: Option<Role>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpdateShift {
    pub id: String,
    pub staff_id: String,
    pub role: Role,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: ShiftStatus,
    pub notes: Option<String>,
}

// ===== WASTE =====

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WasteReason {
    Expired,
    Spoiled,
    Overproduction,
    Damaged,
    CustomerReturn,
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WasteEntry {
    pub id: String,
    pub site: String,
    pub item: String,
    pub quantity: f64,
    pub unit: Unit,
    pub reason: WasteReason,
    pub notes: Option<String>,
    pub estimated_cost: Option<f64>,
    pub recorded_by: String,
    pub recorded_at: DateTime<Utc>,
}

document!(WasteEntry, Collection::WasteLogs);

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateWasteEntry {
    pub site: String,
    pub item: String,
    pub quantity: f64,
    pub unit: Unit,
    pub reason: WasteReason,
    pub notes: Option<String>,
    pub estimated_cost: Option<f64>,
    pub recorded_by: String,
}

// ===== DISHES =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ingredient {
    pub stock_item_id: String,
    pub name: String,
    pub amount: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Dish {
    pub id: String,
    pub site: String,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

document!(Dish, Collection::Dishes);

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DishInput {
    pub site: String,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}
