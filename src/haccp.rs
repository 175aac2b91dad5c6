//! Compliance status for the HACCP dashboard.
//!
//! A CCP limit is either a numeric range (`critical_min` / `critical_max`)
//! or, when neither bound is set, a text rule like `<=5`. Only the latest
//! reading of each linked piece of equipment is judged.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::models::{Ccp, Dish, Equipment, Reading, StockItem};
use crate::store::Document;

static RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(<=|>=|==|≤|⩽|≥|⩾|<|>|=)\s*([+-]?(?:\d+(?:\.\d+)?|\.\d+))").unwrap());

/// Optional sign, then `5`, `5.0`, `5.` or `.5`.
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))").unwrap());

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Alert,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Verdict {
    pub status: Status,
    pub reason: String,
}

impl Verdict {
    fn pass(reason: impl Into<String>) -> Self {
        Verdict {
            status: Status::Ok,
            reason: reason.into(),
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Verdict {
            status: Status::Alert,
            reason: reason.into(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == Status::Ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
}

impl Comparison {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Comparison::Lt),
            "<=" | "≤" | "⩽" => Some(Comparison::Lte),
            ">" => Some(Comparison::Gt),
            ">=" | "≥" | "⩾" => Some(Comparison::Gte),
            "==" | "=" => Some(Comparison::Eq),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Eq => "==",
        }
    }

    pub fn holds(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Lt => lhs < rhs,
            Comparison::Lte => lhs <= rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Gte => lhs >= rhs,
            Comparison::Eq => lhs == rhs,
        }
    }
}

/// `<operator><number>`, anything after the number (a unit, say) is ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRule {
    pub comparison: Comparison,
    pub threshold: f64,
}

impl TextRule {
    pub fn parse(text: &str) -> Option<Self> {
        let caps = RULE.captures(text)?;
        let comparison = Comparison::from_symbol(caps.get(1)?.as_str())?;
        let threshold = caps.get(2)?.as_str().parse().ok()?;

        Some(TextRule { comparison, threshold })
    }

    pub fn accepts(&self, reading: f64) -> bool {
        self.comparison.holds(reading, self.threshold)
    }
}

impl fmt::Display for TextRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.comparison.symbol(), self.threshold)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Limits<'a> {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub rule: Option<&'a str>,
}

impl<'a> Limits<'a> {
    pub fn of(ccp: &'a Ccp) -> Self {
        Limits {
            min: ccp.critical_min,
            max: ccp.critical_max,
            rule: ccp.critical_limit.as_deref(),
        }
    }
}

/// Leading numeric part of a reading, so `"4.5°C"` reads as 4.5.
pub fn parse_reading(value: &str) -> Option<f64> {
    LEADING_NUMBER.captures(value)?.get(1)?.as_str().parse().ok()
}

pub fn evaluate(limits: &Limits<'_>, reading: Option<&str>) -> Verdict {
    let Some(value) = reading.and_then(parse_reading) else {
        return Verdict::pass("No reading");
    };

    if let Some(min) = limits.min {
        if value < min {
            return Verdict::fail(format!("Below minimum {min}"));
        }
    }
    if let Some(max) = limits.max {
        if value > max {
            return Verdict::fail(format!("Above maximum {max}"));
        }
    }
    if limits.min.is_some() || limits.max.is_some() {
        return Verdict::pass("Within limits");
    }

    match limits.rule.and_then(TextRule::parse) {
        Some(rule) if rule.accepts(value) => Verdict::pass(format!("Meets {rule}")),
        Some(rule) => Verdict::fail(format!("Fails {rule}")),
        None => Verdict::pass("No limits set"),
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct EquipmentCheck {
    pub equipment_id: String,
    pub equipment_name: String,
    pub reading: Option<Reading>,
    /// `None` when the equipment has no readings yet.
    pub verdict: Option<Verdict>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CcpRow {
    pub ccp_id: String,
    pub name: String,
    pub process_step: String,
    pub status: Status,
    pub checks: Vec<EquipmentCheck>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DishRow {
    pub dish_id: String,
    pub name: String,
    pub ccp_ids: Vec<String>,
    pub status: Status,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Dashboard {
    pub status: Status,
    pub ccps: Vec<CcpRow>,
    pub dishes: Vec<DishRow>,
}

fn aggregate<I: IntoIterator<Item = Status>>(statuses: I) -> Status {
    if statuses.into_iter().any(|s| s == Status::Alert) {
        Status::Alert
    } else {
        Status::Ok
    }
}

pub fn ccp_status(ccp: &Ccp, equipment: &HashMap<&str, &Equipment>) -> CcpRow {
    let limits = Limits::of(ccp);

    let checks: Vec<EquipmentCheck> = ccp
        .equipment_ids
        .iter()
        .filter_map(|id| equipment.get(id.as_str()))
        .map(|eq| {
            let reading = eq.latest_reading().cloned();
            let verdict = reading.as_ref().map(|r| evaluate(&limits, Some(&r.value)));
            EquipmentCheck {
                equipment_id: eq.id.clone(),
                equipment_name: eq.name.clone(),
                reading,
                verdict,
            }
        })
        .collect();

    CcpRow {
        ccp_id: ccp.id.clone(),
        name: ccp.name.clone(),
        process_step: ccp.process_step.clone(),
        status: aggregate(checks.iter().filter_map(|c| c.verdict.as_ref().map(|v| v.status))),
        checks,
    }
}

/// CCPs that apply to a dish through the stock items it uses, whichever side
/// holds the link.
pub fn dish_ccps<'a>(dish: &Dish, ccps: &'a [Ccp], stock: &[StockItem]) -> Vec<&'a Ccp> {
    let used: HashSet<&str> = dish.ingredients.iter().map(|i| i.stock_item_id.as_str()).collect();

    let linked_from_stock: HashSet<&str> = stock
        .iter()
        .filter(|item| used.contains(item.id.as_str()))
        .flat_map(|item| item.ccp_ids.iter().map(String::as_str))
        .collect();

    ccps.iter()
        .filter(|ccp| {
            linked_from_stock.contains(ccp.id.as_str())
                || ccp.stock_item_ids.iter().any(|id| used.contains(id.as_str()))
        })
        .collect()
}

pub fn build_dashboard(ccps: &[Ccp], equipment: &[Equipment], stock: &[StockItem], dishes: &[Dish]) -> Dashboard {
    let by_id: HashMap<&str, &Equipment> = equipment.iter().map(|e| (e.id.as_str(), e)).collect();

    let ccp_rows: Vec<CcpRow> = ccps.iter().map(|ccp| ccp_status(ccp, &by_id)).collect();
    let status_of: HashMap<&str, Status> = ccp_rows.iter().map(|row| (row.ccp_id.as_str(), row.status)).collect();

    let dish_rows = dishes
        .iter()
        .map(|dish| {
            let applicable = dish_ccps(dish, ccps, stock);
            DishRow {
                dish_id: dish.id.clone(),
                name: dish.name.clone(),
                status: aggregate(applicable.iter().filter_map(|ccp| status_of.get(ccp.id.as_str()).copied())),
                ccp_ids: applicable.iter().map(|ccp| ccp.id.clone()).collect(),
            }
        })
        .collect();

    Dashboard {
        status: aggregate(ccp_rows.iter().map(|row| row.status)),
        ccps: ccp_rows,
        dishes: dish_rows,
    }
}

pub fn dashboard(db: &Database, site: &str) -> Result<Dashboard> {
    let ccps: Vec<Ccp> = db.query(&Ccp::query().eq("site", site))?;
    let equipment: Vec<Equipment> = db.query(&Equipment::query().eq("site", site))?;
    let stock: Vec<StockItem> = db.query(&StockItem::query().eq("site", site))?;
    let dishes: Vec<Dish> = db.query(&Dish::query().eq("site", site))?;

    let dashboard = build_dashboard(&ccps, &equipment, &stock, &dishes);
    tracing::debug!(site, status = ?dashboard.status, ccps = dashboard.ccps.len(), "Built HACCP dashboard");

    Ok(dashboard)
}
