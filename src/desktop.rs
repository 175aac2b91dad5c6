//! Tauri command surface for the webview.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tauri::{AppHandle, Emitter, Manager};

use crate::commands::{
    ccps, checklists, cleaning, cooking, dishes, rota, sites, staff, staff::StaffFilter, stock, temperature, waste,
};
use crate::config::Config;
use crate::db::DatabaseExt;
use crate::error::{Error, Result};
use crate::export::{self, ExportPage};
use crate::haccp::{self, Dashboard};
use crate::live::Subscription;
use crate::models::*;
use crate::router::{Navigator, Screen, Section};
use crate::store::Query;

/// Every failure reaches the webview as a message; none of them is fatal.
fn report<T>(result: Result<T>) -> std::result::Result<T, String> {
    result.map_err(|e| {
        match &e {
            Error::Validation(_) | Error::NoItemsParsed => tracing::warn!("{e}"),
            _ => tracing::error!("{e}"),
        }
        e.to_string()
    })
}

fn navigator(app: &AppHandle) -> std::result::Result<std::sync::MutexGuard<'_, Navigator>, String> {
    app.state::<Mutex<Navigator>>()
        .inner()
        .lock()
        .map_err(|_| Error::LockPoisoned.to_string())
}

// Navigation

#[tauri::command]
pub fn get_screen(app: AppHandle) -> std::result::Result<Screen, String> {
    Ok(navigator(&app)?.screen())
}

#[tauri::command]
pub fn login(app: AppHandle, name: String) -> std::result::Result<Screen, String> {
    report(navigator(&app)?.login(&name))
}

#[tauri::command]
pub fn select_site(app: AppHandle, site: String) -> std::result::Result<Screen, String> {
    let config = app.state::<Config>();
    report(navigator(&app)?.select_site(&site, &config.sites))
}

#[tauri::command]
pub fn open_section(app: AppHandle, section: Section) -> std::result::Result<Screen, String> {
    report(navigator(&app)?.open(section))
}

#[tauri::command]
pub fn go_back(app: AppHandle) -> std::result::Result<Screen, String> {
    Ok(navigator(&app)?.back())
}

#[tauri::command]
pub fn change_site(app: AppHandle) -> std::result::Result<Screen, String> {
    Ok(navigator(&app)?.change_site())
}

#[tauri::command]
pub fn logout(app: AppHandle) -> std::result::Result<Screen, String> {
    Ok(navigator(&app)?.logout())
}

#[tauri::command]
pub fn get_sites(app: AppHandle) -> Vec<String> {
    sites::get_sites(&app.state::<Config>())
}

// Live queries

#[derive(Default)]
pub struct Subscriptions(Mutex<HashMap<String, Subscription>>);

#[derive(Clone, Serialize)]
struct Snapshot {
    token: String,
    documents: Vec<Value>,
}

/// Streams `snapshot` events tagged with the caller's `token` until
/// `unsubscribe` is called with the same token.
#[tauri::command]
pub fn subscribe(app: AppHandle, token: String, query: Query) -> std::result::Result<(), String> {
    let emitter = app.clone();
    let tag = token.clone();
    let subscription = report(app.db().watch_raw(query, move |documents| {
        let event = Snapshot {
            token: tag.clone(),
            documents,
        };
        if let Err(e) = emitter.emit("snapshot", event) {
            tracing::warn!("Failed to deliver snapshot: {e}");
        }
    }))?;

    let subscriptions = app.state::<Subscriptions>();
    let mut subscriptions = subscriptions.0.lock().map_err(|_| Error::LockPoisoned.to_string())?;
    subscriptions.insert(token, subscription);

    Ok(())
}

#[tauri::command]
pub fn unsubscribe(app: AppHandle, token: String) -> std::result::Result<(), String> {
    let subscriptions = app.state::<Subscriptions>();
    let removed = subscriptions
        .0
        .lock()
        .map_err(|_| Error::LockPoisoned.to_string())?
        .remove(&token);
    drop(removed);

    Ok(())
}

// Staff & rota

#[tauri::command]
pub fn get_staff(app: AppHandle, filter: Option<StaffFilter>) -> std::result::Result<Vec<StaffMember>, String> {
    report(staff::get_staff(app.db(), filter.unwrap_or_default()))
}

#[tauri::command]
pub fn get_login_names(app: AppHandle) -> std::result::Result<Vec<String>, String> {
    report(staff::get_login_names(app.db()))
}

#[tauri::command]
pub fn create_staff(app: AppHandle, staff: CreateStaff) -> std::result::Result<StaffMember, String> {
    report(staff::create_staff(app.db(), staff))
}

#[tauri::command]
pub fn toggle_staff_active(app: AppHandle, id: String) -> std::result::Result<StaffMember, String> {
    report(staff::toggle_staff_active(app.db(), &id))
}

#[tauri::command]
pub fn get_rota_staff(app: AppHandle) -> std::result::Result<Vec<StaffMember>, String> {
    report(rota::get_rota_staff(app.db()))
}

#[tauri::command]
pub fn create_shift(app: AppHandle, shift: CreateShift) -> std::result::Result<Shift, String> {
    report(rota::create_shift(app.db(), shift))
}

#[tauri::command]
pub fn update_shift(app: AppHandle, shift: UpdateShift) -> std::result::Result<Shift, String> {
    report(rota::update_shift(app.db(), shift))
}

#[tauri::command]
pub fn delete_shift(app: AppHandle, id: String) -> std::result::Result<(), String> {
    report(rota::delete_shift(app.db(), &id))
}

#[tauri::command]
pub fn get_week_rota(app: AppHandle, week_start: NaiveDate) -> std::result::Result<Vec<rota::RotaRow>, String> {
    let db = app.db();
    let staff = report(staff::get_staff(db, StaffFilter::All))?;
    let shifts = report(rota::get_week_shifts(db, week_start))?;

    Ok(rota::week_view(week_start, &staff, &shifts))
}

#[tauri::command]
pub fn publish_week(app: AppHandle, week_start: NaiveDate) -> std::result::Result<usize, String> {
    report(rota::publish_week(app.db(), week_start))
}

// Checklists

#[tauri::command]
pub fn get_checklists(app: AppHandle, site: String) -> std::result::Result<Vec<Checklist>, String> {
    report(checklists::get_checklists(app.db(), &site))
}

#[tauri::command]
pub fn create_checklist(app: AppHandle, checklist: CreateChecklist) -> std::result::Result<Checklist, String> {
    report(checklists::create_checklist(app.db(), checklist))
}

#[tauri::command]
pub fn delete_checklist(app: AppHandle, id: String) -> std::result::Result<(), String> {
    report(checklists::delete_checklist(app.db(), &id))
}

#[tauri::command]
pub fn complete_checklist(
    app: AppHandle,
    completion: CompleteChecklist,
) -> std::result::Result<CompletedChecklist, String> {
    report(checklists::complete_checklist(app.db(), completion))
}

#[tauri::command]
pub fn get_completed_checklists(app: AppHandle, site: String) -> std::result::Result<Vec<CompletedChecklist>, String> {
    report(checklists::get_completed_checklists(app.db(), &site))
}

#[tauri::command]
pub fn get_checklist_export(app: AppHandle, id: String) -> std::result::Result<Vec<ExportPage>, String> {
    let record: CompletedChecklist = report(app.db().get(&id))?;
    let lines = app.state::<Config>().export_lines_per_page;

    Ok(export::paginate_completed_checklist(&record, lines))
}

/// Writes the text export to `path` (chosen through the dialog plugin).
#[tauri::command]
pub fn save_checklist_export(app: AppHandle, id: String, path: PathBuf) -> std::result::Result<usize, String> {
    let pages = get_checklist_export(app, id)?;
    report(std::fs::write(&path, export::render_text(&pages)).map_err(Error::from))?;
    tracing::info!("Exported checklist to {}", path.display());

    Ok(pages.len())
}

// Temperature & cooking

#[tauri::command]
pub fn get_equipment(
    app: AppHandle,
    site: String,
    kind: Option<EquipmentKind>,
) -> std::result::Result<Vec<Equipment>, String> {
    report(temperature::get_equipment(app.db(), &site, kind))
}

#[tauri::command]
pub fn get_equipment_rows(app: AppHandle, site: String) -> std::result::Result<Vec<temperature::EquipmentRow>, String> {
    let db = app.db();
    let equipment = report(temperature::get_equipment(db, &site, None))?;
    let ccps = report(ccps::get_ccps(db, &site))?;

    Ok(temperature::equipment_rows(&equipment, &ccps))
}

#[tauri::command]
pub fn add_equipment(app: AppHandle, equipment: NewEquipment) -> std::result::Result<Equipment, String> {
    report(temperature::add_equipment(app.db(), equipment))
}

#[tauri::command]
pub fn delete_equipment(app: AppHandle, id: String) -> std::result::Result<(), String> {
    report(temperature::delete_equipment(app.db(), &id))
}

#[tauri::command]
pub fn record_reading(app: AppHandle, equipment_id: String, reading: NewReading) -> std::result::Result<Equipment, String> {
    report(temperature::record_reading(app.db(), &equipment_id, reading))
}

#[tauri::command]
pub fn get_cooking_equipment(app: AppHandle, site: String) -> std::result::Result<Vec<Equipment>, String> {
    report(cooking::get_cooking_equipment(app.db(), &site))
}

#[tauri::command]
pub fn record_probe(app: AppHandle, equipment_id: String, reading: NewReading) -> std::result::Result<Equipment, String> {
    report(cooking::record_probe(app.db(), &equipment_id, reading))
}

// Cleaning

#[tauri::command]
pub fn get_cleaning_tasks() -> Vec<&'static str> {
    cleaning::get_cleaning_tasks()
}

#[tauri::command]
pub fn log_cleaning(
    app: AppHandle,
    site: String,
    task: String,
    completed_by: String,
) -> std::result::Result<CleaningRecord, String> {
    report(cleaning::log_cleaning(app.db(), &site, &task, &completed_by))
}

#[tauri::command]
pub fn get_cleaning_records(
    app: AppHandle,
    site: String,
    day: Option<NaiveDate>,
) -> std::result::Result<Vec<CleaningRecord>, String> {
    report(cleaning::get_cleaning_records(app.db(), &site, day))
}

#[tauri::command]
pub fn get_outstanding_tasks(app: AppHandle, site: String, day: NaiveDate) -> std::result::Result<Vec<&'static str>, String> {
    let records = report(cleaning::get_cleaning_records(app.db(), &site, Some(day)))?;
    Ok(cleaning::outstanding_tasks(&records, day))
}

// Stock

#[tauri::command]
pub fn get_stock(app: AppHandle, site: String) -> std::result::Result<Vec<StockItem>, String> {
    report(stock::get_stock(app.db(), &site))
}

#[tauri::command]
pub fn create_stock_item(app: AppHandle, item: CreateStockItem) -> std::result::Result<StockItem, String> {
    report(stock::create_stock_item(app.db(), item))
}

#[tauri::command]
pub fn update_stock_item(app: AppHandle, item: UpdateStockItem) -> std::result::Result<StockItem, String> {
    report(stock::update_stock_item(app.db(), item))
}

#[tauri::command]
pub fn delete_stock_item(app: AppHandle, id: String) -> std::result::Result<(), String> {
    report(stock::delete_stock_item(app.db(), &id))
}

#[tauri::command]
pub fn record_delivery(app: AppHandle, id: String, quantity: f64) -> std::result::Result<StockItem, String> {
    report(stock::record_delivery(app.db(), &id, quantity))
}

#[tauri::command]
pub fn record_usage(app: AppHandle, id: String, quantity: f64) -> std::result::Result<StockItem, String> {
    report(stock::record_usage(app.db(), &id, quantity))
}

#[tauri::command]
pub fn get_expiring_stock(
    app: AppHandle,
    site: String,
    today: NaiveDate,
    days: i64,
) -> std::result::Result<Vec<StockItem>, String> {
    report(stock::get_expiring_stock(app.db(), &site, today, days))
}

#[tauri::command]
pub fn scan_receipt(text: String) -> std::result::Result<Vec<ReceiptCandidate>, String> {
    report(stock::scan_receipt(&text))
}

#[tauri::command]
pub fn commit_receipt_items(
    app: AppHandle,
    site: String,
    candidates: Vec<ReceiptCandidate>,
) -> std::result::Result<Vec<StockItem>, String> {
    report(stock::commit_receipt_items(app.db(), &site, candidates))
}

// Waste

#[tauri::command]
pub fn log_waste(app: AppHandle, entry: CreateWasteEntry) -> std::result::Result<WasteEntry, String> {
    report(waste::log_waste(app.db(), entry))
}

#[tauri::command]
pub fn get_waste_log(app: AppHandle, site: String) -> std::result::Result<Vec<WasteEntry>, String> {
    report(waste::get_waste_log(app.db(), &site))
}

#[tauri::command]
pub fn get_waste_summary(app: AppHandle, site: String) -> std::result::Result<waste::WasteSummary, String> {
    let entries = report(waste::get_waste_log(app.db(), &site))?;
    Ok(waste::waste_summary(&entries))
}

// How-to guides

#[tauri::command]
pub fn get_dishes(app: AppHandle, site: String) -> std::result::Result<Vec<Dish>, String> {
    report(dishes::get_dishes(app.db(), &site))
}

#[tauri::command]
pub fn create_dish(app: AppHandle, dish: DishInput) -> std::result::Result<Dish, String> {
    report(dishes::create_dish(app.db(), dish))
}

#[tauri::command]
pub fn update_dish(app: AppHandle, id: String, dish: DishInput) -> std::result::Result<Dish, String> {
    report(dishes::update_dish(app.db(), &id, dish))
}

#[tauri::command]
pub fn delete_dish(app: AppHandle, id: String) -> std::result::Result<(), String> {
    report(dishes::delete_dish(app.db(), &id))
}

// CCP management & dashboard

#[tauri::command]
pub fn get_ccps(app: AppHandle, site: String) -> std::result::Result<Vec<Ccp>, String> {
    report(ccps::get_ccps(app.db(), &site))
}

#[tauri::command]
pub fn create_ccp(app: AppHandle, ccp: CcpInput) -> std::result::Result<Ccp, String> {
    report(ccps::create_ccp(app.db(), ccp))
}

#[tauri::command]
pub fn update_ccp(app: AppHandle, id: String, ccp: CcpInput) -> std::result::Result<Ccp, String> {
    report(ccps::update_ccp(app.db(), &id, ccp))
}

#[tauri::command]
pub fn delete_ccp(app: AppHandle, id: String) -> std::result::Result<(), String> {
    report(ccps::delete_ccp(app.db(), &id))
}

#[tauri::command]
pub fn get_dashboard(app: AppHandle, site: String) -> std::result::Result<Dashboard, String> {
    report(haccp::dashboard(app.db(), &site))
}
