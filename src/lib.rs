pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod haccp;
pub mod live;
pub mod logging;
pub mod models;
pub mod receipt;
pub mod router;
pub mod store;

#[cfg(feature = "desktop")]
mod desktop;


pub use db::Database;
pub use error::{Error, Result};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::Mutex;
    use tauri::Manager;

    logging::init(&config::log_filter());
    let config = config::Config::load();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .setup(move |app| {
            let db = Database::for_app(app.handle(), &config)?;
            db.initialize()?;
            tracing::info!(sites = ?config.sites, "Database ready");

            app.manage(db);
            app.manage(config);
            app.manage(Mutex::new(router::Navigator::new()));
            app.manage(desktop::Subscriptions::default());

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Navigation
            desktop::get_screen,
            desktop::login,
            desktop::select_site,
            desktop::open_section,
            desktop::go_back,
            desktop::change_site,
            desktop::logout,
            desktop::get_sites,
            // Live queries
            desktop::subscribe,
            desktop::unsubscribe,
            // Staff & rota
            desktop::get_staff,
            desktop::get_login_names,
            desktop::create_staff,
            desktop::toggle_staff_active,
            desktop::get_rota_staff,
            desktop::create_shift,
            desktop::update_shift,
            desktop::delete_shift,
            desktop::get_week_rota,
            desktop::publish_week,
            // Checklists
            desktop::get_checklists,
            desktop::create_checklist,
            desktop::delete_checklist,
            desktop::complete_checklist,
            desktop::get_completed_checklists,
            desktop::get_checklist_export,
            desktop::save_checklist_export,
            // Temperature & cooking
            desktop::get_equipment,
            desktop::get_equipment_rows,
            desktop::add_equipment,
            desktop::delete_equipment,
            desktop::record_reading,
            desktop::get_cooking_equipment,
            desktop::record_probe,
            // Cleaning
            desktop::get_cleaning_tasks,
            desktop::log_cleaning,
            desktop::get_cleaning_records,
            desktop::get_outstanding_tasks,
            // Stock
            desktop::get_stock,
            desktop::create_stock_item,
            desktop::update_stock_item,
            desktop::delete_stock_item,
            desktop::record_delivery,
            desktop::record_usage,
            desktop::get_expiring_stock,
            desktop::scan_receipt,
            desktop::commit_receipt_items,
            // Waste
            desktop::log_waste,
            desktop::get_waste_log,
            desktop::get_waste_summary,
            // How-to guides
            desktop::get_dishes,
            desktop::create_dish,
            desktop::update_dish,
            desktop::delete_dish,
            // CCPs & dashboard
            desktop::get_ccps,
            desktop::create_ccp,
            desktop::update_ccp,
            desktop::delete_ccp,
            desktop::get_dashboard,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
