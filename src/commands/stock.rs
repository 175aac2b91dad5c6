use chrono::{Duration, NaiveDate};

use super::required;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{new_id, timestamp, Ccp, CreateStockItem, Dish, ReceiptCandidate, StockItem, UpdateStockItem};
use crate::receipt;
use crate::store::{Direction, Document, Op};

/// Three decimals is gram precision for kilogram stock.
fn round_quantity(quantity: f64) -> f64 {
    (quantity * 1000.0).round() / 1000.0
}

fn check_quantity(quantity: f64) -> Result<()> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(Error::validation("Quantity cannot be negative"));
    }
    Ok(())
}

fn check_price(price: Option<f64>) -> Result<()> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => Err(Error::validation("Price cannot be negative")),
        _ => Ok(()),
    }
}

pub fn get_stock(db: &Database, site: &str) -> Result<Vec<StockItem>> {
    db.query(&StockItem::query().eq("site", site).order_by("name", Direction::Asc))
}

pub fn create_stock_item(db: &Database, item: CreateStockItem) -> Result<StockItem> {
    check_quantity(item.quantity)?;
    check_price(item.price)?;

    let item = StockItem {
        id: new_id(),
        site: required(&item.site, "Site")?,
        name: required(&item.name, "Name")?,
        quantity: round_quantity(item.quantity),
        unit: item.unit,
        location: required(&item.location, "Location")?,
        expiry_date: item.expiry_date,
        supplier: item.supplier.trim().to_string(),
        ccp_ids: item.ccp_ids,
        price: item.price,
        created_at: timestamp(),
    };
    db.insert(&item)?;
    tracing::info!(item_id = %item.id, "Added stock item {}", item.name);

    Ok(item)
}

pub fn update_stock_item(db: &Database, item: UpdateStockItem) -> Result<StockItem> {
    let existing: StockItem = db.get(&item.id)?;
    check_quantity(item.quantity)?;
    check_price(item.price)?;

    let item = StockItem {
        id: existing.id,
        site: existing.site,
        name: required(&item.name, "Name")?,
        quantity: round_quantity(item.quantity),
        unit: item.unit,
        location: required(&item.location, "Location")?,
        expiry_date: item.expiry_date,
        supplier: item.supplier.trim().to_string(),
        ccp_ids: item.ccp_ids,
        price: item.price,
        created_at: existing.created_at,
    };
    db.set(&item)?;
    tracing::info!(item_id = %item.id, "Updated stock item {}", item.name);

    Ok(item)
}

/// Deletes the item, then drops it from CCPs and dish ingredient lists.
pub fn delete_stock_item(db: &Database, id: &str) -> Result<()> {
    let item: StockItem = db.get(id)?;
    db.delete::<StockItem>(id)?;

    let ccps: Vec<Ccp> = db.query(&Ccp::query().eq("site", item.site.as_str()))?;
    for mut ccp in ccps.into_iter().filter(|c| c.stock_item_ids.iter().any(|s| s == id)) {
        ccp.stock_item_ids.retain(|s| s != id);
        db.set(&ccp)?;
    }

    let dishes: Vec<Dish> = db.query(&Dish::query().eq("site", item.site.as_str()))?;
    for mut dish in dishes.into_iter().filter(|d| d.ingredients.iter().any(|i| i.stock_item_id == id)) {
        dish.ingredients.retain(|i| i.stock_item_id != id);
        db.set(&dish)?;
    }
    tracing::info!(item_id = id, "Deleted stock item {}", item.name);

    Ok(())
}

fn adjust(db: &Database, id: &str, delta: f64) -> Result<StockItem> {
    let mut item: StockItem = db.get(id)?;
    item.quantity = round_quantity(item.quantity + delta);
    db.set(&item)?;
    tracing::info!(item_id = id, delta, quantity = item.quantity, "Adjusted stock for {}", item.name);

    Ok(item)
}

pub fn record_delivery(db: &Database, id: &str, quantity: f64) -> Result<StockItem> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(Error::validation("Delivery quantity must be positive"));
    }
    adjust(db, id, quantity)
}

pub fn record_usage(db: &Database, id: &str, quantity: f64) -> Result<StockItem> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(Error::validation("Usage quantity must be positive"));
    }

    let item: StockItem = db.get(id)?;
    if quantity > item.quantity {
        return Err(Error::validation(format!(
            "Insufficient stock for {}: requested {}, available {}",
            item.name, quantity, item.quantity
        )));
    }
    adjust(db, id, -quantity)
}

/// Items whose expiry date falls on or before `today + days`, soonest first.
/// Already-expired items are included.
pub fn get_expiring_stock(db: &Database, site: &str, today: NaiveDate, days: i64) -> Result<Vec<StockItem>> {
    let cutoff = today + Duration::days(days);

    db.query(
        &StockItem::query()
            .eq("site", site)
            .filter("expiry_date", Op::Lte, serde_json::to_value(cutoff)?)
            .order_by("expiry_date", Direction::Asc),
    )
}

/// Candidates for the user to review. Nothing is written.
pub fn scan_receipt(text: &str) -> Result<Vec<ReceiptCandidate>> {
    receipt::parse_receipt(text)
}

/// Stores the candidates the user kept, in order.
pub fn commit_receipt_items(db: &Database, site: &str, candidates: Vec<ReceiptCandidate>) -> Result<Vec<StockItem>> {
    if candidates.is_empty() {
        return Err(Error::validation("No receipt items selected"));
    }

    let site = required(site, "Site")?;
    for candidate in &candidates {
        required(&candidate.name, "Item name")?;
        required(&candidate.location, "Location")?;
        if !candidate.quantity.is_finite() || candidate.quantity <= 0.0 {
            return Err(Error::validation(format!("Quantity for {} must be positive", candidate.name)));
        }
        check_price(candidate.price)?;
    }

    let mut created = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        created.push(create_stock_item(
            db,
            CreateStockItem {
                site: site.clone(),
                name: candidate.name,
                quantity: candidate.quantity,
                unit: candidate.unit,
                location: candidate.location,
                expiry_date: None,
                supplier: candidate.supplier,
                ccp_ids: Vec::new(),
                price: candidate.price,
            },
        )?);
    }
    tracing::info!(site = %site, count = created.len(), "Committed receipt items");

    Ok(created)
}
