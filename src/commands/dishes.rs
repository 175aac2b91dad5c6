use super::required;
use crate::db::Database;
use crate::error::Result;
use crate::models::{new_id, Dish, DishInput, StockItem};
use crate::store::{Direction, Document};

pub fn get_dishes(db: &Database, site: &str) -> Result<Vec<Dish>> {
    db.query(&Dish::query().eq("site", site).order_by("name", Direction::Asc))
}

/// Blank steps are dropped; every ingredient must name an existing stock item.
fn build(db: &Database, id: String, dish: DishInput) -> Result<Dish> {
    for ingredient in &dish.ingredients {
        db.get::<StockItem>(&ingredient.stock_item_id)?;
    }

    Ok(Dish {
        id,
        site: required(&dish.site, "Site")?,
        name: required(&dish.name, "Name")?,
        steps: dish
            .steps
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        ingredients: dish.ingredients,
    })
}

pub fn create_dish(db: &Database, dish: DishInput) -> Result<Dish> {
    let dish = build(db, new_id(), dish)?;
    db.insert(&dish)?;
    tracing::info!(dish_id = %dish.id, "Created dish {}", dish.name);

    Ok(dish)
}

pub fn update_dish(db: &Database, id: &str, dish: DishInput) -> Result<Dish> {
    db.get::<Dish>(id)?;
    let dish = build(db, id.to_string(), dish)?;
    db.set(&dish)?;
    tracing::info!(dish_id = id, "Updated dish {}", dish.name);

    Ok(dish)
}

pub fn delete_dish(db: &Database, id: &str) -> Result<()> {
    db.delete::<Dish>(id)?;
    tracing::info!(dish_id = id, "Deleted dish");
    Ok(())
}
