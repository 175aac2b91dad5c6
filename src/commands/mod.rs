pub mod ccps;
pub mod checklists;
pub mod cleaning;
pub mod cooking;
pub mod dishes;
pub mod rota;
pub mod sites;
pub mod staff;
pub mod stock;
pub mod temperature;
pub mod waste;

use crate::error::{Error, Result};

/// Trimmed text, or a validation error naming the missing field.
fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
