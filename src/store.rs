//! Schemaless document collections on top of SQLite.
//!
//! Each document is stored as JSON in the shared `documents` table and
//! filtered with `json_extract`. Cross-collection relationships are resolved
//! by the callers through id lookups; there are no joins here.

use rusqlite::types::Value as SqlValue;
use rusqlite::OptionalExtension;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::Database;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    StockItems,
    Equipment,
    Checklists,
    CompletedChecklists,
    CleaningRecords,
    Ccps,
    Staff,
    Shifts,
    WasteLogs,
    Dishes,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::StockItems => "stock_items",
            Collection::Equipment => "equipment",
            Collection::Checklists => "checklists",
            Collection::CompletedChecklists => "completed_checklists",
            Collection::CleaningRecords => "cleaning_records",
            Collection::Ccps => "ccps",
            Collection::Staff => "staff",
            Collection::Shifts => "shifts",
            Collection::WasteLogs => "waste_logs",
            Collection::Dishes => "dishes",
        }
    }
}

/// A value that lives in one collection under its own id.
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn query() -> Query {
        Query::new(Self::COLLECTION)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Op {
    fn sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: Op,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub collection: Collection,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order_by: Option<OrderBy>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl Query {
    pub fn new(collection: Collection) -> Self {
        Query {
            collection,
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, field: &str, op: Op, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, Op::Eq, value)
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        let mut sql = String::from("SELECT body FROM documents WHERE collection = ?1");
        let mut params = vec![SqlValue::Text(self.collection.as_str().to_string())];

        for filter in &self.filters {
            params.push(SqlValue::Text(json_path(&filter.field)?));
            let path_index = params.len();

            if filter.value.is_null() {
                match filter.op {
                    Op::Eq => sql.push_str(&format!(" AND json_extract(body, ?{path_index}) IS NULL")),
                    _ => return Err(Error::validation(format!("Cannot range-compare {} with null", filter.field))),
                }
                continue;
            }

            params.push(to_sql_value(&filter.value));
            sql.push_str(&format!(
                " AND json_extract(body, ?{path_index}) {} ?{}",
                filter.op.sql(),
                params.len()
            ));
        }

        match &self.order_by {
            Some(order) => {
                params.push(SqlValue::Text(json_path(&order.field)?));
                let direction = match order.direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                sql.push_str(&format!(" ORDER BY json_extract(body, ?{}) {direction}, rowid ASC", params.len()));
            }
            None => sql.push_str(" ORDER BY rowid ASC"),
        }

        if let Some(limit) = self.limit {
            params.push(SqlValue::Integer(i64::from(limit)));
            sql.push_str(&format!(" LIMIT ?{}", params.len()));
        }

        Ok((sql, params))
    }
}

/// Only top-level document fields can be filtered or ordered on.
fn json_path(field: &str) -> Result<String> {
    let valid = !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(Error::validation(format!("Invalid field name: {field:?}")));
    }
    Ok(format!("$.{field}"))
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        // json_extract reports booleans as 0/1
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

impl Database {
    /// Adds a new document. Fails if the id is already taken.
    pub fn insert<D: Document>(&self, doc: &D) -> Result<()> {
        let body = serde_json::to_string(doc)?;
        {
            let conn = self.lock()?;
            conn.execute(
                "INSERT INTO documents (collection, id, body, updated_at) VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)",
                rusqlite::params![D::COLLECTION.as_str(), doc.id(), body],
            )?;
        }
        tracing::debug!(collection = D::COLLECTION.as_str(), id = doc.id(), "Inserted document");

        self.notify(D::COLLECTION);
        Ok(())
    }

    /// Writes the whole document, replacing any previous version.
    pub fn set<D: Document>(&self, doc: &D) -> Result<()> {
        let body = serde_json::to_string(doc)?;
        {
            let conn = self.lock()?;
            conn.execute(
                "INSERT INTO documents (collection, id, body, updated_at) VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
                 ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body, updated_at = CURRENT_TIMESTAMP",
                rusqlite::params![D::COLLECTION.as_str(), doc.id(), body],
            )?;
        }
        tracing::debug!(collection = D::COLLECTION.as_str(), id = doc.id(), "Stored document");

        self.notify(D::COLLECTION);
        Ok(())
    }

    pub fn find<D: Document>(&self, id: &str) -> Result<Option<D>> {
        let body: Option<String> = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                rusqlite::params![D::COLLECTION.as_str(), id],
                |row| row.get(0),
            )
            .optional()?
        };

        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    pub fn get<D: Document>(&self, id: &str) -> Result<D> {
        self.find(id)?.ok_or_else(|| Error::NotFound {
            collection: D::COLLECTION.as_str(),
            id: id.to_string(),
        })
    }

    pub fn delete<D: Document>(&self, id: &str) -> Result<()> {
        let changed = {
            let conn = self.lock()?;
            conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                rusqlite::params![D::COLLECTION.as_str(), id],
            )?
        };

        if changed == 0 {
            return Err(Error::NotFound {
                collection: D::COLLECTION.as_str(),
                id: id.to_string(),
            });
        }
        tracing::debug!(collection = D::COLLECTION.as_str(), id, "Deleted document");

        self.notify(D::COLLECTION);
        Ok(())
    }

    pub fn query<D: Document>(&self, query: &Query) -> Result<Vec<D>> {
        if query.collection != D::COLLECTION {
            return Err(Error::validation(format!(
                "Query on {} cannot produce {} documents",
                query.collection.as_str(),
                D::COLLECTION.as_str()
            )));
        }

        self.query_bodies(query)?
            .iter()
            .map(|body| serde_json::from_str(body).map_err(Error::from))
            .collect()
    }

    /// Untyped results, for callers that only relay documents.
    pub fn query_raw(&self, query: &Query) -> Result<Vec<Value>> {
        self.query_bodies(query)?
            .iter()
            .map(|body| serde_json::from_str(body).map_err(Error::from))
            .collect()
    }

    fn query_bodies(&self, query: &Query) -> Result<Vec<String>> {
        let (sql, params) = query.to_sql()?;
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&sql)?;
        let bodies = stmt
            .query_map(rusqlite::params_from_iter(params), |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(bodies)
    }
}
