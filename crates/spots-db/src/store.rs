use anyhow::{Result, bail};
use rusqlite::OptionalExtension;
use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::Database;

/// A stored document with its store-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    EqIgnoreCase,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Real(f64),
    Integer(i64),
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&FilterValue> for SqlValue {
    fn from(v: &FilterValue) -> Self {
        match v {
            FilterValue::Text(s) => SqlValue::Text(s.clone()),
            FilterValue::Real(f) => SqlValue::Real(*f),
            FilterValue::Integer(i) => SqlValue::Integer(*i),
        }
    }
}

/// Condition on one top-level field of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Op,
    pub value: FilterValue,
}

/// Conjunction of field filters with an optional result cap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<Filter>,
    limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: &str, op: Op, value: impl Into<FilterValue>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(field, Op::Eq, value)
    }

    pub fn eq_ignore_case(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(field, Op::EqIgnoreCase, value)
    }

    /// Inclusive range `min <= field <= max`.
    pub fn between(self, field: &str, min: f64, max: f64) -> Self {
        self.filter(field, Op::Ge, min).filter(field, Op::Le, max)
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn max_results(&self) -> Option<u32> {
        self.limit
    }
}

/// Per-document CRUD plus filtered queries over JSON documents grouped in
/// named collections.
///
/// Every call is a single round trip. Nothing here spans documents
/// atomically: callers that read then write get check-then-act semantics.
pub trait DocumentStore: Send + Sync {
    /// Insert a new document under a freshly assigned id.
    fn create(&self, collection: &str, body: &Value) -> Result<String>;

    /// Insert or replace a document under a caller-chosen id.
    fn put(&self, collection: &str, id: &str, body: &Value) -> Result<()>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Merge `fields` into the top level of the document. Returns false when
    /// the document does not exist.
    fn update(&self, collection: &str, id: &str, fields: &Map<String, Value>) -> Result<bool>;

    /// Returns false when the document did not exist.
    fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Matching documents in insertion order.
    fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>>;
}

impl DocumentStore for Database {
    fn create(&self, collection: &str, body: &Value) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let text = serde_json::to_string(body)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
                (collection, &id, &text),
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    fn put(&self, collection: &str, id: &str, body: &Value) -> Result<()> {
        let text = serde_json::to_string(body)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body",
                (collection, id, &text),
            )?;
            Ok(())
        })
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let text: Option<String> = self.with_conn(|conn| {
            let text = conn
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                    (collection, id),
                    |row| row.get(0),
                )
                .optional()?;
            Ok(text)
        })?;

        match text {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn update(&self, collection: &str, id: &str, fields: &Map<String, Value>) -> Result<bool> {
        let patch = serde_json::to_string(fields)?;
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE documents SET body = json_patch(body, ?3)
                 WHERE collection = ?1 AND id = ?2",
                (collection, id, &patch),
            )?;
            Ok(changed > 0)
        })
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                (collection, id),
            )?;
            Ok(changed > 0)
        })
    }

    fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        let (sql, params) = build_select(collection, query)?;

        let rows: Vec<(String, String)> = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(id, text)| {
                Ok(Document {
                    id,
                    body: serde_json::from_str(&text)?,
                })
            })
            .collect()
    }
}

fn build_select(collection: &str, query: &Query) -> Result<(String, Vec<SqlValue>)> {
    let mut sql = String::from("SELECT id, body FROM documents WHERE collection = ?1");
    let mut params = vec![SqlValue::Text(collection.to_string())];

    for filter in query.filters() {
        check_field_name(&filter.field)?;
        params.push(SqlValue::from(&filter.value));
        let idx = params.len();
        let column = format!("json_extract(body, '$.{}')", filter.field);

        let clause = match filter.op {
            Op::Eq => format!(" AND {column} = ?{idx}"),
            Op::EqIgnoreCase => format!(" AND fold_case({column}) = fold_case(?{idx})"),
            Op::Lt => format!(" AND {column} < ?{idx}"),
            Op::Le => format!(" AND {column} <= ?{idx}"),
            Op::Gt => format!(" AND {column} > ?{idx}"),
            Op::Ge => format!(" AND {column} >= ?{idx}"),
        };
        sql.push_str(&clause);
    }

    sql.push_str(" ORDER BY rowid");
    if let Some(limit) = query.max_results() {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    Ok((sql, params))
}

/// Field names are spliced into the JSON path, so only identifiers pass.
fn check_field_name(field: &str) -> Result<()> {
    let mut chars = field.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("invalid filter field name: {:?}", field);
    }
    Ok(())
}
