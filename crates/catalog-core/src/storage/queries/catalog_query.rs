use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::sync::MutexGuard;

use crate::error::Result;
use crate::models::CanonicalProduct;
use crate::storage::repositories::{row_to_product, PRODUCT_COLUMNS};

/// A boolean SQL fragment over `products AS p` with positional `?` parameters.
///
/// Fragments compose with [`SqlFilter::and`]; parameters stay in placeholder
/// order, so values are never spliced into the SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFilter {
    pub sql: String,
    pub params: Vec<String>,
}

impl SqlFilter {
    pub fn new(sql: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// The neutral filter.
    pub fn always() -> Self {
        Self::new("1 = 1", Vec::new())
    }

    pub fn and(mut self, other: SqlFilter) -> Self {
        self.sql = format!("({}) AND ({})", self.sql, other.sql);
        self.params.extend(other.params);
        self
    }

    fn bind_values(&self) -> Vec<Value> {
        self.params.iter().cloned().map(Value::Text).collect()
    }
}

impl Default for SqlFilter {
    fn default() -> Self {
        Self::always()
    }
}

pub struct CatalogQuery<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> CatalogQuery<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    /// Products passing `filter`, newest release first, undated last.
    pub fn list(&self, filter: &SqlFilter, limit: usize, offset: usize) -> Result<Vec<CanonicalProduct>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p
             WHERE {}
             ORDER BY p.release_date IS NULL, p.release_date DESC, p.id DESC
             LIMIT ? OFFSET ?",
            filter.sql
        );

        let mut values = filter.bind_values();
        values.push(Value::Integer(limit as i64));
        values.push(Value::Integer(offset as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), row_to_product)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self, filter: &SqlFilter) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM products p WHERE {}", filter.sql);
        let values = filter.bind_values();
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(count as usize)
    }
}
