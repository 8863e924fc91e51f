use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::sync::MutexGuard;

use crate::error::Result;
use crate::models::CanonicalProduct;
use crate::storage::queries::SqlFilter;
use crate::storage::repositories::{placeholders, row_to_product, PRODUCT_COLUMNS};

pub struct ProductSearchQuery<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> ProductSearchQuery<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    /// Free-text product-code lookup: exact hits on any spelling in `variations`,
    /// plus `LIKE` hits on `like_pattern` against lowercased codes. `filter`
    /// applies before the limit.
    pub fn by_code(
        &self,
        variations: &[String],
        like_pattern: &str,
        filter: &SqlFilter,
        limit: usize,
    ) -> Result<Vec<CanonicalProduct>> {
        let mut values: Vec<Value> = Vec::with_capacity(variations.len() * 2 + 3);
        let mut clauses = Vec::new();

        if !variations.is_empty() {
            let marks = placeholders(variations.len());
            clauses.push(format!("p.normalized_product_id IN ({marks})"));
            clauses.push(format!(
                "p.id IN (SELECT sl.product_id FROM source_listings sl
                          WHERE sl.original_product_id IN ({marks}))"
            ));
            values.extend(variations.iter().cloned().map(Value::Text));
            values.extend(variations.iter().cloned().map(Value::Text));
        }

        if !like_pattern.is_empty() {
            clauses.push("LOWER(p.normalized_product_id) LIKE ?".to_string());
            clauses.push(
                "p.id IN (SELECT sl.product_id FROM source_listings sl
                          WHERE LOWER(sl.original_product_id) LIKE ?)"
                    .to_string(),
            );
            values.push(Value::Text(like_pattern.to_string()));
            values.push(Value::Text(like_pattern.to_string()));
        }

        if clauses.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p
             WHERE ({}) AND ({})
             ORDER BY p.id
             LIMIT ?",
            clauses.join(" OR "),
            filter.sql
        );
        values.extend(filter.params.iter().cloned().map(Value::Text));
        values.push(Value::Integer(limit as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), row_to_product)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
