use chrono::{NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::MutexGuard;

use crate::error::Result;
use crate::models::{CanonicalProduct, ProductDraft, ProductId};

use super::{placeholders, Repository};

pub(crate) const PRODUCT_COLUMNS: &str =
    "p.id, p.normalized_product_id, p.title, p.release_date, p.default_thumbnail_url";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn row_to_product(row: &rusqlite::Row) -> rusqlite::Result<CanonicalProduct> {
    let release: Option<String> = row.get(3)?;
    Ok(CanonicalProduct {
        id: row.get(0)?,
        normalized_product_id: row.get(1)?,
        title: row.get(2)?,
        release_date: release.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
        default_thumbnail_url: row.get(4)?,
    })
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

pub trait ProductRepository: Repository<Entity = CanonicalProduct, Id = ProductId> {
    /// First product (lowest id) whose catalog code or any listing's original
    /// code is one of `codes`.
    fn find_by_codes(&self, codes: &[String]) -> Result<Option<CanonicalProduct>>;
    /// Create a product. A draft whose code is already taken resolves to the
    /// existing row; the flag reports whether a row was inserted.
    fn insert_or_get(&self, draft: &ProductDraft) -> Result<(ProductId, bool)>;
    /// Re-crawl refresh: title, thumbnail and date. The catalog code is only
    /// filled in when still unset and not held by another product.
    fn refresh(&self, id: ProductId, draft: &ProductDraft) -> Result<()>;
    fn count(&self) -> Result<usize>;
}

pub struct SqliteProductRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteProductRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn find_by_normalized_id(&self, code: &str) -> Result<Option<CanonicalProduct>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.normalized_product_id = ?1"
        );
        let product = self
            .conn
            .query_row(&sql, params![code], row_to_product)
            .optional()?;
        Ok(product)
    }
}

impl<'a> Repository for SqliteProductRepository<'a> {
    type Entity = CanonicalProduct;
    type Id = ProductId;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1");
        let product = self
            .conn
            .query_row(&sql, params![id], row_to_product)
            .optional()?;
        Ok(product)
    }

    fn save(&self, entity: &Self::Entity) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO products (id, normalized_product_id, title, release_date,
                                   default_thumbnail_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(id) DO UPDATE SET
                normalized_product_id = COALESCE(products.normalized_product_id,
                                                 excluded.normalized_product_id),
                title = excluded.title,
                release_date = excluded.release_date,
                default_thumbnail_url = excluded.default_thumbnail_url,
                updated_at = excluded.updated_at",
            params![
                entity.id,
                entity.normalized_product_id,
                entity.title,
                format_date(entity.release_date),
                entity.default_thumbnail_url,
                now,
            ],
        )?;
        Ok(())
    }
}

impl<'a> ProductRepository for SqliteProductRepository<'a> {
    fn find_by_codes(&self, codes: &[String]) -> Result<Option<CanonicalProduct>> {
        if codes.is_empty() {
            return Ok(None);
        }

        let marks = placeholders(codes.len());
        let by_catalog_code = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p
             WHERE p.normalized_product_id IN ({marks})
             ORDER BY p.id
             LIMIT 1"
        );
        let found = self
            .conn
            .query_row(&by_catalog_code, params_from_iter(codes.iter()), row_to_product)
            .optional()?;
        if found.is_some() {
            return Ok(found);
        }

        let by_listing_code = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p
             WHERE p.id IN (
                 SELECT sl.product_id FROM source_listings sl
                 WHERE sl.original_product_id IN ({marks})
             )
             ORDER BY p.id
             LIMIT 1"
        );
        let found = self
            .conn
            .query_row(&by_listing_code, params_from_iter(codes.iter()), row_to_product)
            .optional()?;
        Ok(found)
    }

    fn insert_or_get(&self, draft: &ProductDraft) -> Result<(ProductId, bool)> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT INTO products (normalized_product_id, title, release_date,
                                   default_thumbnail_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(normalized_product_id) DO NOTHING",
            params![
                draft.normalized_product_id,
                draft.title,
                format_date(draft.release_date),
                draft.default_thumbnail_url,
                now,
            ],
        )?;

        if inserted > 0 {
            return Ok((self.conn.last_insert_rowid(), true));
        }

        // Only a taken catalog code makes the insert a no-op.
        let code = draft.normalized_product_id.as_deref().unwrap_or_default();
        match self.find_by_normalized_id(code)? {
            Some(existing) => Ok((existing.id, false)),
            None => Err(crate::error::CatalogError::ValidationError(format!(
                "product code '{code}' conflicted but no owner was found"
            ))),
        }
    }

    fn refresh(&self, id: ProductId, draft: &ProductDraft) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE products SET
                title = CASE WHEN TRIM(?2) = '' THEN title ELSE ?2 END,
                release_date = COALESCE(?3, release_date),
                default_thumbnail_url = COALESCE(?4, default_thumbnail_url),
                updated_at = ?5
             WHERE id = ?1",
            params![
                id,
                draft.title,
                format_date(draft.release_date),
                draft.default_thumbnail_url,
                now,
            ],
        )?;

        if let Some(code) = draft.normalized_product_id.as_deref() {
            self.conn.execute(
                "UPDATE products SET normalized_product_id = ?1
                 WHERE id = ?2
                   AND normalized_product_id IS NULL
                   AND NOT EXISTS (SELECT 1 FROM products WHERE normalized_product_id = ?1)",
                params![code, id],
            )?;
        }
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
