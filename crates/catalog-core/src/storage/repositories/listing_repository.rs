use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::MutexGuard;

use crate::error::Result;
use crate::models::{ProductId, SourceListing};

use super::{placeholders, Repository};

const LISTING_COLUMNS: &str = "sl.product_id, sl.asp_name, sl.original_product_id, sl.affiliate_url,
     sl.price, sl.sale_price, sl.is_subscription, sl.data_source";

fn row_to_listing(row: &rusqlite::Row) -> rusqlite::Result<SourceListing> {
    Ok(SourceListing {
        product_id: row.get(0)?,
        asp_name: row.get(1)?,
        original_product_id: row.get(2)?,
        affiliate_url: row.get(3)?,
        price: row.get(4)?,
        sale_price: row.get(5)?,
        is_subscription: row.get(6)?,
        data_source: row.get(7)?,
    })
}

pub trait ListingRepository: Repository<Entity = SourceListing, Id = (ProductId, String)> {
    /// Listings of one product in first-crawled order.
    fn list_for_product(&self, product_id: ProductId) -> Result<Vec<SourceListing>>;
    /// Listings of many products, each list in first-crawled order.
    fn list_for_products(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Vec<SourceListing>>>;
}

pub struct SqliteListingRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteListingRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }
}

impl<'a> Repository for SqliteListingRepository<'a> {
    type Entity = SourceListing;
    type Id = (ProductId, String);

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM source_listings sl
             WHERE sl.product_id = ?1 AND sl.asp_name = ?2"
        );
        let listing = self
            .conn
            .query_row(&sql, params![id.0, id.1], row_to_listing)
            .optional()?;
        Ok(listing)
    }

    /// Upsert keyed by `(product_id, asp_name)`; re-crawls update in place.
    fn save(&self, entity: &Self::Entity) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO source_listings (product_id, asp_name, original_product_id, affiliate_url,
                                          price, sale_price, is_subscription, data_source, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(product_id, asp_name) DO UPDATE SET
                original_product_id = excluded.original_product_id,
                affiliate_url = excluded.affiliate_url,
                price = excluded.price,
                sale_price = excluded.sale_price,
                is_subscription = excluded.is_subscription,
                data_source = excluded.data_source,
                updated_at = excluded.updated_at",
            params![
                entity.product_id,
                entity.asp_name,
                entity.original_product_id,
                entity.affiliate_url,
                entity.price,
                entity.sale_price,
                entity.is_subscription,
                entity.data_source,
                now,
            ],
        )?;
        Ok(())
    }
}

impl<'a> ListingRepository for SqliteListingRepository<'a> {
    fn list_for_product(&self, product_id: ProductId) -> Result<Vec<SourceListing>> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM source_listings sl
             WHERE sl.product_id = ?1
             ORDER BY sl.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![product_id], row_to_listing)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn list_for_products(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Vec<SourceListing>>> {
        let mut grouped: HashMap<ProductId, Vec<SourceListing>> = HashMap::new();
        if product_ids.is_empty() {
            return Ok(grouped);
        }

        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM source_listings sl
             WHERE sl.product_id IN ({})
             ORDER BY sl.product_id, sl.id",
            placeholders(product_ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(product_ids.iter()), row_to_listing)?;
        for row in rows {
            let listing = row?;
            grouped.entry(listing.product_id).or_default().push(listing);
        }
        Ok(grouped)
    }
}
