mod connection;
mod migrations;
mod schema;

pub use connection::ConnectionPool;
pub use migrations::{get_applied_versions, run_migrations, Migration};
pub use schema::{apply_pragmas, SCHEMA_VERSION};

use std::collections::HashMap;
use std::path::Path;

use crate::error::{CatalogError, Result};
use crate::models::{CanonicalProduct, ProductDraft, ProductId, SourceListing};

use super::queries::{CatalogQuery, ProductSearchQuery, SqlFilter};
use super::repositories::{
    ListingRepository, ProductRepository, Repository, SqliteListingRepository,
    SqliteProductRepository,
};

pub fn open_database(path: &Path) -> Result<ConnectionPool> {
    let pool = ConnectionPool::open(path)?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

pub fn open_in_memory() -> Result<ConnectionPool> {
    let pool = ConnectionPool::open_in_memory()?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

/// The relational catalog store: canonical products and their source listings.
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let pool = open_database(path)?;
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = open_in_memory()?;
        Ok(Self { pool })
    }

    pub fn path(&self) -> Option<&str> {
        self.pool.path()
    }

    pub fn schema_versions(&self) -> Result<Vec<u32>> {
        let conn = self.pool.get_connection();
        get_applied_versions(&conn)
    }

    // ─── Products ──────────────────────────────────────────

    pub fn get_product(&self, id: ProductId) -> Result<CanonicalProduct> {
        let conn = self.pool.get_connection();
        let repo = SqliteProductRepository::new(conn);
        repo.find_by_id(&id)?.ok_or(CatalogError::ProductNotFound(id))
    }

    pub fn find_product_by_codes(&self, codes: &[String]) -> Result<Option<CanonicalProduct>> {
        let conn = self.pool.get_connection();
        let repo = SqliteProductRepository::new(conn);
        repo.find_by_codes(codes)
    }

    pub fn insert_product(&self, draft: &ProductDraft) -> Result<(ProductId, bool)> {
        if draft.title.trim().is_empty() {
            return Err(CatalogError::ValidationError(
                "product title must not be empty".to_string(),
            ));
        }
        let conn = self.pool.get_connection();
        let repo = SqliteProductRepository::new(conn);
        repo.insert_or_get(draft)
    }

    pub fn refresh_product(&self, id: ProductId, draft: &ProductDraft) -> Result<()> {
        let conn = self.pool.get_connection();
        let repo = SqliteProductRepository::new(conn);
        repo.refresh(id, draft)
    }

    pub fn save_product(&self, product: &CanonicalProduct) -> Result<()> {
        let conn = self.pool.get_connection();
        let repo = SqliteProductRepository::new(conn);
        repo.save(product)
    }

    pub fn count_products(&self) -> Result<usize> {
        let conn = self.pool.get_connection();
        let repo = SqliteProductRepository::new(conn);
        repo.count()
    }

    // ─── Listings ──────────────────────────────────────────

    pub fn upsert_listing(&self, listing: &SourceListing) -> Result<()> {
        let conn = self.pool.get_connection();
        let repo = SqliteListingRepository::new(conn);
        repo.save(listing)
    }

    pub fn get_listing(&self, product_id: ProductId, asp_name: &str) -> Result<Option<SourceListing>> {
        let conn = self.pool.get_connection();
        let repo = SqliteListingRepository::new(conn);
        repo.find_by_id(&(product_id, asp_name.to_string()))
    }

    pub fn listings_for_product(&self, product_id: ProductId) -> Result<Vec<SourceListing>> {
        let conn = self.pool.get_connection();
        let repo = SqliteListingRepository::new(conn);
        repo.list_for_product(product_id)
    }

    pub fn listings_for_products(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Vec<SourceListing>>> {
        let conn = self.pool.get_connection();
        let repo = SqliteListingRepository::new(conn);
        repo.list_for_products(product_ids)
    }

    // ─── Queries ───────────────────────────────────────────

    pub fn list_products(
        &self,
        filter: &SqlFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CanonicalProduct>> {
        let conn = self.pool.get_connection();
        let query = CatalogQuery::new(conn);
        query.list(filter, limit, offset)
    }

    pub fn count_filtered(&self, filter: &SqlFilter) -> Result<usize> {
        let conn = self.pool.get_connection();
        let query = CatalogQuery::new(conn);
        query.count(filter)
    }

    pub fn search_by_code(
        &self,
        variations: &[String],
        like_pattern: &str,
        filter: &SqlFilter,
        limit: usize,
    ) -> Result<Vec<CanonicalProduct>> {
        let conn = self.pool.get_connection();
        let search = ProductSearchQuery::new(conn);
        search.by_code(variations, like_pattern, filter, limit)
    }
}
