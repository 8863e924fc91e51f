use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 2;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS products (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            normalized_product_id TEXT UNIQUE,
            title                 TEXT NOT NULL,
            release_date          TEXT,
            default_thumbnail_url TEXT,
            created_at            TEXT NOT NULL,
            updated_at            TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS source_listings (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id          INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            asp_name            TEXT NOT NULL,
            original_product_id TEXT NOT NULL,
            affiliate_url       TEXT NOT NULL DEFAULT '',
            price               INTEGER,
            sale_price          INTEGER,
            is_subscription     INTEGER NOT NULL DEFAULT 0,
            data_source         TEXT NOT NULL DEFAULT '',
            updated_at          TEXT NOT NULL,
            UNIQUE (product_id, asp_name)
        );
        ",
    )?;
    Ok(())
}

pub fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_listings_product ON source_listings(product_id);
        CREATE INDEX IF NOT EXISTS idx_listings_asp ON source_listings(asp_name);
        CREATE INDEX IF NOT EXISTS idx_products_release ON products(release_date DESC);
        ",
    )?;
    Ok(())
}

pub fn create_code_lookup_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_listings_original_code
            ON source_listings(original_product_id);
        ",
    )?;
    Ok(())
}
