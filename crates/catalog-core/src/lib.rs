pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{CatalogConfig, CoreConfig, ProvidersConfig, StorefrontConfig};
pub use error::{CatalogError, Result};
pub use models::*;

pub use storage::database::{ConnectionPool, Database, open_database, open_in_memory};
pub use storage::queries::{CatalogQuery, ProductSearchQuery, SqlFilter};
pub use storage::repositories::{
    ListingRepository, ProductRepository, Repository, SqliteListingRepository,
    SqliteProductRepository,
};
