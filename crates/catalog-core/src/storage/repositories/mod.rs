mod listing_repository;
mod product_repository;

pub use listing_repository::{ListingRepository, SqliteListingRepository};
pub use product_repository::{ProductRepository, SqliteProductRepository};
pub(crate) use product_repository::{row_to_product, PRODUCT_COLUMNS};

use crate::error::Result;

pub trait Repository {
    type Entity;
    type Id;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;
    fn save(&self, entity: &Self::Entity) -> Result<()>;
}

/// `?, ?, ?` for an `IN (...)` list of `count` parameters.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
