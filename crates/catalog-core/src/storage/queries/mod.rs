mod catalog_query;
mod product_search;

pub use catalog_query::{CatalogQuery, SqlFilter};
pub use product_search::ProductSearchQuery;
