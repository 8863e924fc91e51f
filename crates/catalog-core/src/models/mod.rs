pub mod listing;
pub mod product;
pub mod site_mode;

pub use listing::*;
pub use product::*;
pub use site_mode::*;
