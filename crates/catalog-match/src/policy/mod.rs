//! Storefront visibility and provider filters as one rule tree with two
//! interpreters: in-memory evaluation and SQL compilation.

pub mod rule;
pub mod sql;
pub mod visibility;

pub use rule::{AspSet, Rule};
pub use sql::compile;
pub use visibility::{
    FilterMode, ProviderFilter, provider_filter_predicate, storefront_rule, visibility_predicate,
};
