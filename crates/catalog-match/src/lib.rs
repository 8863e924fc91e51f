//! Cross-ASP product identity, provider policy and listing dedup.

pub mod dedup;
pub mod error;
pub mod identifiers;
pub mod ingest;
pub mod policy;
pub mod provider;
pub mod selection;
pub mod storefront;
pub mod types;

pub use dedup::{DedupGroup, dedupe, group_by_title, normalize_title};
pub use error::{MatchError, Result};
pub use identifiers::{
    codes_match, generate_variations, normalize_for_search, strip_known_prefix, to_like_pattern,
};
pub use ingest::{IngestOutcome, IngestSummary, Ingestor};
pub use policy::{
    AspSet, FilterMode, ProviderFilter, Rule, provider_filter_predicate, visibility_predicate,
};
pub use provider::{AspNormalizer, ProviderRegistry};
pub use selection::{Selection, SelectionDiagnostics, SelectionOptions, select};
pub use storefront::{Storefront, StorefrontPage, StorefrontQuery};
pub use types::{AlternativeSource, ProductListing};
