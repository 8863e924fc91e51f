pub mod normalizer;
pub mod registry;

pub use normalizer::AspNormalizer;
pub use registry::{BRAND_PROVIDER, ProviderEntry, ProviderRegistry, fold};
