pub mod families;
pub mod product_code;

pub use families::{CodeFamily, BRAND_CODE_TAG, families};
pub use product_code::{
    KNOWN_PREFIXES, codes_match, generate_variations, normalize_for_search, strip_known_prefix,
    to_like_pattern,
};
