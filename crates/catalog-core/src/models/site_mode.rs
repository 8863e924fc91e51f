use serde::{Deserialize, Serialize};

/// Which ASPs a storefront is allowed to surface.
///
/// Always passed explicitly into queries and selection; never read from
/// process-wide state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SiteMode {
    /// General storefront: every ASP except items exclusive to the brand network.
    #[default]
    All,
    /// Brand storefront: only items the brand network itself lists.
    SingleBrandOnly,
}

impl SiteMode {
    pub fn is_single_brand(self) -> bool {
        matches!(self, Self::SingleBrandOnly)
    }
}

impl std::fmt::Display for SiteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::SingleBrandOnly => write!(f, "single-brand-only"),
        }
    }
}

impl std::str::FromStr for SiteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(Self::All),
            "single-brand-only" | "single_brand_only" | "brand" => Ok(Self::SingleBrandOnly),
            _ => Err(format!("Invalid SiteMode: {s}")),
        }
    }
}
