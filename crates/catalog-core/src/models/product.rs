use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type ProductId = i64;

/// One row per physical title known to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    pub id: ProductId,

    /// Catalog-wide code. Set once on first sighting and never changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_product_id: Option<String>,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_thumbnail_url: Option<String>,
}

/// Fields a crawler supplies when creating or refreshing a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_product_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_thumbnail_url: Option<String>,
}

impl ProductDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.normalized_product_id = Some(code.into());
        self
    }

    pub fn with_release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.default_thumbnail_url = Some(url.into());
        self
    }
}
