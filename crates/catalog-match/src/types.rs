use catalog_core::{CanonicalProduct, ProductId, SourceListing};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One display row: a canonical product materialized with the listing chosen
/// for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductListing {
    pub id: ProductId,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_product_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Canonical provider of the displayed listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<i64>,

    /// Cheaper-or-equal offers for the same title, set in `all` mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_sources: Option<Vec<AlternativeSource>>,
}

/// A non-winning member of a title group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeSource {
    pub asp_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<i64>,
    pub affiliate_url: String,
    pub product_id: ProductId,
}

impl ProductListing {
    pub fn new(id: ProductId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            normalized_product_id: None,
            release_date: None,
            thumbnail_url: None,
            provider: None,
            affiliate_url: None,
            price: None,
            sale_price: None,
            alternative_sources: None,
        }
    }

    /// Build the display row for `product` from its chosen `source`, whose
    /// canonical provider is `provider`.
    pub fn materialize(product: &CanonicalProduct, source: &SourceListing, provider: String) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            normalized_product_id: product.normalized_product_id.clone(),
            release_date: product.release_date,
            thumbnail_url: product.default_thumbnail_url.clone(),
            provider: Some(provider),
            affiliate_url: Some(source.affiliate_url.clone()).filter(|u| !u.is_empty()),
            price: source.price,
            sale_price: source.sale_price,
            alternative_sources: None,
        }
    }

    pub fn with_price(mut self, price: Option<i64>, sale_price: Option<i64>) -> Self {
        self.price = price;
        self.sale_price = sale_price;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sale price if any, else list price.
    pub fn effective_price(&self) -> Option<i64> {
        self.sale_price.or(self.price)
    }

    pub fn as_alternative(&self) -> AlternativeSource {
        AlternativeSource {
            asp_name: self.provider.clone().unwrap_or_else(|| "unknown".to_string()),
            price: self.price,
            sale_price: self.sale_price,
            affiliate_url: self.affiliate_url.clone().unwrap_or_default(),
            product_id: self.id,
        }
    }
}
