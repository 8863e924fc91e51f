use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::product::ProductId;

/// One ASP's record of a canonical product. Unique per `(product_id, asp_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceListing {
    pub product_id: ProductId,
    /// Raw provider identifier as emitted by the crawler.
    pub asp_name: String,
    /// The ASP's own spelling of the product code.
    pub original_product_id: String,
    pub affiliate_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<i64>,

    #[serde(default)]
    pub is_subscription: bool,

    #[serde(default)]
    pub data_source: String,
}

/// A raw record handed over by a crawler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlRecord {
    pub title: String,
    pub asp_name: String,
    pub original_product_id: String,

    #[serde(default)]
    pub affiliate_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<i64>,

    #[serde(default)]
    pub is_subscription: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(default)]
    pub data_source: String,
}

impl CrawlRecord {
    /// Project the record onto the listing row it upserts.
    pub fn to_listing(&self, product_id: ProductId) -> SourceListing {
        SourceListing {
            product_id,
            asp_name: self.asp_name.trim().to_string(),
            original_product_id: self.original_product_id.trim().to_string(),
            affiliate_url: self.affiliate_url.clone(),
            price: self.price,
            sale_price: self.sale_price,
            is_subscription: self.is_subscription,
            data_source: self.data_source.clone(),
        }
    }
}
