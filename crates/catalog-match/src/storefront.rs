//! Storefront read path: policy filter, fetch, source selection, dedup.

use std::collections::HashMap;

use catalog_core::{CanonicalProduct, Database, ProductId, SiteMode, SourceListing};
use serde::Serialize;
use tracing::debug;

use crate::dedup::dedupe;
use crate::error::Result;
use crate::identifiers::{generate_variations, to_like_pattern};
use crate::policy::{ProviderFilter, compile, storefront_rule, visibility_predicate};
use crate::provider::AspNormalizer;
use crate::selection::{SelectionDiagnostics, SelectionOptions, select};
use crate::types::ProductListing;

#[derive(Debug, Clone)]
pub struct StorefrontQuery {
    pub site_mode: SiteMode,
    pub providers: Option<ProviderFilter>,
    pub preferred_providers: Vec<String>,
    pub limit: usize,
    pub offset: usize,
}

impl StorefrontQuery {
    pub fn new(site_mode: SiteMode, limit: usize) -> Self {
        Self {
            site_mode,
            providers: None,
            preferred_providers: Vec::new(),
            limit,
            offset: 0,
        }
    }

    pub fn with_providers(mut self, filter: ProviderFilter) -> Self {
        self.providers = Some(filter);
        self
    }

    pub fn with_preferred(mut self, providers: Vec<String>) -> Self {
        self.preferred_providers = providers;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    fn selection_options(&self) -> SelectionOptions {
        SelectionOptions::new(self.site_mode).with_preferred(self.preferred_providers.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StorefrontPage {
    pub items: Vec<ProductListing>,
    /// Products passing the filter before paging and dedup.
    pub total: usize,
    pub diagnostics: SelectionDiagnostics,
}

pub struct Storefront<'a> {
    db: &'a Database,
    normalizer: &'a AspNormalizer,
}

impl<'a> Storefront<'a> {
    pub fn new(db: &'a Database, normalizer: &'a AspNormalizer) -> Self {
        Self { db, normalizer }
    }

    /// One page of display rows for a storefront.
    ///
    /// Visibility and the provider filter run in SQL. Each fetched product
    /// then gets one listing chosen for it, and rows sharing a title collapse
    /// into the cheapest. Dedup runs after paging, so a page can come back
    /// shorter than `limit`.
    pub fn list(&self, query: &StorefrontQuery) -> Result<StorefrontPage> {
        let rule = storefront_rule(query.site_mode, query.providers.as_ref(), self.normalizer);
        let filter = compile(&rule, self.normalizer);

        let products = self.db.list_products(&filter, query.limit, query.offset)?;
        let total = self.db.count_filtered(&filter)?;
        let (items, diagnostics) = self.materialize(&products, &query.selection_options())?;

        debug!(
            mode = %query.site_mode,
            fetched = products.len(),
            shown = items.len(),
            total,
            "assembled storefront page"
        );
        Ok(StorefrontPage {
            items,
            total,
            diagnostics,
        })
    }

    /// Product-code search under the storefront's visibility rule. Visibility
    /// runs in SQL ahead of `limit`.
    pub fn search_code(
        &self,
        code: &str,
        options: &SelectionOptions,
        limit: usize,
    ) -> Result<Vec<ProductListing>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(Vec::new());
        }

        let variations: Vec<String> = generate_variations(code).into_iter().collect();
        let visible = compile(
            &visibility_predicate(options.site_mode, self.normalizer),
            self.normalizer,
        );
        let hits = self
            .db
            .search_by_code(&variations, &to_like_pattern(code), &visible, limit)?;

        let ids: Vec<ProductId> = hits.iter().map(|p| p.id).collect();
        let sources = self.db.listings_for_products(&ids)?;
        let (items, _) = self.materialize_with(&hits, sources, options);
        debug!(code, hits = items.len(), "code search");
        Ok(items)
    }

    fn materialize(
        &self,
        products: &[CanonicalProduct],
        options: &SelectionOptions,
    ) -> Result<(Vec<ProductListing>, SelectionDiagnostics)> {
        let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
        let sources = self.db.listings_for_products(&ids)?;
        Ok(self.materialize_with(products, sources, options))
    }

    fn materialize_with(
        &self,
        products: &[CanonicalProduct],
        mut sources: HashMap<ProductId, Vec<SourceListing>>,
        options: &SelectionOptions,
    ) -> (Vec<ProductListing>, SelectionDiagnostics) {
        sources.retain(|id, _| products.iter().any(|p| p.id == *id));
        for product in products {
            sources.entry(product.id).or_default();
        }

        let selection = select(&sources, options, self.normalizer);
        let rows: Vec<ProductListing> = products
            .iter()
            .filter_map(|product| {
                let source = selection.selected.get(&product.id)?;
                let provider = self.normalizer.canonical_of(source);
                Some(ProductListing::materialize(product, source, provider))
            })
            .collect();

        (dedupe(rows, options.site_mode), selection.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Ingestor;
    use crate::policy::FilterMode;
    use catalog_core::CrawlRecord;
    use chrono::NaiveDate;

    fn record(title: &str, asp: &str, code: &str, price: i64, day: u32) -> CrawlRecord {
        CrawlRecord {
            title: title.to_string(),
            asp_name: asp.to_string(),
            original_product_id: code.to_string(),
            affiliate_url: format!("https://{}.example/{code}", asp.to_lowercase()),
            price: Some(price),
            release_date: NaiveDate::from_ymd_opt(2024, 1, day),
            ..Default::default()
        }
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        let ingestor = Ingestor::new(&db);
        ingestor
            .ingest_batch(vec![
                // brand exclusive
                record("Exclusive", "FANZA", "EXC-001", 900, 1),
                // shared between brand and MGS
                record("Shared", "FANZA", "SHR-001", 1200, 2),
                record("Shared", "MGS", "SHR-001", 1100, 2),
                // same title under two codes, two ASPs
                record("Twin", "DUGA", "TWA-001", 1500, 3),
                record("Twin", "SOKMIL", "TWB-001", 700, 3),
            ])
            .unwrap();
        db
    }

    fn titles(page: &StorefrontPage) -> Vec<&str> {
        page.items.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn general_storefront_hides_brand_exclusives() {
        let db = seeded();
        let n = AspNormalizer::default();
        let page = Storefront::new(&db, &n)
            .list(&StorefrontQuery::new(SiteMode::All, 20))
            .unwrap();

        assert_eq!(titles(&page), vec!["Twin", "Shared"]);
        let shared = &page.items[1];
        assert_eq!(shared.provider.as_deref(), Some("mgs"));

        let twin = &page.items[0];
        assert_eq!(twin.provider.as_deref(), Some("sokmil"));
        assert_eq!(twin.price, Some(700));
        let alts = twin.alternative_sources.as_ref().unwrap();
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].asp_name, "duga");
    }

    #[test]
    fn brand_storefront_shows_only_brand_listings() {
        let db = seeded();
        let n = AspNormalizer::default();
        let page = Storefront::new(&db, &n)
            .list(&StorefrontQuery::new(SiteMode::SingleBrandOnly, 20))
            .unwrap();

        assert_eq!(titles(&page), vec!["Shared", "Exclusive"]);
        assert!(page.items.iter().all(|p| p.provider.as_deref() == Some("fanza")));
        assert_eq!(page.diagnostics.fallback, 0);
    }

    #[test]
    fn provider_filters_compose_with_visibility() {
        let db = seeded();
        let n = AspNormalizer::default();
        let storefront = Storefront::new(&db, &n);

        let only_mgs = StorefrontQuery::new(SiteMode::All, 20)
            .with_providers(ProviderFilter::include(vec!["MGStage".into()]));
        assert_eq!(titles(&storefront.list(&only_mgs).unwrap()), vec!["Shared"]);

        let no_sokmil = StorefrontQuery::new(SiteMode::All, 20).with_providers(ProviderFilter {
            providers: vec!["sokmil".into()],
            mode: FilterMode::Exclude,
        });
        let page = storefront.list(&no_sokmil).unwrap();
        assert_eq!(titles(&page), vec!["Twin", "Shared"]);
        assert_eq!(page.items[0].provider.as_deref(), Some("duga"));
        assert!(page.items[0].alternative_sources.is_none());
    }

    #[test]
    fn preferred_provider_is_used_when_present() {
        let db = seeded();
        let n = AspNormalizer::default();
        let query = StorefrontQuery::new(SiteMode::All, 20).with_preferred(vec!["mgs".into()]);
        let page = Storefront::new(&db, &n).list(&query).unwrap();
        assert_eq!(page.diagnostics.matched, 1);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn paging_applies_before_dedup() {
        let db = seeded();
        let n = AspNormalizer::default();
        let query = StorefrontQuery::new(SiteMode::All, 1).with_offset(1);
        let page = Storefront::new(&db, &n).list(&query).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn code_search_respects_visibility() {
        let db = seeded();
        let n = AspNormalizer::default();
        let storefront = Storefront::new(&db, &n);

        let general = SelectionOptions::new(SiteMode::All);
        assert!(storefront.search_code("exc001", &general, 10).unwrap().is_empty());
        let hits = storefront.search_code("shr-1", &general, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].provider.as_deref(), Some("mgs"));

        let brand = SelectionOptions::new(SiteMode::SingleBrandOnly);
        let hits = storefront.search_code("EXC-001", &brand, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(storefront.search_code("  ", &brand, 10).unwrap().is_empty());
    }

    #[test]
    fn code_search_limit_counts_visible_hits_only() {
        let db = Database::open_in_memory().unwrap();
        Ingestor::new(&db)
            .ingest_batch(vec![
                record("Hidden", "FANZA", "LIM-001", 900, 1),
                record("Shown", "MGS", "LIMX-001", 800, 2),
            ])
            .unwrap();
        let n = AspNormalizer::default();

        let hits = Storefront::new(&db, &n)
            .search_code("LIM-001", &SelectionOptions::new(SiteMode::All), 1)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Shown");
    }
}
