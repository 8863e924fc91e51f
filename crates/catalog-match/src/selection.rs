use std::collections::HashMap;

use catalog_core::{ProductId, SiteMode, SourceListing};
use serde::Serialize;
use tracing::{debug, warn};

use crate::provider::AspNormalizer;

#[derive(Debug, Clone, Default)]
pub struct SelectionOptions {
    pub site_mode: SiteMode,
    /// Provider names, raw or canonical, in order of preference.
    pub preferred_providers: Vec<String>,
}

impl SelectionOptions {
    pub fn new(site_mode: SiteMode) -> Self {
        Self {
            site_mode,
            preferred_providers: Vec::new(),
        }
    }

    pub fn with_preferred(mut self, providers: Vec<String>) -> Self {
        self.preferred_providers = providers;
        self
    }
}

/// Per-call counters for operational logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionDiagnostics {
    pub matched: usize,
    pub fallback: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub selected: HashMap<ProductId, SourceListing>,
    pub diagnostics: SelectionDiagnostics,
}

/// Pick the one listing to display per product.
///
/// `single-brand-only` takes the brand listing, falling back to the first
/// listing when there is none. `all` never shows the brand listing: products
/// left without candidates are skipped, the rest take the first preferred
/// provider present, else the first candidate.
pub fn select(
    sources_by_product: &HashMap<ProductId, Vec<SourceListing>>,
    options: &SelectionOptions,
    normalizer: &AspNormalizer,
) -> Selection {
    let preferred: Vec<String> = options
        .preferred_providers
        .iter()
        .map(|p| normalizer.normalize(p))
        .filter(|p| !p.is_empty())
        .collect();
    let brand = normalizer.brand();

    let mut selection = Selection::default();
    let diag = &mut selection.diagnostics;

    for (&product_id, sources) in sources_by_product {
        let tagged: Vec<(String, &SourceListing)> = sources
            .iter()
            .map(|s| (normalizer.canonical_of(s), s))
            .collect();

        let chosen = match options.site_mode {
            SiteMode::SingleBrandOnly => {
                match tagged.iter().find(|(provider, _)| provider == brand) {
                    Some((_, source)) => Some(*source),
                    None => {
                        let first = tagged.first().map(|(_, s)| *s);
                        if first.is_some() {
                            diag.fallback += 1;
                            warn!(product_id, "no brand listing in single-brand mode; using first listing");
                        } else {
                            diag.skipped += 1;
                        }
                        first
                    }
                }
            }
            SiteMode::All => {
                let candidates: Vec<&(String, &SourceListing)> =
                    tagged.iter().filter(|(provider, _)| provider != brand).collect();
                if candidates.is_empty() {
                    diag.skipped += 1;
                    None
                } else {
                    let hit = preferred.iter().find_map(|want| {
                        candidates.iter().find(|(provider, _)| provider == want)
                    });
                    match hit {
                        Some((_, source)) => {
                            diag.matched += 1;
                            Some(*source)
                        }
                        None => {
                            diag.fallback += 1;
                            candidates.first().map(|(_, s)| *s)
                        }
                    }
                }
            }
        };

        if let Some(source) = chosen {
            selection.selected.insert(product_id, source.clone());
        }
    }

    debug!(
        mode = %options.site_mode,
        products = sources_by_product.len(),
        matched = selection.diagnostics.matched,
        fallback = selection.diagnostics.fallback,
        skipped = selection.diagnostics.skipped,
        "source selection done"
    );
    selection
}
