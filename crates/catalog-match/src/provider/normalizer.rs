use std::collections::HashMap;

use catalog_core::SourceListing;
use url::{ParseError, Url};

use super::registry::{fold, ProviderEntry, ProviderRegistry, BRAND_PROVIDER};

/// Maps raw ASP names (and, for aggregators, affiliate URLs) to canonical
/// provider ids.
///
/// Unknown raw names pass through as their folded selves, so a new ASP is
/// still matched on its own name before it is onboarded.
#[derive(Debug, Clone)]
pub struct AspNormalizer {
    registry: ProviderRegistry,
    by_raw: HashMap<String, String>,
    brand: String,
}

impl Default for AspNormalizer {
    fn default() -> Self {
        Self::new(ProviderRegistry::builtin())
    }
}

impl AspNormalizer {
    pub fn new(registry: ProviderRegistry) -> Self {
        let mut by_raw = HashMap::new();
        for entry in registry.entries() {
            for key in entry.keys() {
                by_raw.entry(key).or_insert_with(|| entry.id.clone());
            }
        }
        Self {
            registry,
            by_raw,
            brand: BRAND_PROVIDER.to_string(),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Canonical id of the single-brand network.
    pub fn brand(&self) -> &str {
        &self.brand
    }

    /// Canonical id for a raw ASP name alone.
    pub fn normalize(&self, asp_name: &str) -> String {
        let key = fold(asp_name);
        self.by_raw.get(&key).cloned().unwrap_or(key)
    }

    /// Canonical id for a stored listing. Aggregator names are resolved to
    /// a sub-brand from the affiliate URL host when one matches.
    pub fn normalize_source(&self, asp_name: &str, affiliate_url: &str) -> String {
        let canonical = self.normalize(asp_name);
        if !self.registry.is_aggregator(&canonical) {
            return canonical;
        }
        let Some(host) = url_host(affiliate_url) else {
            return canonical;
        };
        let sub_brand = self
            .registry
            .sub_brands(&canonical)
            .find(|e| e.url_domains.iter().any(|d| host_matches(&host, d)))
            .map(|e| e.id.clone());
        sub_brand.unwrap_or(canonical)
    }

    pub fn canonical_of(&self, listing: &SourceListing) -> String {
        self.normalize_source(&listing.asp_name, &listing.affiliate_url)
    }

    /// Whether `canonical` names a provider in the table.
    pub fn is_known(&self, canonical: &str) -> bool {
        self.registry.get(canonical).is_some()
    }

    /// Whether some raw name folds onto a different provider than `canonical`,
    /// so no listing can ever normalize to it.
    pub fn is_shadowed(&self, canonical: &str) -> bool {
        self.by_raw
            .get(canonical)
            .is_some_and(|owner| owner != canonical)
    }

    /// Folded raw names that normalize to `canonical` without URL help.
    pub fn raw_keys(&self, canonical: &str) -> Vec<String> {
        match self.registry.get(canonical) {
            Some(entry) => entry
                .keys()
                .into_iter()
                .filter(|k| self.by_raw.get(k).map(String::as_str) == Some(canonical))
                .collect(),
            None if self.is_shadowed(canonical) => Vec::new(),
            None => vec![canonical.to_string()],
        }
    }

    pub fn entry(&self, canonical: &str) -> Option<&ProviderEntry> {
        self.registry.get(canonical)
    }

    pub fn display_label<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.registry.label(canonical).unwrap_or(canonical)
    }
}

/// Host of an affiliate URL. Scheme-less (`www.1pondo.tv/...`) and
/// protocol-relative (`//www.1pondo.tv/...`) links are read as https.
fn url_host(affiliate_url: &str) -> Option<String> {
    let raw = affiliate_url.trim();
    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => {
            let bare = raw.strip_prefix("//").unwrap_or(raw);
            Url::parse(&format!("https://{bare}")).ok()?
        }
        Err(_) => return None,
    };
    parsed.host_str().map(|h| h.to_ascii_lowercase())
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|head| head.ends_with('.'))
}
