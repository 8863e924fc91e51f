use catalog_core::SiteMode;
use serde::{Deserialize, Serialize};

use super::rule::{AspSet, Rule};
use crate::provider::AspNormalizer;

/// Which products a storefront in `site_mode` may show.
///
/// `single-brand-only` needs a listing on the brand. `all` hides products
/// listed on the brand and nowhere else; products with no brand listing or
/// with at least one other listing stay visible.
pub fn visibility_predicate(site_mode: SiteMode, normalizer: &AspNormalizer) -> Rule {
    let brand = normalizer.brand();
    match site_mode {
        SiteMode::SingleBrandOnly => Rule::HasSource(AspSet::only([brand])),
        SiteMode::All => Rule::Exclusive(brand.to_string()).negate(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Include,
    Exclude,
}

/// User-selected providers, raw or canonical, to keep or to drop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFilter {
    pub providers: Vec<String>,
    #[serde(default)]
    pub mode: FilterMode,
}

impl ProviderFilter {
    pub fn include(providers: Vec<String>) -> Self {
        Self {
            providers,
            mode: FilterMode::Include,
        }
    }

    pub fn exclude(providers: Vec<String>) -> Self {
        Self {
            providers,
            mode: FilterMode::Exclude,
        }
    }

    pub fn to_rule(&self, normalizer: &AspNormalizer) -> Rule {
        provider_filter_predicate(&self.providers, self.mode, normalizer)
    }
}

/// Include: some listing is on a selected provider. Exclude: none is.
/// An empty selection filters nothing.
pub fn provider_filter_predicate(
    providers: &[String],
    mode: FilterMode,
    normalizer: &AspNormalizer,
) -> Rule {
    let selected: Vec<String> = providers
        .iter()
        .map(|p| normalizer.normalize(p))
        .filter(|p| !p.is_empty())
        .collect();
    if selected.is_empty() {
        return Rule::Always;
    }

    let any = Rule::HasSource(AspSet::only(selected));
    match mode {
        FilterMode::Include => any,
        FilterMode::Exclude => any.negate(),
    }
}

/// Visibility for `site_mode` AND the optional provider filter.
pub fn storefront_rule(
    site_mode: SiteMode,
    filter: Option<&ProviderFilter>,
    normalizer: &AspNormalizer,
) -> Rule {
    let visible = visibility_predicate(site_mode, normalizer);
    match filter {
        Some(filter) => visible.and(filter.to_rule(normalizer)),
        None => visible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn providers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn brand_only_product_visibility() {
        let n = AspNormalizer::default();
        let listed = providers(&["fanza"]);
        assert!(visibility_predicate(SiteMode::SingleBrandOnly, &n).evaluate_canonical(&listed));
        assert!(!visibility_predicate(SiteMode::All, &n).evaluate_canonical(&listed));
    }

    #[test]
    fn shared_product_is_visible_in_both_modes() {
        let n = AspNormalizer::default();
        let listed = providers(&["fanza", "mgs"]);
        assert!(visibility_predicate(SiteMode::SingleBrandOnly, &n).evaluate_canonical(&listed));
        assert!(visibility_predicate(SiteMode::All, &n).evaluate_canonical(&listed));
    }

    #[test]
    fn product_without_brand_listing() {
        let n = AspNormalizer::default();
        let listed = providers(&["duga"]);
        assert!(!visibility_predicate(SiteMode::SingleBrandOnly, &n).evaluate_canonical(&listed));
        assert!(visibility_predicate(SiteMode::All, &n).evaluate_canonical(&listed));
        assert!(visibility_predicate(SiteMode::All, &n).evaluate_canonical(&[]));
    }

    #[test]
    fn provider_filter_normalizes_selection() {
        let n = AspNormalizer::default();
        let rule = provider_filter_predicate(&providers(&["MGStage"]), FilterMode::Include, &n);
        assert_eq!(rule, Rule::HasSource(AspSet::only(["mgs"])));
        assert!(rule.evaluate_canonical(&providers(&["duga", "mgs"])));
    }

    #[test]
    fn exclude_negates_include() {
        let n = AspNormalizer::default();
        let rule = provider_filter_predicate(&providers(&["duga"]), FilterMode::Exclude, &n);
        assert!(!rule.evaluate_canonical(&providers(&["duga", "mgs"])));
        assert!(rule.evaluate_canonical(&providers(&["mgs"])));
    }

    #[test]
    fn empty_selection_is_neutral() {
        let n = AspNormalizer::default();
        assert_eq!(provider_filter_predicate(&[], FilterMode::Exclude, &n), Rule::Always);
        let filter = ProviderFilter::include(Vec::new());
        assert_eq!(
            storefront_rule(SiteMode::SingleBrandOnly, Some(&filter), &n),
            visibility_predicate(SiteMode::SingleBrandOnly, &n)
        );
    }

    #[test]
    fn storefront_rule_combines_visibility_and_filter() {
        let n = AspNormalizer::default();
        let filter = ProviderFilter::exclude(providers(&["sokmil"]));
        let rule = storefront_rule(SiteMode::All, Some(&filter), &n);
        assert!(rule.evaluate_canonical(&providers(&["fanza", "mgs"])));
        assert!(!rule.evaluate_canonical(&providers(&["mgs", "sokmil"])));
        assert!(!rule.evaluate_canonical(&providers(&["fanza"])));
    }
}
