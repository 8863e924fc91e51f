use std::collections::BTreeSet;

use catalog_core::SourceListing;
use serde::{Deserialize, Serialize};

use crate::provider::AspNormalizer;

/// A set of canonical provider ids, either listed or complemented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspSet {
    Only(BTreeSet<String>),
    Except(BTreeSet<String>),
}

impl AspSet {
    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AspSet::Only(ids.into_iter().map(Into::into).collect())
    }

    pub fn except<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AspSet::Except(ids.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, canonical: &str) -> bool {
        match self {
            AspSet::Only(ids) => ids.contains(canonical),
            AspSet::Except(ids) => !ids.contains(canonical),
        }
    }
}

/// Visibility rule over a product's source listings.
///
/// Evaluated in memory by [`Rule::evaluate`] and compiled to SQL by
/// [`crate::policy::compile`]; both read the same tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Always,
    And(Vec<Rule>),
    Or(Vec<Rule>),
    Not(Box<Rule>),
    /// At least one listing whose canonical provider is in the set.
    HasSource(AspSet),
    /// Listed on the provider and nowhere else.
    Exclusive(String),
}

impl Rule {
    pub fn and(self, other: Rule) -> Rule {
        match (self, other) {
            (Rule::Always, r) | (r, Rule::Always) => r,
            (Rule::And(mut left), Rule::And(right)) => {
                left.extend(right);
                Rule::And(left)
            }
            (Rule::And(mut left), r) => {
                left.push(r);
                Rule::And(left)
            }
            (l, r) => Rule::And(vec![l, r]),
        }
    }

    pub fn negate(self) -> Rule {
        match self {
            Rule::Not(inner) => *inner,
            r => Rule::Not(Box::new(r)),
        }
    }

    /// `Exclusive(p)` spelled with the primitive variants.
    pub fn expand_exclusive(provider: &str) -> Rule {
        Rule::And(vec![
            Rule::HasSource(AspSet::only([provider])),
            Rule::Not(Box::new(Rule::HasSource(AspSet::except([provider])))),
        ])
    }

    pub fn evaluate(&self, listings: &[SourceListing], normalizer: &AspNormalizer) -> bool {
        let canonical: Vec<String> = listings.iter().map(|l| normalizer.canonical_of(l)).collect();
        self.evaluate_canonical(&canonical)
    }

    /// Evaluate against listings already reduced to canonical provider ids.
    pub fn evaluate_canonical(&self, providers: &[String]) -> bool {
        match self {
            Rule::Always => true,
            Rule::And(rules) => rules.iter().all(|r| r.evaluate_canonical(providers)),
            Rule::Or(rules) => rules.iter().any(|r| r.evaluate_canonical(providers)),
            Rule::Not(inner) => !inner.evaluate_canonical(providers),
            Rule::HasSource(set) => providers.iter().any(|p| set.contains(p)),
            Rule::Exclusive(provider) => Rule::expand_exclusive(provider).evaluate_canonical(providers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn asp_set_membership() {
        assert!(AspSet::only(["duga"]).contains("duga"));
        assert!(!AspSet::only(["duga"]).contains("mgs"));
        assert!(AspSet::except(["duga"]).contains("mgs"));
        assert!(!AspSet::except(["duga"]).contains("duga"));
    }

    #[test]
    fn exclusive_needs_presence_and_no_others() {
        let rule = Rule::Exclusive("fanza".into());
        assert!(rule.evaluate_canonical(&ids(&["fanza"])));
        assert!(rule.evaluate_canonical(&ids(&["fanza", "fanza"])));
        assert!(!rule.evaluate_canonical(&ids(&["fanza", "mgs"])));
        assert!(!rule.evaluate_canonical(&ids(&["mgs"])));
        assert!(!rule.evaluate_canonical(&[]));
    }

    #[test]
    fn empty_combinators() {
        assert!(Rule::And(vec![]).evaluate_canonical(&[]));
        assert!(!Rule::Or(vec![]).evaluate_canonical(&[]));
    }

    #[test]
    fn and_flattens_and_drops_always() {
        let a = Rule::HasSource(AspSet::only(["a"]));
        let b = Rule::HasSource(AspSet::only(["b"]));
        let c = Rule::HasSource(AspSet::only(["c"]));
        assert_eq!(Rule::Always.and(a.clone()), a);
        assert_eq!(
            a.clone().and(b.clone()).and(c.clone()),
            Rule::And(vec![a, b, c])
        );
    }

    #[test]
    fn double_negation_collapses() {
        let a = Rule::HasSource(AspSet::only(["a"]));
        assert_eq!(a.clone().negate().negate(), a);
    }

    #[test]
    fn evaluate_normalizes_raw_listings() {
        let normalizer = AspNormalizer::default();
        let listing = |asp: &str| SourceListing {
            product_id: 1,
            asp_name: asp.to_string(),
            original_product_id: "x".into(),
            affiliate_url: String::new(),
            price: None,
            sale_price: None,
            is_subscription: false,
            data_source: String::new(),
        };
        let rule = Rule::HasSource(AspSet::only(["fanza"]));
        assert!(rule.evaluate(&[listing("DMM")], &normalizer));
        assert!(!rule.evaluate(&[listing("MGS")], &normalizer));
    }
}
