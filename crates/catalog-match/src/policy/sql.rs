//! Compiles a [`Rule`] to a parameterized SQL fragment over `products AS p`.
//!
//! Provider membership expands to the raw names each canonical id folds from.
//! Aggregator sub-brands add affiliate URL host patterns. Values always travel
//! as `?` parameters.

use catalog_core::SqlFilter;

use super::rule::{AspSet, Rule};
use crate::provider::AspNormalizer;

const ASP_COLUMN: &str = "LOWER(TRIM(sl.asp_name))";
const URL_COLUMN: &str = "LOWER(sl.affiliate_url)";

const NEVER: &str = "0 = 1";

pub fn compile(rule: &Rule, normalizer: &AspNormalizer) -> SqlFilter {
    match rule {
        Rule::Always => SqlFilter::always(),
        Rule::And(rules) if rules.is_empty() => SqlFilter::always(),
        Rule::And(rules) => join(rules.iter().map(|r| compile(r, normalizer)), "AND"),
        Rule::Or(rules) if rules.is_empty() => never(),
        Rule::Or(rules) => join(rules.iter().map(|r| compile(r, normalizer)), "OR"),
        Rule::Not(inner) => negate(compile(inner, normalizer)),
        Rule::HasSource(set) => {
            let cond = set_condition(set, normalizer);
            SqlFilter::new(
                format!(
                    "EXISTS (SELECT 1 FROM source_listings sl \
                     WHERE sl.product_id = p.id AND ({}))",
                    cond.sql
                ),
                cond.params,
            )
        }
        Rule::Exclusive(provider) => compile(&Rule::expand_exclusive(provider), normalizer),
    }
}

fn never() -> SqlFilter {
    SqlFilter::new(NEVER, Vec::new())
}

fn negate(inner: SqlFilter) -> SqlFilter {
    SqlFilter::new(format!("NOT ({})", inner.sql), inner.params)
}

fn join(parts: impl Iterator<Item = SqlFilter>, op: &str) -> SqlFilter {
    let mut sql = Vec::new();
    let mut params = Vec::new();
    for part in parts {
        sql.push(format!("({})", part.sql));
        params.extend(part.params);
    }
    SqlFilter::new(sql.join(&format!(" {op} ")), params)
}

/// Condition on one `sl` row: its canonical provider is in `set`.
fn set_condition(set: &AspSet, normalizer: &AspNormalizer) -> SqlFilter {
    match set {
        AspSet::Only(ids) if ids.is_empty() => never(),
        AspSet::Only(ids) => join(ids.iter().map(|id| membership(id, normalizer)), "OR"),
        AspSet::Except(ids) if ids.is_empty() => SqlFilter::always(),
        AspSet::Except(ids) => negate(join(ids.iter().map(|id| membership(id, normalizer)), "OR")),
    }
}

/// Condition on one `sl` row: it normalizes to `canonical`.
fn membership(canonical: &str, normalizer: &AspNormalizer) -> SqlFilter {
    let registry = normalizer.registry();
    let direct = name_in(&normalizer.raw_keys(canonical));

    if registry.is_aggregator(canonical) {
        let patterns: Vec<String> = registry
            .sub_brands(canonical)
            .flat_map(|e| e.url_domains.iter())
            .flat_map(|d| host_patterns(d))
            .collect();
        if patterns.is_empty() {
            return direct;
        }
        return SqlFilter::new(
            format!("({}) AND NOT ({})", direct.sql, url_like_any(patterns.len())),
            [direct.params, patterns].concat(),
        );
    }

    let via_aggregator = normalizer
        .entry(canonical)
        .and_then(|e| e.aggregator.as_deref().map(|agg| (agg, &e.url_domains)));
    match via_aggregator {
        Some((aggregator, domains)) if !domains.is_empty() => {
            let parent = name_in(&normalizer.raw_keys(aggregator));
            let patterns: Vec<String> = domains.iter().flat_map(|d| host_patterns(d)).collect();
            SqlFilter::new(
                format!(
                    "({}) OR (({}) AND ({}))",
                    direct.sql,
                    parent.sql,
                    url_like_any(patterns.len())
                ),
                [direct.params, parent.params, patterns].concat(),
            )
        }
        _ => direct,
    }
}

fn name_in(keys: &[String]) -> SqlFilter {
    if keys.is_empty() {
        return never();
    }
    let marks = vec!["?"; keys.len()].join(", ");
    SqlFilter::new(format!("{ASP_COLUMN} IN ({marks})"), keys.to_vec())
}

fn url_like_any(count: usize) -> String {
    vec![format!("{URL_COLUMN} LIKE ?"); count].join(" OR ")
}

/// `LIKE` patterns matching a URL whose host is `domain` or a subdomain of it.
/// The host may follow a scheme, a bare `//`, or open the string.
fn host_patterns(domain: &str) -> Vec<String> {
    let domain = domain.to_ascii_lowercase();
    let mut patterns = Vec::with_capacity(20);
    for lead in ["%://", "//", "", "%."] {
        for tail in ["", "/%", ":%", "?%", "#%"] {
            patterns.push(format!("{lead}{domain}{tail}"));
        }
    }
    patterns
}
