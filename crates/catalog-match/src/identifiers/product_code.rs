use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::families::families;

/// ASP names crawlers put in front of a code as a namespace (`DUGA-abc-123`).
///
/// Codes whose prefix is part of the real product number (`FC2-PPV-...`,
/// `HEYZO-1234`) are deliberately absent.
pub const KNOWN_PREFIXES: &[&str] = &[
    "FANZA", "DMM", "MGS", "DUGA", "SOKMIL", "DTI", "B10F", "JAPANSKA",
];

static LIKE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([a-z]+)[-_\s]*(\d+)(.*)$").unwrap());

/// Lowercase and drop hyphens, underscores and whitespace.
pub fn normalize_for_search(code: &str) -> String {
    code.chars()
        .filter(|c| !matches!(c, '-' | '_') && !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Remove a leading `PREFIX-` namespace if it is one of [`KNOWN_PREFIXES`].
pub fn strip_known_prefix(code: &str) -> &str {
    for prefix in KNOWN_PREFIXES {
        let Some(head) = code.get(..prefix.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(prefix) {
            continue;
        }
        if let Some(rest) = code[prefix.len()..].strip_prefix('-') {
            if !rest.is_empty() {
                return rest;
            }
        }
    }
    code
}

/// Every plausible spelling of `code` across the known ASP conventions.
///
/// The families run over the code and its prefix-stripped form. Families
/// flagged `reapply_to_derived` then run once more over the spellings the
/// first pass produced. The set always holds the three case forms of `code`.
pub fn generate_variations(code: &str) -> BTreeSet<String> {
    let mut seeds = vec![code];
    let stripped = strip_known_prefix(code);
    if stripped != code {
        seeds.push(stripped);
    }

    let mut out = BTreeSet::new();
    for seed in &seeds {
        for family in families() {
            family.apply(seed, &mut out);
        }
    }

    let derived: Vec<String> = out
        .iter()
        .filter(|v| !seeds.contains(&v.as_str()))
        .cloned()
        .collect();
    for spelling in &derived {
        for family in families().iter().filter(|f| f.reapply_to_derived) {
            family.apply(spelling, &mut out);
        }
    }

    out
}

pub fn codes_match(a: &str, b: &str) -> bool {
    normalize_for_search(a) == normalize_for_search(b)
}

/// Lowercased code with a `%` between the leading letters and the digits,
/// for `LIKE` lookups: `MIDE-001` becomes `mide%001`.
pub fn to_like_pattern(code: &str) -> String {
    let lower = code.trim().to_lowercase();
    match LIKE_SPLIT.captures(&lower) {
        Some(caps) => format!("{}%{}{}", &caps[1], &caps[2], &caps[3]),
        None => lower,
    }
}
