//! Product-code rule families.
//!
//! Each family pairs a matcher with a generator. Families are tried in order
//! and every matching family adds its spellings to one accumulating set; a
//! family that does not match adds nothing. New ASP code conventions are
//! supported by appending a family here.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Tag storefront A puts in front of its own 5-digit codes (`FANZA-mide00001`).
pub const BRAND_CODE_TAG: &str = "FANZA";

type Generator = fn(&Captures<'_>, &str, &mut BTreeSet<String>);

pub struct CodeFamily {
    pub name: &'static str,
    pattern: Regex,
    generate: Generator,
    /// Also applied to spellings produced by the other families, not only to
    /// the incoming code.
    pub reapply_to_derived: bool,
}

impl CodeFamily {
    fn new(name: &'static str, pattern: &str, generate: Generator) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            generate,
            reapply_to_derived: false,
        }
    }

    fn reapplied(mut self) -> Self {
        self.reapply_to_derived = true;
        self
    }

    pub fn matches(&self, code: &str) -> bool {
        self.pattern.is_match(code)
    }

    /// Add this family's spellings of `code` to `out`. Returns whether the
    /// family matched.
    pub fn apply(&self, code: &str, out: &mut BTreeSet<String>) -> bool {
        match self.pattern.captures(code) {
            Some(caps) => {
                (self.generate)(&caps, code, out);
                true
            }
            None => false,
        }
    }
}

static FAMILIES: Lazy<Vec<CodeFamily>> = Lazy::new(|| {
    vec![
        CodeFamily::new("identity", r"(?s)^.*$", identity),
        CodeFamily::new("separator", r"[-_]", without_separators),
        CodeFamily::new("letter-digit-boundary", r"^([A-Za-z]+)(\d+)$", letter_digit_boundary),
        CodeFamily::new("standard", r"^([A-Za-z]+)[-_]?(\d+)$", standard),
        CodeFamily::new("storefront-a-5digit", r"^([A-Za-z]+)(\d{5})$", storefront_a).reapplied(),
        CodeFamily::new("numeric-prefix", r"^(\d+)([A-Za-z]+)[-_]?(\d+)$", numeric_prefix),
        CodeFamily::new("ppv-suffix", r"(?i)^(\d+)[-_]?(ppv)[-_]?(\d+)$", ppv_suffix),
        CodeFamily::new("underscore-pair", r"^(\d+)_(\d+)$", digit_pair),
        CodeFamily::new("hyphen-pair", r"^(\d+)-(\d+)$", digit_pair),
    ]
});

/// The ordered family list.
pub fn families() -> &'static [CodeFamily] {
    &FAMILIES
}

fn push_cases(value: &str, out: &mut BTreeSet<String>) {
    out.insert(value.to_string());
    out.insert(value.to_lowercase());
    out.insert(value.to_uppercase());
}

fn identity(_caps: &Captures<'_>, code: &str, out: &mut BTreeSet<String>) {
    push_cases(code, out);
}

fn without_separators(_caps: &Captures<'_>, code: &str, out: &mut BTreeSet<String>) {
    let joined: String = code.chars().filter(|c| !matches!(c, '-' | '_')).collect();
    push_cases(&joined, out);
}

fn letter_digit_boundary(caps: &Captures<'_>, _code: &str, out: &mut BTreeSet<String>) {
    push_cases(&format!("{}-{}", &caps[1], &caps[2]), out);
}

/// Hyphenated and concatenated spellings with unpadded, 3-digit and 5-digit
/// numbers, for the prefix in original, lower and upper case.
fn padded_forms(prefix: &str, digits: &str, out: &mut BTreeSet<String>) {
    let trimmed = digits.trim_start_matches('0');
    let value = if trimmed.is_empty() { "0" } else { trimmed };
    let numbers = [
        value.to_string(),
        format!("{value:0>3}"),
        format!("{value:0>5}"),
    ];

    for p in [prefix.to_string(), prefix.to_lowercase(), prefix.to_uppercase()] {
        for n in &numbers {
            out.insert(format!("{p}-{n}"));
            out.insert(format!("{p}{n}"));
        }
    }
}

fn standard(caps: &Captures<'_>, _code: &str, out: &mut BTreeSet<String>) {
    padded_forms(&caps[1], &caps[2], out);
}

fn storefront_a(caps: &Captures<'_>, code: &str, out: &mut BTreeSet<String>) {
    padded_forms(&caps[1], &caps[2], out);

    let tag_upper = BRAND_CODE_TAG.to_uppercase();
    let tag_lower = BRAND_CODE_TAG.to_lowercase();
    for c in [code.to_string(), code.to_lowercase()] {
        out.insert(format!("{tag_upper}-{c}"));
        out.insert(format!("{tag_lower}-{c}"));
    }
}

fn numeric_prefix(caps: &Captures<'_>, _code: &str, out: &mut BTreeSet<String>) {
    let (lead, letters, number) = (&caps[1], &caps[2], &caps[3]);
    for l in [letters.to_string(), letters.to_lowercase()] {
        out.insert(format!("{lead}{l}-{number}"));
        out.insert(format!("{lead}{l}{number}"));
    }
}

fn ppv_suffix(caps: &Captures<'_>, _code: &str, out: &mut BTreeSet<String>) {
    let (lead, number) = (&caps[1], &caps[3]);
    for ppv in ["PPV", "ppv"] {
        out.insert(format!("{lead}-{ppv}-{number}"));
        out.insert(format!("{lead}{ppv}{number}"));
    }
}

fn digit_pair(caps: &Captures<'_>, _code: &str, out: &mut BTreeSet<String>) {
    let (left, right) = (&caps[1], &caps[2]);
    out.insert(format!("{left}_{right}"));
    out.insert(format!("{left}-{right}"));
    out.insert(format!("{left}{right}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(name: &str) -> &'static CodeFamily {
        families().iter().find(|f| f.name == name).unwrap()
    }

    fn run(name: &str, code: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        family(name).apply(code, &mut out);
        out
    }

    #[test]
    fn identity_matches_everything() {
        assert!(family("identity").matches(""));
        assert!(family("identity").matches("anything at all"));
        let out = run("identity", "AbC");
        assert_eq!(out, BTreeSet::from(["AbC".into(), "abc".into(), "ABC".into()]));
    }

    #[test]
    fn separator_family_needs_a_separator() {
        assert!(!family("separator").matches("ABC123"));
        let out = run("separator", "ab_c-1");
        assert!(out.contains("abc1"));
        assert!(out.contains("ABC1"));
    }

    #[test]
    fn letter_digit_boundary_inserts_hyphen() {
        let out = run("letter-digit-boundary", "ssis123");
        assert!(out.contains("ssis-123"));
        assert!(out.contains("SSIS-123"));
        assert!(!family("letter-digit-boundary").matches("ssis-123"));
    }

    #[test]
    fn standard_family_pads_to_three_and_five_digits() {
        let out = run("standard", "abp_12");
        for expected in ["abp-12", "abp12", "abp-012", "ABP012", "abp00012", "ABP-00012"] {
            assert!(out.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn standard_family_handles_all_zero_numbers() {
        let out = run("standard", "ABC-000");
        assert!(out.contains("ABC-0"));
        assert!(out.contains("ABC-000"));
        assert!(out.contains("ABC00000"));
    }

    #[test]
    fn storefront_a_adds_brand_tagged_forms() {
        let out = run("storefront-a-5digit", "mide00001");
        assert!(out.contains("FANZA-mide00001"));
        assert!(out.contains("fanza-mide00001"));
        assert!(out.contains("MIDE-001"));
        assert!(family("storefront-a-5digit").reapply_to_derived);
    }

    #[test]
    fn numeric_prefix_family_keeps_leading_number() {
        let out = run("numeric-prefix", "259LUXU1234");
        assert!(out.contains("259LUXU-1234"));
        assert!(out.contains("259luxu-1234"));
        assert!(out.contains("259luxu1234"));
    }

    #[test]
    fn ppv_family_is_case_insensitive() {
        assert!(family("ppv-suffix").matches("123ppv456"));
        let out = run("ppv-suffix", "123_PPV456");
        assert!(out.contains("123-PPV-456"));
        assert!(out.contains("123ppv456"));
    }

    #[test]
    fn digit_pairs_swap_separators() {
        let out = run("underscore-pair", "010124_001");
        assert!(out.contains("010124-001"));
        assert!(out.contains("010124001"));
        let out = run("hyphen-pair", "010124-001");
        assert!(out.contains("010124_001"));
    }
}
