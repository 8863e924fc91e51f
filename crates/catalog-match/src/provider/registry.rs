//! Static provider table: canonical id -> raw ASP names.

use std::collections::BTreeMap;

use serde::Serialize;

/// Canonical id of the single-brand network.
pub const BRAND_PROVIDER: &str = "fanza";

/// One canonical provider and every raw name crawlers emit for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderEntry {
    pub id: String,
    pub label: String,
    pub raw_names: Vec<String>,
    /// Aggregator whose listings name this provider only in the affiliate URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregator: Option<String>,
    /// Affiliate URL hosts that identify this provider under its aggregator.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub url_domains: Vec<String>,
}

impl ProviderEntry {
    fn new(id: &str, label: &str, raw_names: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            raw_names: raw_names.iter().map(|s| s.to_string()).collect(),
            aggregator: None,
            url_domains: Vec::new(),
        }
    }

    fn under(mut self, aggregator: &str, domains: &[&str]) -> Self {
        self.aggregator = Some(aggregator.to_string());
        self.url_domains = domains.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Lowercased lookup keys: the id itself plus every raw name.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = vec![fold(&self.id)];
        for raw in &self.raw_names {
            let key = fold(raw);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

/// Fold a raw name the way SQLite's `LOWER(TRIM(..))` does.
pub fn fold(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn builtin_entries() -> Vec<ProviderEntry> {
    vec![
        ProviderEntry::new("fanza", "FANZA", &["FANZA", "DMM"]),
        ProviderEntry::new("mgs", "MGS動画", &["MGS", "MGStage"]),
        ProviderEntry::new("duga", "DUGA", &["DUGA", "APEX"]),
        ProviderEntry::new("sokmil", "ソクミル", &["SOKMIL", "ソクミル"]),
        ProviderEntry::new("fc2", "FC2", &["FC2"]),
        ProviderEntry::new("b10f", "b10f.jp", &["b10f", "B10F"]),
        ProviderEntry::new("japanska", "Japanska", &["Japanska"]),
        ProviderEntry::new("tokyohot", "Tokyo-Hot", &["Tokyo-Hot", "TOKYO-HOT"]),
        ProviderEntry::new("dti", "DTI", &["DTI"]),
        ProviderEntry::new("caribbeancom", "カリビアンコム", &["カリビアンコム"])
            .under("dti", &["caribbeancom.com"]),
        ProviderEntry::new("caribbeancompr", "カリビアンコムプレミアム", &["カリビアンコムプレミアム"])
            .under("dti", &["caribbeancompr.com"]),
        ProviderEntry::new("1pondo", "一本道", &["一本道"]).under("dti", &["1pondo.tv"]),
        ProviderEntry::new("heyzo", "HEYZO", &["HEYZO"]).under("dti", &["heyzo.com"]),
        ProviderEntry::new("10musume", "天然むすめ", &["天然むすめ"])
            .under("dti", &["10musume.com"]),
        ProviderEntry::new("pacopacomama", "パコパコママ", &["パコパコママ"])
            .under("dti", &["pacopacomama.com"]),
    ]
}

#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    entries: BTreeMap<String, ProviderEntry>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProviderRegistry {
    pub fn builtin() -> Self {
        let entries = builtin_entries()
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();
        Self { entries }
    }

    /// Built-in table with `aliases` (provider id -> extra raw names) merged in.
    /// Unknown provider ids become new entries labelled by their id.
    pub fn with_aliases(aliases: &BTreeMap<String, Vec<String>>) -> Self {
        let mut registry = Self::builtin();
        for (id, names) in aliases {
            let id = fold(id);
            if id.is_empty() {
                continue;
            }
            let entry = registry
                .entries
                .entry(id.clone())
                .or_insert_with(|| ProviderEntry::new(&id, &id, &[]));
            for name in names {
                let name = name.trim();
                if !name.is_empty() && !entry.raw_names.iter().any(|r| r == name) {
                    entry.raw_names.push(name.to_string());
                }
            }
        }
        registry
    }

    pub fn get(&self, id: &str) -> Option<&ProviderEntry> {
        self.entries.get(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ProviderEntry> {
        self.entries.values()
    }

    /// Providers whose listings file under `aggregator` and are told apart by URL.
    pub fn sub_brands<'a>(&'a self, aggregator: &'a str) -> impl Iterator<Item = &'a ProviderEntry> {
        self.entries
            .values()
            .filter(move |e| e.aggregator.as_deref() == Some(aggregator))
    }

    pub fn is_aggregator(&self, id: &str) -> bool {
        self.sub_brands(id).next().is_some()
    }

    pub fn label(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(|e| e.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_contains_brand() {
        let registry = ProviderRegistry::builtin();
        let brand = registry.get(BRAND_PROVIDER).unwrap();
        assert!(brand.raw_names.contains(&"FANZA".to_string()));
        assert_eq!(registry.label("mgs"), Some("MGS動画"));
    }

    #[test]
    fn keys_include_id_and_folded_raw_names() {
        let registry = ProviderRegistry::builtin();
        let keys = registry.get("tokyohot").unwrap().keys();
        assert_eq!(keys, vec!["tokyohot".to_string(), "tokyo-hot".to_string()]);
    }

    #[test]
    fn dti_is_an_aggregator() {
        let registry = ProviderRegistry::builtin();
        assert!(registry.is_aggregator("dti"));
        assert!(!registry.is_aggregator("duga"));
        let subs: Vec<_> = registry.sub_brands("dti").map(|e| e.id.as_str()).collect();
        assert!(subs.contains(&"1pondo"));
        assert!(subs.contains(&"caribbeancompr"));
    }

    #[test]
    fn aliases_extend_and_add_providers() {
        let mut aliases = BTreeMap::new();
        aliases.insert("duga".to_string(), vec!["Duga Legacy".to_string(), "DUGA".to_string()]);
        aliases.insert("NewAsp".to_string(), vec!["NEW-ASP".to_string(), " ".to_string()]);

        let registry = ProviderRegistry::with_aliases(&aliases);
        let duga = registry.get("duga").unwrap();
        assert_eq!(duga.raw_names, vec!["DUGA", "APEX", "Duga Legacy"]);

        let added = registry.get("newasp").unwrap();
        assert_eq!(added.label, "newasp");
        assert_eq!(added.raw_names, vec!["NEW-ASP"]);
        assert_eq!(registry.len(), ProviderRegistry::builtin().len() + 1);
    }
}
