use std::collections::HashMap;

use catalog_core::SiteMode;

use crate::types::ProductListing;

const TITLE_SYMBOLS: &[char] = &[
    '！', '!', '？', '?', '「', '」', '『', '』', '【', '】', '（', '）', '(', ')', '＆', '&', '～',
    '~', '・', ':', '：', ',', '，', '。', '.', '、',
];

/// Grouping key for title dedup: whitespace (half- and full-width) and
/// [`TITLE_SYMBOLS`] removed, then lowercased.
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| !c.is_whitespace() && !TITLE_SYMBOLS.contains(c))
        .collect::<String>()
        .to_lowercase()
}

/// Titles sharing one key within a batch, as input indexes in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupGroup {
    pub key: String,
    pub members: Vec<usize>,
}

/// Partition `listings` by [`normalize_title`]. Groups come out in order of
/// first appearance. Symbol-only titles share the empty key.
pub fn group_by_title(listings: &[ProductListing]) -> Vec<DedupGroup> {
    let mut groups: Vec<DedupGroup> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for (idx, listing) in listings.iter().enumerate() {
        let key = normalize_title(&listing.title);
        match by_key.get(&key) {
            Some(&g) => groups[g].members.push(idx),
            None => {
                by_key.insert(key.clone(), groups.len());
                groups.push(DedupGroup { key, members: vec![idx] });
            }
        }
    }
    groups
}

fn price_rank(listing: &ProductListing) -> (bool, i64) {
    match listing.effective_price() {
        Some(price) => (false, price),
        None => (true, 0),
    }
}

/// Collapse listings of one title into the cheapest one.
///
/// Within a group the winner is the lowest effective price; ties go to the
/// earlier input. In `all` mode the winner carries the other members as
/// alternative sources; in `single-brand-only` they are dropped. Winners keep
/// the input order. Single-member groups pass through untouched.
pub fn dedupe(listings: Vec<ProductListing>, mode: SiteMode) -> Vec<ProductListing> {
    let groups = group_by_title(&listings);
    let mut slots: Vec<Option<ProductListing>> = listings.into_iter().map(Some).collect();
    let mut winners: Vec<(usize, ProductListing)> = Vec::with_capacity(groups.len());

    for group in groups {
        let mut members: Vec<(usize, ProductListing)> = group
            .members
            .iter()
            .filter_map(|&idx| slots[idx].take().map(|l| (idx, l)))
            .collect();

        if members.len() == 1 {
            winners.extend(members);
            continue;
        }

        // Stable: equal prices keep input order.
        members.sort_by_key(|(_, l)| price_rank(l));

        let mut rest = members.into_iter();
        let Some((idx, mut winner)) = rest.next() else {
            continue;
        };
        winner.alternative_sources = match mode {
            SiteMode::All => Some(rest.map(|(_, l)| l.as_alternative()).collect()),
            SiteMode::SingleBrandOnly => None,
        };
        winners.push((idx, winner));
    }

    winners.sort_by_key(|(idx, _)| *idx);
    winners.into_iter().map(|(_, l)| l).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AlternativeSource;

    fn listing(id: i64, title: &str, price: Option<i64>, sale: Option<i64>, asp: &str) -> ProductListing {
        ProductListing::new(id, title)
            .with_price(price, sale)
            .with_provider(asp)
    }

    #[test]
    fn title_key_ignores_symbols_whitespace_and_case() {
        assert_eq!(normalize_title("俺の嫁！"), normalize_title("俺の嫁"));
        assert_eq!(normalize_title("A  B"), normalize_title("a b"));
        assert_eq!(normalize_title("【独占】Ｔitle　(2)"), "独占ｔitle2");
        assert_eq!(normalize_title("!!!"), "");
    }

    #[test]
    fn groups_follow_first_appearance() {
        let batch = vec![
            listing(1, "Beta", None, None, "a"),
            listing(2, "Alpha", None, None, "a"),
            listing(3, "beta!", None, None, "b"),
        ];
        let groups = group_by_title(&batch);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec![0, 2]);
        assert_eq!(groups[1].members, vec![1]);
    }

    #[test]
    fn symbol_only_titles_collapse() {
        let batch = vec![
            listing(1, "！！", Some(500), None, "a"),
            listing(2, "？", Some(100), None, "b"),
        ];
        let out = dedupe(batch, SiteMode::All);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 2);
        assert_eq!(out[0].alternative_sources.as_ref().unwrap()[0].product_id, 1);
    }

    #[test]
    fn cheapest_effective_price_wins_with_alternatives() {
        let batch = vec![
            listing(1, "Same", Some(1000), None, "A"),
            listing(2, "Same", Some(1500), Some(800), "B"),
        ];
        let out = dedupe(batch, SiteMode::All);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 2);
        assert_eq!(
            out[0].alternative_sources,
            Some(vec![AlternativeSource {
                asp_name: "A".into(),
                price: Some(1000),
                sale_price: None,
                affiliate_url: String::new(),
                product_id: 1,
            }])
        );
    }

    #[test]
    fn single_brand_mode_drops_alternatives() {
        let batch = vec![
            listing(1, "Same", Some(1000), None, "A"),
            listing(2, "Same", Some(1500), Some(800), "B"),
        ];
        let out = dedupe(batch, SiteMode::SingleBrandOnly);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 2);
        assert!(out[0].alternative_sources.is_none());
    }

    #[test]
    fn ties_go_to_first_seen() {
        let batch = vec![
            listing(5, "Tie", Some(1000), None, "A"),
            listing(3, "Tie", Some(1000), None, "B"),
        ];
        let out = dedupe(batch, SiteMode::All);
        assert_eq!(out[0].id, 5);
        assert_eq!(out[0].alternative_sources.as_ref().unwrap()[0].product_id, 3);
    }

    #[test]
    fn unpriced_listings_lose() {
        let batch = vec![
            listing(1, "T", None, None, "A"),
            listing(2, "T", Some(99_999), None, "B"),
        ];
        let out = dedupe(batch, SiteMode::All);
        assert_eq!(out[0].id, 2);
    }

    #[test]
    fn missing_provider_becomes_unknown() {
        let batch = vec![
            ProductListing::new(1, "T").with_price(Some(10), None),
            ProductListing::new(2, "T").with_price(Some(20), None),
        ];
        let out = dedupe(batch, SiteMode::All);
        let alt = &out[0].alternative_sources.as_ref().unwrap()[0];
        assert_eq!(alt.asp_name, "unknown");
        assert_eq!(alt.affiliate_url, "");
    }

    #[test]
    fn winners_keep_input_order() {
        let batch = vec![
            listing(1, "Gamma", Some(500), None, "A"),
            listing(2, "Alpha", Some(900), None, "A"),
            listing(3, "Alpha", Some(100), None, "B"),
            listing(4, "Beta", None, None, "A"),
        ];
        let ids: Vec<_> = dedupe(batch, SiteMode::All).iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let batch = vec![
            listing(1, "X", Some(300), None, "A"),
            listing(2, "x!", Some(200), None, "B"),
            listing(3, "Y", None, None, "C"),
            listing(4, "X", None, Some(200), "D"),
            listing(5, "Z", Some(1), None, "E"),
        ];
        for mode in [SiteMode::All, SiteMode::SingleBrandOnly] {
            let once = dedupe(batch.clone(), mode);
            let twice = dedupe(once.clone(), mode);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn exact_duplicate_scrape_keeps_second_as_alternative() {
        let batch = vec![
            listing(1, "Dup", Some(500), None, "A"),
            listing(1, "Dup", Some(500), None, "A"),
        ];
        let out = dedupe(batch, SiteMode::All);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].alternative_sources.as_ref().unwrap().len(), 1);
    }
}
