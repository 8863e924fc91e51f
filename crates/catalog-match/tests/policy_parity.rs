use std::collections::BTreeSet;

use catalog_core::{Database, ProductDraft, ProductId, SiteMode, SourceListing, SqlFilter};
use catalog_match::policy::{compile, storefront_rule};
use catalog_match::{AspNormalizer, AspSet, FilterMode, ProviderFilter, Rule, visibility_predicate};

fn listing(product_id: ProductId, asp: &str, url: &str) -> SourceListing {
    SourceListing {
        product_id,
        asp_name: asp.to_string(),
        original_product_id: format!("P-{product_id}"),
        affiliate_url: url.to_string(),
        price: Some(1000),
        sale_price: None,
        is_subscription: false,
        data_source: "fixture".to_string(),
    }
}

/// Each product gets the listed `(asp, url)` sources.
fn fixture() -> Database {
    let products: &[&[(&str, &str)]] = &[
        &[("FANZA", "https://www.dmm.co.jp/a")],
        &[("DMM", "https://www.dmm.co.jp/b"), ("MGS", "https://www.mgstage.com/b")],
        &[("DUGA", "https://duga.jp/c")],
        &[],
        &[("DTI", "https://www.1pondo.tv/movies/1/")],
        &[("DTI", "https://en.caribbeancompr.com/x")],
        &[("DTI", "https://www.dti.ne.jp/x")],
        &[("DTI", "not a url")],
        &[("一本道", "")],
        &[("BrandNew", "https://brandnew.example/")],
        &[("fanza", ""), ("SOKMIL", "https://sokmil.com/")],
        &[("MGStage", ""), ("APEX", "")],
        &[("DTI", "https://heyzo.com/moviepages/1/"), ("FANZA", "")],
        &[("DTI", "//www.1pondo.tv/movies/2/")],
        &[("DTI", "heyzo.com/moviepages/2/")],
        &[("DTI", "en.caribbeancompr.com/y")],
        &[("DTI", "example.com/1pondo.tv")],
    ];

    let db = Database::open_in_memory().unwrap();
    for (i, sources) in products.iter().enumerate() {
        let draft = ProductDraft::new(format!("Product {i}")).with_code(format!("P-{i}"));
        let (id, _) = db.insert_product(&draft).unwrap();
        for (asp, url) in sources.iter() {
            db.upsert_listing(&listing(id, asp, url)).unwrap();
        }
    }
    db
}

fn via_sql(db: &Database, rule: &Rule, normalizer: &AspNormalizer) -> BTreeSet<ProductId> {
    let filter = compile(rule, normalizer);
    db.list_products(&filter, 1000, 0)
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect()
}

fn in_memory(db: &Database, rule: &Rule, normalizer: &AspNormalizer) -> BTreeSet<ProductId> {
    let all = db.list_products(&SqlFilter::always(), 1000, 0).unwrap();
    let ids: Vec<ProductId> = all.iter().map(|p| p.id).collect();
    let sources = db.listings_for_products(&ids).unwrap();
    ids.into_iter()
        .filter(|id| {
            let listed = sources.get(id).cloned().unwrap_or_default();
            rule.evaluate(&listed, normalizer)
        })
        .collect()
}

fn rules(normalizer: &AspNormalizer) -> Vec<Rule> {
    let mut rules = vec![
        visibility_predicate(SiteMode::All, normalizer),
        visibility_predicate(SiteMode::SingleBrandOnly, normalizer),
        Rule::Exclusive("fanza".into()),
        Rule::Exclusive("dti".into()),
        Rule::HasSource(AspSet::except(["fanza", "mgs"])),
        Rule::Or(vec![
            Rule::HasSource(AspSet::only(["heyzo"])),
            Rule::HasSource(AspSet::only(["brandnew"])),
        ]),
    ];
    for provider in [
        "fanza", "mgs", "duga", "sokmil", "dti", "1pondo", "caribbeancompr", "heyzo", "brandnew",
        "dmm", "unseen",
    ] {
        rules.push(Rule::HasSource(AspSet::only([provider])));
        for mode in [SiteMode::All, SiteMode::SingleBrandOnly] {
            for filter in [
                ProviderFilter::include(vec![provider.to_string()]),
                ProviderFilter {
                    providers: vec![provider.to_string()],
                    mode: FilterMode::Exclude,
                },
            ] {
                rules.push(storefront_rule(mode, Some(&filter), normalizer));
            }
        }
    }
    rules
}

#[test]
fn sql_and_in_memory_agree() {
    let db = fixture();
    let normalizer = AspNormalizer::default();
    for rule in rules(&normalizer) {
        assert_eq!(
            via_sql(&db, &rule, &normalizer),
            in_memory(&db, &rule, &normalizer),
            "rule disagreed: {rule:?}"
        );
    }
}

#[test]
fn visibility_matches_expected_products() {
    let db = fixture();
    let normalizer = AspNormalizer::default();

    let general = via_sql(&db, &visibility_predicate(SiteMode::All, &normalizer), &normalizer);
    // product 1 is brand-only
    assert!(!general.contains(&1));
    assert!(general.contains(&2));
    assert!(general.contains(&4));

    let brand = via_sql(
        &db,
        &visibility_predicate(SiteMode::SingleBrandOnly, &normalizer),
        &normalizer,
    );
    assert_eq!(brand, BTreeSet::from([1, 2, 11, 13]));
}

#[test]
fn url_sub_brands_resolve_in_sql() {
    let db = fixture();
    let normalizer = AspNormalizer::default();
    let only = |id: &str| via_sql(&db, &Rule::HasSource(AspSet::only([id])), &normalizer);

    assert_eq!(only("1pondo"), BTreeSet::from([5, 9, 14]));
    assert_eq!(only("caribbeancompr"), BTreeSet::from([6, 16]));
    assert_eq!(only("dti"), BTreeSet::from([7, 8, 17]));
    assert_eq!(only("heyzo"), BTreeSet::from([13, 15]));
    assert_eq!(only("brandnew"), BTreeSet::from([10]));
    assert!(only("dmm").is_empty());
}
