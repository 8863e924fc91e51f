use std::fs::File;
use std::io::{self, BufReader};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder};

use catalog_core::{CatalogConfig, Database, SiteMode};
use catalog_match::{
    AspNormalizer, Ingestor, ProviderFilter, ProviderRegistry, SelectionOptions, Storefront,
    StorefrontQuery, codes_match, generate_variations, normalize_for_search, to_like_pattern,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "catalog",
    about = "Cross-ASP product catalog: code matching, ingestion and storefront listing",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format. Also enabled by setting CATALOG_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every spelling generated for a product code.
    Variations { code: String },

    /// Check whether two product codes refer to the same product.
    Match { a: String, b: String },

    /// Ingest newline-delimited JSON crawl records ("-" reads stdin).
    Ingest { file: String },

    /// List a storefront page.
    List {
        /// Site mode: all | single-brand-only (defaults to config).
        #[arg(long)]
        mode: Option<SiteMode>,
        /// Provider to filter on; repeatable.
        #[arg(long = "provider", action = clap::ArgAction::Append)]
        providers: Vec<String>,
        /// Drop products listed on the given providers instead of keeping them.
        #[arg(long)]
        exclude: bool,
        /// Preferred provider for the displayed listing; repeatable.
        #[arg(long = "prefer", action = clap::ArgAction::Append)]
        prefer: Vec<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Search products by code.
    Search {
        code: String,
        #[arg(long)]
        mode: Option<SiteMode>,
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show the provider table.
    Providers,

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

// ─── Config Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Print the config file path.
    Path,
    /// Write a default config file if none exists.
    Init,
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();
    init_tracing("warn")?;

    let json_output = cli.json || std::env::var("CATALOG_JSON").as_deref() == Ok("1");

    let mut config = CatalogConfig::load()?;
    if let Ok(db_path) = std::env::var("CATALOG_DATABASE") {
        config.set_database_path(db_path.into());
    }
    let normalizer = AspNormalizer::new(ProviderRegistry::with_aliases(&config.providers.aliases));

    match cli.command {
        Commands::Variations { code } => {
            let variations = generate_variations(&code);
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "code": code,
                        "search_key": normalize_for_search(&code),
                        "like_pattern": to_like_pattern(&code),
                        "variations": variations,
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                for v in &variations {
                    println!("{v}");
                }
            }
        }

        Commands::Match { a, b } => {
            let same = codes_match(&a, &b);
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "a": a, "b": b, "match": same },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if same {
                println!("match: {a} == {b}");
            } else {
                println!("no match: {a} != {b}");
                std::process::exit(1);
            }
        }

        // ── Ingest ─────────────────────────────────────────────────────────

        Commands::Ingest { file } => {
            let db = open_db(&config)?;
            let ingestor = Ingestor::new(&db);
            let summary = if file == "-" {
                ingestor.ingest_jsonl(io::stdin().lock())?
            } else {
                let handle = File::open(&file).with_context(|| format!("cannot open {file}"))?;
                ingestor.ingest_jsonl(BufReader::new(handle))?
            };
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": summary,
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!(
                    "Ingested: {} created, {} matched, {} rejected",
                    summary.created, summary.matched, summary.rejected
                );
            }
        }

        // ── Storefront ─────────────────────────────────────────────────────

        Commands::List {
            mode,
            providers,
            exclude,
            prefer,
            limit,
            offset,
        } => {
            let db = open_db(&config)?;
            let site_mode = mode.unwrap_or(config.storefront.site_mode);
            let preferred = if prefer.is_empty() {
                config.storefront.preferred_providers.clone()
            } else {
                prefer
            };

            let mut query = StorefrontQuery::new(site_mode, limit.unwrap_or(config.storefront.page_size))
                .with_preferred(preferred)
                .with_offset(offset);
            if !providers.is_empty() {
                query = query.with_providers(if exclude {
                    ProviderFilter::exclude(providers)
                } else {
                    ProviderFilter::include(providers)
                });
            }

            let page = Storefront::new(&db, &normalizer).list(&query)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "items": page.items,
                        "total": page.total,
                        "limit": query.limit,
                        "offset": offset,
                        "site_mode": site_mode,
                        "diagnostics": page.diagnostics,
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if page.items.is_empty() {
                println!("No products. Use `catalog ingest` to load crawl records.");
            } else {
                for item in &page.items {
                    let code = item.normalized_product_id.as_deref().unwrap_or("-");
                    let provider = item.provider.as_deref().unwrap_or("unknown");
                    let price = item
                        .effective_price()
                        .map(|p| format!("¥{p}"))
                        .unwrap_or_else(|| "-".to_string());
                    let alts = item.alternative_sources.as_ref().map_or(0, Vec::len);
                    println!(
                        "{id:>6}  {code:<14}  {title:<40}  {label:<12}  {price:>8}  +{alts}",
                        id = item.id,
                        title = item.title,
                        label = normalizer.display_label(provider),
                    );
                }
                println!("{} of {} products", page.items.len(), page.total);
            }
        }

        Commands::Search { code, mode, limit } => {
            let db = open_db(&config)?;
            let options = SelectionOptions::new(mode.unwrap_or(config.storefront.site_mode))
                .with_preferred(config.storefront.preferred_providers.clone());
            let results = Storefront::new(&db, &normalizer).search_code(&code, &options, limit)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": results, "total": results.len(), "query": code },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if results.is_empty() {
                println!("No results for: {code}");
            } else {
                println!("Found {} results:", results.len());
                for item in &results {
                    let provider = item.provider.as_deref().unwrap_or("unknown");
                    println!("  {}  {} [{}]", item.id, item.title, normalizer.display_label(provider));
                }
            }
        }

        Commands::Providers => {
            let entries: Vec<_> = normalizer.registry().entries().collect();
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "brand": normalizer.brand(), "providers": entries },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                for entry in entries {
                    let via = entry
                        .aggregator
                        .as_deref()
                        .map(|a| format!("  (via {a}: {})", entry.url_domains.join(", ")))
                        .unwrap_or_default();
                    println!(
                        "{:<16} {:<24} {}{via}",
                        entry.id,
                        entry.label,
                        entry.raw_names.join(", ")
                    );
                }
            }
        }

        // ── Config ─────────────────────────────────────────────────────────

        Commands::Config { action } => {
            let dur = start.elapsed().as_millis();
            match action {
                ConfigAction::Show => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":config,"meta":{"duration_ms":dur}}))?;
                    } else {
                        print!("{}", config.to_toml_string()?);
                    }
                }
                ConfigAction::Path => {
                    let path = CatalogConfig::config_path();
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":path},"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("{}", path.display());
                    }
                }
                ConfigAction::Init => {
                    let path = CatalogConfig::config_path();
                    let created = !path.exists();
                    if created {
                        CatalogConfig::default().save_to(&path)?;
                    }
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":path,"created":created},"meta":{"duration_ms":dur}}))?;
                    } else if created {
                        println!("Wrote default config to {}", path.display());
                    } else {
                        println!("Config already exists at {}", path.display());
                    }
                }
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn open_db(config: &CatalogConfig) -> Result<Database> {
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Database::open(&db_path)?)
}
