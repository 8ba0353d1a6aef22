use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use procsearch_core::config::{Config, Settings};
use procsearch_core::types::{Listing, RuleCategory};
use procsearch_dedup::Deduplicator;
use procsearch_embed::default_provider;
use procsearch_hybrid::HybridSearchEngine;
use procsearch_ingest::SourceIntegrator;
use procsearch_normalize::{JsonRuleStore, TermNormalizer, TextPreprocessor};

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <search|dedupe|rules> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = Settings::from_config(&config);
    settings.validate()?;

    let (cmd, args) = parse_args();
    let runtime = tokio::runtime::Runtime::new()?;
    match cmd.as_str() {
        "search" => {
            let file = args.get(0).cloned().unwrap_or_else(|| usage_exit("search <data.json> \"<query>\" [k] [alpha]"));
            let query = args.get(1).cloned().unwrap_or_else(|| usage_exit("search <data.json> \"<query>\" [k] [alpha]"));
            let k = args.get(2).and_then(|v| v.parse().ok()).unwrap_or(settings.top_k);
            let alpha = args.get(3).and_then(|v| v.parse().ok()).unwrap_or(settings.alpha);
            runtime.block_on(run_search(&settings, Path::new(&file), &query, k, alpha))?;
        }
        "dedupe" => {
            let file = args.get(0).cloned().unwrap_or_else(|| usage_exit("dedupe <data.json>"));
            runtime.block_on(run_dedupe(&settings, Path::new(&file)))?;
        }
        "rules" => {
            runtime.block_on(run_rules(&settings, &args))?;
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn usage_exit(usage: &str) -> ! {
    eprintln!("Usage: procsearch {}", usage);
    std::process::exit(1)
}

fn build_normalizer(settings: &Settings) -> anyhow::Result<Arc<TermNormalizer>> {
    let provider = default_provider(
        None,
        settings.embed_dim,
        Duration::from_millis(settings.embed_timeout_ms),
    );
    let store = JsonRuleStore::new(settings.rules_path.clone());
    Ok(Arc::new(TermNormalizer::new(Box::new(store), provider, settings.similarity_threshold)?))
}

/// Reads `{"bids": [...], "catalog": [...]}` and converts both batches onto
/// the unified listing schema.
async fn load_listings(settings: &Settings, file: &Path) -> anyhow::Result<Vec<Listing>> {
    let raw: Value = serde_json::from_str(&std::fs::read_to_string(file)?)?;
    let bids = raw.get("bids").and_then(Value::as_array).cloned().unwrap_or_default();
    let catalog = raw.get("catalog").and_then(Value::as_array).cloned().unwrap_or_default();

    let normalizer = build_normalizer(settings)?;
    let preprocessor = Arc::new(TextPreprocessor::new(normalizer)?);
    let integrator = SourceIntegrator::new(preprocessor)?;

    let pb = ProgressBar::new((bids.len() + catalog.len()) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} listings {msg}")?
            .progress_chars("#>-"),
    );

    let mut listings = Vec::with_capacity(bids.len() + catalog.len());
    for (i, item) in bids.iter().enumerate() {
        listings.push(integrator.bid_listing(item, i).await);
        pb.inc(1);
    }
    for (i, item) in catalog.iter().enumerate() {
        listings.push(integrator.catalog_listing(item, i).await);
        pb.inc(1);
    }
    pb.finish_with_message("converted");
    Ok(listings)
}

async fn run_search(
    settings: &Settings,
    file: &Path,
    query: &str,
    k: usize,
    alpha: f32,
) -> anyhow::Result<()> {
    let listings = load_listings(settings, file).await?;
    println!("Loaded {} listings from {}", listings.len(), file.display());

    let dedup = Deduplicator::from_settings(settings);
    let (kept, groups) = dedup.dedupe(listings);
    if !groups.is_empty() {
        println!("Collapsed {} duplicate group(s), {} listings remain", groups.len(), kept.len());
    }

    let provider = default_provider(
        None,
        settings.embed_dim,
        Duration::from_millis(settings.embed_timeout_ms),
    );
    let engine = HybridSearchEngine::new(provider, settings.clone());
    engine.index(&kept).await?;

    let hits = engine.retrieve(query, k, alpha).await;
    if hits.is_empty() {
        println!("No results for '{}'", query);
        return Ok(());
    }
    println!("Results for '{}' (alpha={}):", query, alpha);
    for hit in &hits {
        let listing = &kept[hit.index];
        println!(
            "{:>2}. [{:.3}] {} ({}, {}원) kw={:.3} sem={:.3}",
            hit.rank,
            hit.fused_score,
            listing.name.normalized,
            listing.source,
            listing.price.amount,
            hit.keyword_score,
            hit.semantic_score,
        );
    }
    Ok(())
}

async fn run_dedupe(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let listings = load_listings(settings, file).await?;
    let dedup = Deduplicator::from_settings(settings);
    let groups = dedup.find_duplicates(&listings);
    if groups.is_empty() {
        println!("No duplicate groups in {} listings", listings.len());
        return Ok(());
    }
    println!("{} duplicate group(s) in {} listings:", groups.len(), listings.len());
    for (i, group) in groups.iter().enumerate() {
        println!("Group {}:", i + 1);
        for &member in &group.members {
            let listing = &listings[member];
            let marker = if member == group.canonical() { "keep" } else { "drop" };
            println!(
                "  [{}] {} ({}, {}원, id={})",
                marker, listing.name.normalized, listing.source, listing.price.amount, listing.id
            );
        }
    }
    Ok(())
}

async fn run_rules(settings: &Settings, args: &[String]) -> anyhow::Result<()> {
    let normalizer = build_normalizer(settings)?;
    match args.first().map(String::as_str) {
        Some("suggest") => {
            let (term, category) = rules_term_args(&args[1..], "rules suggest <term> <category>");
            let suggestions = normalizer.suggest(&term, category).await?;
            if suggestions.is_empty() {
                println!("No candidates above threshold for '{}'", term);
            }
            for s in suggestions {
                println!("{} -> {} (via '{}', {:.3})", term, s.standard_term, s.matched_variant, s.similarity);
            }
        }
        Some("add") => {
            let standard = args.get(1).cloned().unwrap_or_else(|| usage_exit("rules add <standard> <variant> <category>"));
            let (variant, category) = rules_term_args(&args[2..], "rules add <standard> <variant> <category>");
            normalizer.add_variant(&standard, &variant, category, 0.8)?;
            println!("Saved: {} -> {} ({})", variant, standard, category);
        }
        _ => usage_exit("rules <suggest|add> ..."),
    }
    Ok(())
}

fn rules_term_args(args: &[String], usage: &str) -> (String, RuleCategory) {
    let term = args.get(0).cloned().unwrap_or_else(|| usage_exit(usage));
    let category = args
        .get(1)
        .and_then(|c| RuleCategory::from_name(c))
        .unwrap_or_else(|| usage_exit(usage));
    (term, category)
}
