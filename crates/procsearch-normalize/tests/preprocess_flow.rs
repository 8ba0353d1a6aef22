use std::sync::Arc;

use procsearch_core::types::RuleCategory;
use procsearch_embed::DeterministicEmbedder;
use procsearch_normalize::{JsonRuleStore, TermNormalizer, TextPreprocessor};

fn normalizer_at(path: std::path::PathBuf) -> TermNormalizer {
    TermNormalizer::new(
        Box::new(JsonRuleStore::new(path)),
        Arc::new(DeterministicEmbedder::new(64)),
        0.8,
    )
    .expect("normalizer")
}

#[tokio::test]
async fn first_run_seeds_rule_file_with_defaults() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("rules.json");
    let normalizer = normalizer_at(path.clone());

    assert!(path.exists(), "seeding must persist the defaults");
    assert_eq!(normalizer.normalize("화이트", RuleCategory::Colors).await, "흰색");
}

#[tokio::test]
async fn learned_variant_survives_restart() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("rules.json");

    let first = normalizer_at(path.clone());
    first.add_variant("삼성", "SS일렉", RuleCategory::Brands, 0.8).expect("add");
    drop(first);

    let second = normalizer_at(path);
    assert_eq!(second.normalize("SS일렉", RuleCategory::Brands).await, "삼성");
}

#[tokio::test]
async fn process_normalizes_brand_then_color_then_unit() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let normalizer = Arc::new(normalizer_at(tmp.path().join("rules.json")));
    let preprocessor = TextPreprocessor::new(normalizer).expect("preprocessor");

    let result = preprocessor.process("특가 Samsung 모니터 white 500g").await;
    assert_eq!(result.original, "특가 Samsung 모니터 white 500g");
    assert_eq!(result.normalized, "삼성 모니터 흰색 500그램");
    assert_eq!(result.searchable, "삼성 모니터 흰색 500그램");
}

#[tokio::test]
async fn processing_an_already_normalized_string_is_a_no_op() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let normalizer = Arc::new(normalizer_at(tmp.path().join("rules.json")));
    let preprocessor = TextPreprocessor::new(normalizer).expect("preprocessor");

    for text in [
        "특가 Samsung 모니터 white 500g",
        "사무용 책상 1800x800 무료배송",
        "무선 마우스",
        "엘지 모니터 (27형) 2개",
    ] {
        let once = preprocessor.process(text).await;
        let twice = preprocessor.process(&once.normalized).await;
        assert_eq!(twice.normalized, once.normalized, "input: {text}");
        assert_eq!(twice.searchable, once.searchable, "input: {text}");
    }
}

#[tokio::test]
async fn empty_text_yields_empty_views() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let normalizer = Arc::new(normalizer_at(tmp.path().join("rules.json")));
    let preprocessor = TextPreprocessor::new(normalizer).expect("preprocessor");

    let result = preprocessor.process("   ").await;
    assert!(result.original.is_empty());
    assert!(result.normalized.is_empty());
    assert!(result.searchable.is_empty());
}
