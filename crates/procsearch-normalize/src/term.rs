//! Canonical-term normalization.
//!
//! Exact rule matches come first and never touch the embedding capability;
//! unknown terms fall back to cosine similarity against every known variant
//! in the category. The fallback degrades to a no-op when the capability is
//! unreachable, so normalization never fails a caller outright — only rule
//! persistence does.

use std::sync::{Arc, RwLock};

use anyhow::Result;
use procsearch_core::error::Error;
use procsearch_core::traits::{EmbeddingProvider, RuleStore};
use procsearch_core::types::{NormalizationRule, RuleCategory, RuleTable};

use crate::defaults::default_rules;

/// One candidate mapping for operator review; `suggest` output.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub standard_term: String,
    pub matched_variant: String,
    pub similarity: f32,
}

pub struct TermNormalizer {
    rules: RwLock<RuleTable>,
    store: Box<dyn RuleStore>,
    provider: Arc<dyn EmbeddingProvider>,
    threshold: f32,
}

impl TermNormalizer {
    /// Loads the persisted rule table, or seeds and persists the built-in
    /// defaults on first run.
    pub fn new(
        store: Box<dyn RuleStore>,
        provider: Arc<dyn EmbeddingProvider>,
        threshold: f32,
    ) -> Result<Self> {
        let rules = match store.load().map_err(|e| Error::RuleStore(e.to_string()))? {
            Some(table) => table,
            None => {
                let table = default_rules();
                store.save(&table).map_err(|e| Error::RuleStore(e.to_string()))?;
                tracing::info!("rule store empty, seeded built-in defaults");
                table
            }
        };
        Ok(Self { rules: RwLock::new(rules), store, provider, threshold })
    }

    /// Maps `term` to its canonical form, or returns it unchanged.
    pub async fn normalize(&self, term: &str, category: RuleCategory) -> String {
        if term.trim().is_empty() {
            return term.to_string();
        }
        if let Some(standard) = self.exact_match(term, category) {
            return standard;
        }
        match self.best_embedding_match(term, category).await {
            Ok(Some(suggestion)) => suggestion.standard_term,
            Ok(None) => term.to_string(),
            Err(err) => {
                tracing::warn!(%term, %category, error = %err, "embedding fallback unavailable, term kept as-is");
                term.to_string()
            }
        }
    }

    /// Rule-table lookup only: standard terms and listed variants.
    pub fn exact_match(&self, term: &str, category: RuleCategory) -> Option<String> {
        let rules = self.rules.read().unwrap_or_else(|e| e.into_inner());
        let list = rules.get(&category)?;
        for rule in list {
            if rule.standard_term == term || rule.variants.iter().any(|v| v == term) {
                return Some(rule.standard_term.clone());
            }
        }
        None
    }

    /// Up to 3 candidate mappings above the similarity threshold, best first.
    /// Read-only; never mutates the rule table.
    pub async fn suggest(&self, term: &str, category: RuleCategory) -> Result<Vec<Suggestion>> {
        let mut matches = self.embedding_matches(term, category).await?;
        matches.sort_by(|a, b| {
            b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
        });
        // One entry per standard term, keeping its best-matching variant.
        let mut seen = std::collections::HashSet::new();
        matches.retain(|s| seen.insert(s.standard_term.clone()));
        matches.truncate(3);
        Ok(matches)
    }

    /// Appends `variant` to the rule for `standard_term`, creating the rule
    /// when absent, and persists the full table.
    ///
    /// A variant already owned by a different rule in the same category is
    /// ignored (first mapping wins — a variant must stay unambiguous).
    /// Re-adding a known variant is a no-op that skips persistence.
    pub fn add_variant(
        &self,
        standard_term: &str,
        variant: &str,
        category: RuleCategory,
        confidence: f32,
    ) -> Result<()> {
        let mut rules = self.rules.write().unwrap_or_else(|e| e.into_inner());
        let list = rules.entry(category).or_default();

        if let Some(owner) = list.iter().find(|r| {
            r.standard_term != standard_term
                && (r.standard_term == variant || r.variants.iter().any(|v| v == variant))
        }) {
            tracing::debug!(
                %variant,
                requested = %standard_term,
                owner = %owner.standard_term,
                "variant already mapped, keeping first mapping"
            );
            return Ok(());
        }

        if let Some(rule) = list.iter_mut().find(|r| r.standard_term == standard_term) {
            if rule.standard_term == variant || rule.variants.iter().any(|v| v == variant) {
                return Ok(());
            }
            rule.variants.push(variant.to_string());
            tracing::info!(%variant, standard = %standard_term, %category, "variant appended");
        } else {
            list.push(NormalizationRule {
                standard_term: standard_term.to_string(),
                variants: vec![variant.to_string()],
                category,
                confidence,
            });
            tracing::info!(%variant, standard = %standard_term, %category, "rule created");
        }

        self.store.save(&rules).map_err(|e| Error::RuleStore(e.to_string()).into())
    }

    async fn best_embedding_match(
        &self,
        term: &str,
        category: RuleCategory,
    ) -> Result<Option<Suggestion>> {
        let matches = self.embedding_matches(term, category).await?;
        Ok(matches.into_iter().max_by(|a, b| {
            a.similarity.partial_cmp(&b.similarity).unwrap_or(std::cmp::Ordering::Equal)
        }))
    }

    /// All category candidates scoring at or above the threshold.
    async fn embedding_matches(&self, term: &str, category: RuleCategory) -> Result<Vec<Suggestion>> {
        // Candidate texts are collected under the read lock, then the lock is
        // released before suspending on the encode call.
        let candidates: Vec<(String, String)> = {
            let rules = self.rules.read().unwrap_or_else(|e| e.into_inner());
            let Some(list) = rules.get(&category) else {
                return Ok(Vec::new());
            };
            list.iter()
                .flat_map(|rule| {
                    std::iter::once((rule.standard_term.clone(), rule.standard_term.clone())).chain(
                        rule.variants.iter().map(|v| (v.clone(), rule.standard_term.clone())),
                    )
                })
                .collect()
        };
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut texts: Vec<String> = Vec::with_capacity(candidates.len() + 1);
        texts.push(term.to_string());
        texts.extend(candidates.iter().map(|(text, _)| text.clone()));
        let vectors = self.provider.encode(&texts).await?;
        anyhow::ensure!(vectors.len() == texts.len(), "provider returned wrong row count");

        let query = &vectors[0];
        let mut matches = Vec::new();
        for (i, (text, standard)) in candidates.iter().enumerate() {
            let similarity = dot(query, &vectors[i + 1]);
            if similarity >= self.threshold {
                matches.push(Suggestion {
                    standard_term: standard.clone(),
                    matched_variant: text.clone(),
                    similarity,
                });
            }
        }
        Ok(matches)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRuleStore;
    use async_trait::async_trait;
    use procsearch_core::types::Fidelity;
    use std::collections::HashMap;

    /// Provider answering from a fixed text -> vector map; unknown texts get
    /// an all-zero vector (similar to nothing).
    struct StaticProvider {
        vectors: HashMap<String, Vec<f32>>,
    }

    impl StaticProvider {
        fn empty() -> Self {
            Self { vectors: HashMap::new() }
        }

        fn with(pairs: &[(&str, [f32; 2])]) -> Self {
            let vectors =
                pairs.iter().map(|(t, v)| ((*t).to_string(), v.to_vec())).collect();
            Self { vectors }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for StaticProvider {
        fn dim(&self) -> usize {
            2
        }

        fn fidelity(&self) -> Fidelity {
            Fidelity::Full
        }

        async fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| self.vectors.get(t).cloned().unwrap_or_else(|| vec![0.0, 0.0]))
                .collect())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        fn dim(&self) -> usize {
            2
        }

        fn fidelity(&self) -> Fidelity {
            Fidelity::Full
        }

        async fn encode(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            anyhow::bail!("embedding capability unreachable")
        }
    }

    fn seeded_normalizer(provider: Arc<dyn EmbeddingProvider>) -> TermNormalizer {
        TermNormalizer::new(Box::new(MemoryRuleStore::new()), provider, 0.8).expect("normalizer")
    }

    #[tokio::test]
    async fn exact_variant_maps_to_standard() {
        let normalizer = seeded_normalizer(Arc::new(StaticProvider::empty()));
        assert_eq!(normalizer.normalize("Samsung", RuleCategory::Brands).await, "삼성");
        assert_eq!(normalizer.normalize("화이트", RuleCategory::Colors).await, "흰색");
    }

    #[tokio::test]
    async fn standard_term_normalizes_to_itself() {
        let normalizer = seeded_normalizer(Arc::new(StaticProvider::empty()));
        assert_eq!(normalizer.normalize("삼성", RuleCategory::Brands).await, "삼성");
    }

    #[tokio::test]
    async fn unknown_term_without_similarity_kept_unchanged() {
        let normalizer = seeded_normalizer(Arc::new(StaticProvider::empty()));
        assert_eq!(normalizer.normalize("책상", RuleCategory::Brands).await, "책상");
    }

    #[tokio::test]
    async fn embedding_fallback_maps_close_term() {
        let provider =
            StaticProvider::with(&[("hwite", [1.0, 0.0]), ("white", [1.0, 0.0])]);
        let normalizer = seeded_normalizer(Arc::new(provider));
        assert_eq!(normalizer.normalize("hwite", RuleCategory::Colors).await, "흰색");
    }

    #[tokio::test]
    async fn below_threshold_similarity_is_not_applied() {
        let provider =
            StaticProvider::with(&[("hwite", [1.0, 0.0]), ("white", [0.5, 0.5])]);
        let normalizer = seeded_normalizer(Arc::new(provider));
        // cosine 0.5 < 0.8 threshold
        assert_eq!(normalizer.normalize("hwite", RuleCategory::Colors).await, "hwite");
    }

    #[tokio::test]
    async fn provider_failure_degrades_fallback_to_no_op() {
        let normalizer = seeded_normalizer(Arc::new(FailingProvider));
        // Exact matching still works.
        assert_eq!(normalizer.normalize("Samsung", RuleCategory::Brands).await, "삼성");
        // Fallback silently keeps the input.
        assert_eq!(normalizer.normalize("Samsungg", RuleCategory::Brands).await, "Samsungg");
    }

    #[tokio::test]
    async fn add_variant_learns_new_mapping() {
        let normalizer = seeded_normalizer(Arc::new(StaticProvider::empty()));
        assert_eq!(normalizer.normalize("SS전자", RuleCategory::Brands).await, "SS전자");
        normalizer.add_variant("삼성", "SS전자", RuleCategory::Brands, 0.8).expect("add");
        assert_eq!(normalizer.normalize("SS전자", RuleCategory::Brands).await, "삼성");
    }

    #[tokio::test]
    async fn add_variant_creates_rule_for_new_standard() {
        let normalizer = seeded_normalizer(Arc::new(StaticProvider::empty()));
        normalizer.add_variant("한성", "HANSUNG", RuleCategory::Brands, 0.8).expect("add");
        assert_eq!(normalizer.normalize("HANSUNG", RuleCategory::Brands).await, "한성");
    }

    #[tokio::test]
    async fn conflicting_variant_keeps_first_mapping() {
        let normalizer = seeded_normalizer(Arc::new(StaticProvider::empty()));
        normalizer.add_variant("엘지", "Samsung", RuleCategory::Brands, 0.8).expect("add");
        assert_eq!(normalizer.normalize("Samsung", RuleCategory::Brands).await, "삼성");
    }

    #[tokio::test]
    async fn persistence_failure_is_a_hard_error_but_memory_rules_survive() {
        let store = Arc::new(MemoryRuleStore::new());
        let normalizer = TermNormalizer::new(
            Box::new(Arc::clone(&store)),
            Arc::new(StaticProvider::empty()),
            0.8,
        )
        .expect("normalizer");

        store.set_fail_saves(true);
        let err = normalizer.add_variant("삼성", "SS전자", RuleCategory::Brands, 0.8);
        assert!(err.is_err());
        // The in-memory table keeps serving exact matches.
        assert_eq!(normalizer.normalize("Samsung", RuleCategory::Brands).await, "삼성");
    }

    #[tokio::test]
    async fn readding_known_variant_skips_persistence() {
        let store = Arc::new(MemoryRuleStore::new());
        let normalizer = TermNormalizer::new(
            Box::new(Arc::clone(&store)),
            Arc::new(StaticProvider::empty()),
            0.8,
        )
        .expect("normalizer");

        store.set_fail_saves(true);
        // "Samsung" is already a variant of 삼성; no save is attempted.
        normalizer.add_variant("삼성", "Samsung", RuleCategory::Brands, 0.8).expect("no-op");
    }

    #[tokio::test]
    async fn suggest_returns_sorted_candidates_without_mutation() {
        let provider = StaticProvider::with(&[
            ("블랙색상", [1.0, 0.0]),
            ("블랙", [0.95, 0.05]),
            ("black", [0.9, 0.1]),
            ("화이트", [0.85, 0.15]),
        ]);
        let normalizer = seeded_normalizer(Arc::new(provider));

        let suggestions =
            normalizer.suggest("블랙색상", RuleCategory::Colors).await.expect("suggest");
        assert!(suggestions.len() <= 3);
        assert_eq!(suggestions[0].standard_term, "검은색");
        for pair in suggestions.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        // Unchanged afterwards: still no exact mapping for the query.
        assert!(normalizer.exact_match("블랙색상", RuleCategory::Colors).is_none());
    }
}
