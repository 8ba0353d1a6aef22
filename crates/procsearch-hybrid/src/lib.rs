#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Hybrid retrieval engine: build-then-query over an immutable snapshot.
//!
//! `index` embeds the corpus and fits the keyword scorer into one
//! [`IndexSnapshot`], then swaps it in as a single assignment — queries never
//! observe a half-built index. `retrieve` blends keyword and semantic scores
//! per [`fuse`]. Embedding is the only suspension point; an unreachable
//! capability downgrades to the deterministic pseudo-embedding instead of
//! failing the pipeline, and the snapshot records that fidelity loss.

pub mod fuse;
pub mod semantic;

use std::sync::{Arc, RwLock};

use procsearch_core::config::Settings;
use procsearch_core::traits::EmbeddingProvider;
use procsearch_core::types::{Fidelity, Listing, ScoredHit};
use procsearch_embed::DeterministicEmbedder;
use procsearch_keyword::Bm25;

pub use fuse::{fuse, min_max_normalize};

/// Everything one query needs, frozen at `index` time. Row `i` of
/// `embeddings` belongs to `listings[i]` for the snapshot's whole lifetime.
pub struct IndexSnapshot {
    pub listings: Vec<Listing>,
    bm25: Bm25,
    embeddings: Vec<Vec<f32>>,
    pub fidelity: Fidelity,
}

pub struct HybridSearchEngine {
    provider: Arc<dyn EmbeddingProvider>,
    settings: Settings,
    snapshot: RwLock<Option<Arc<IndexSnapshot>>>,
}

impl HybridSearchEngine {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, settings: Settings) -> Self {
        Self { provider, settings, snapshot: RwLock::new(None) }
    }

    /// Rebuilds the full index over `listings` and atomically replaces the
    /// served snapshot. Queries running against the previous snapshot keep
    /// their `Arc` and finish undisturbed.
    pub async fn index(&self, listings: &[Listing]) -> anyhow::Result<()> {
        tracing::info!(count = listings.len(), "indexing listings");

        let embed_texts: Vec<String> = listings.iter().map(embedding_text).collect();
        let (embeddings, fidelity) = self.encode_or_degrade(&embed_texts).await;

        let keyword_texts: Vec<String> = listings.iter().map(keyword_text).collect();
        let mut bm25 = Bm25::new(self.settings.k1, self.settings.b);
        bm25.fit(&keyword_texts);

        let snapshot = Arc::new(IndexSnapshot {
            listings: listings.to_vec(),
            bm25,
            embeddings,
            fidelity,
        });

        let mut guard = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(snapshot);
        tracing::info!(count = listings.len(), ?fidelity, "index swapped in");
        Ok(())
    }

    /// Top-`k` listings for `query`, blended by `alpha` (semantic weight).
    /// An engine that has never indexed returns no hits rather than erroring.
    pub async fn retrieve(&self, query: &str, k: usize, alpha: f32) -> Vec<ScoredHit> {
        let Some(snapshot) = self.current_snapshot() else {
            tracing::warn!("retrieve called before any index build");
            return Vec::new();
        };
        if snapshot.listings.is_empty() {
            return Vec::new();
        }

        let (query_rows, _) = self.encode_or_degrade(&[query.to_string()]).await;
        let semantic_scores = query_rows
            .first()
            .map(|qvec| semantic::scores(&snapshot.embeddings, qvec))
            .unwrap_or_else(|| vec![0.0; snapshot.listings.len()]);
        let keyword_scores = snapshot.bm25.scores(query);

        let hits = fuse(&keyword_scores, &semantic_scores, alpha, k);
        tracing::debug!(query, hits = hits.len(), "retrieve complete");
        hits
    }

    /// Convenience wrapper using the configured defaults for `k` and `alpha`.
    pub async fn retrieve_default(&self, query: &str) -> Vec<ScoredHit> {
        self.retrieve(query, self.settings.top_k, self.settings.alpha).await
    }

    pub fn current_snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.snapshot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Fidelity of the snapshot currently being served, if any.
    pub fn snapshot_fidelity(&self) -> Option<Fidelity> {
        self.current_snapshot().map(|s| s.fidelity)
    }

    /// Encodes through the injected provider, downgrading to the
    /// deterministic pseudo-embedding on any failure so that a broken
    /// capability costs ranking quality, not availability.
    async fn encode_or_degrade(&self, texts: &[String]) -> (Vec<Vec<f32>>, Fidelity) {
        match self.provider.encode(texts).await {
            Ok(rows) if rows.len() == texts.len() => (rows, self.provider.fidelity()),
            Ok(rows) => {
                tracing::warn!(
                    expected = texts.len(),
                    got = rows.len(),
                    "provider row count mismatch, degrading to deterministic embeddings"
                );
                (self.degrade(texts), Fidelity::Degraded)
            }
            Err(err) => {
                tracing::warn!(error = %err, "embedding capability unavailable, degrading to deterministic embeddings");
                (self.degrade(texts), Fidelity::Degraded)
            }
        }
    }

    fn degrade(&self, texts: &[String]) -> Vec<Vec<f32>> {
        let embedder = DeterministicEmbedder::new(self.settings.embed_dim);
        texts.iter().map(|t| embedder.embed_one(t)).collect()
    }
}

/// Text fed to the embedding capability for one listing: name, category
/// path, price, the leading specifications, and the party metadata that
/// distinguishes otherwise identical items.
pub fn embedding_text(listing: &Listing) -> String {
    let mut parts = vec![
        format!("제품명: {}", listing.name.normalized),
        format!("카테고리: {}", listing.category.join(" > ")),
        format!("가격: {}원", format_amount(listing.price.amount)),
    ];

    // Key order is fixed so the same listing always embeds the same text.
    let mut specs: Vec<(&String, &String)> = listing.specifications.iter().collect();
    specs.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in specs.into_iter().take(5) {
        if !value.trim().is_empty() {
            parts.push(format!("{key}: {value}"));
        }
    }

    for (label, key) in [("기관", "organization"), ("판매자", "vendor")] {
        if let Some(value) = listing.metadata.get(key).and_then(|v| v.as_str()) {
            if !value.is_empty() {
                parts.push(format!("{label}: {value}"));
            }
        }
    }

    parts.join(" | ")
}

/// Text the keyword scorer indexes for one listing.
pub fn keyword_text(listing: &Listing) -> String {
    let mut parts = vec![listing.name.searchable.clone()];
    parts.extend(listing.category.iter().cloned());
    for (key, value) in &listing.specifications {
        parts.push(key.clone());
        parts.push(value.clone());
    }
    parts.retain(|p| !p.trim().is_empty());
    parts.join(" ")
}

/// Groups the integral part in threes: `450000` -> `450,000`.
fn format_amount(amount: f64) -> String {
    let whole = amount.trunc().abs() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procsearch_core::types::{NormalizedText, Price};

    fn listing(name: &str) -> Listing {
        Listing {
            id: "catalog_1".to_string(),
            source: "catalog".to_string(),
            name: NormalizedText {
                original: name.to_string(),
                normalized: name.to_string(),
                searchable: name.to_lowercase(),
            },
            price: Price::krw(450_000.0),
            category: vec!["사무용품".to_string(), "가구".to_string()],
            specifications: std::collections::HashMap::from([(
                "크기".to_string(),
                "1800x800mm".to_string(),
            )]),
            metadata: std::collections::HashMap::from([(
                "vendor".to_string(),
                serde_json::Value::String("테스트 판매자".to_string()),
            )]),
        }
    }

    #[test]
    fn format_amount_groups_thousands() {
        assert_eq!(format_amount(450_000.0), "450,000");
        assert_eq!(format_amount(1_234_567.0), "1,234,567");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(0.0), "0");
    }

    #[test]
    fn embedding_text_carries_name_category_price() {
        let text = embedding_text(&listing("사무용 책상"));
        assert!(text.contains("제품명: 사무용 책상"));
        assert!(text.contains("카테고리: 사무용품 > 가구"));
        assert!(text.contains("가격: 450,000원"));
        assert!(text.contains("크기: 1800x800mm"));
        assert!(text.contains("판매자: 테스트 판매자"));
    }

    #[test]
    fn keyword_text_joins_searchable_views() {
        let text = keyword_text(&listing("사무용 책상"));
        assert!(text.contains("사무용 책상"));
        assert!(text.contains("가구"));
        assert!(text.contains("1800x800mm"));
    }
}
