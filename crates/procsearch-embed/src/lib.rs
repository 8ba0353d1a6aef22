#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Embedding providers.
//!
//! The engine never talks to a model directly; it is handed an
//! [`EmbeddingProvider`]. This crate ships the two strategies the engine
//! needs regardless of deployment: the deterministic pseudo-embedder used as
//! the degraded fallback, and a timeout-bounding wrapper that downgrades a
//! primary provider to that fallback instead of blocking or failing a whole
//! indexing pass.

use std::hash::Hasher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use twox_hash::XxHash64;

use procsearch_core::traits::EmbeddingProvider;
use procsearch_core::types::Fidelity;

/// Deterministic pseudo-embedding.
///
/// Not a semantic model: vectors for distinct texts are near-orthogonal
/// pseudo-random sequences seeded from an XxHash64 of the text, with a few
/// structural features (length, Hangul-character ratio, digit ratio) in the
/// leading slots, L2-normalized. Identical texts always map to identical
/// vectors, which keeps rankings total-order-stable for tests and demos.
/// Always reports [`Fidelity::Degraded`]; never deploy it as a silent
/// stand-in where ranking quality matters.
pub struct DeterministicEmbedder {
    dim: usize,
}

impl DeterministicEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(text.as_bytes());
        let mut state = hasher.finish();

        let mut v: Vec<f32> = (0..self.dim)
            .map(|_| {
                state = splitmix64(state);
                // Map the top 24 bits onto [-1, 1].
                let unit = ((state >> 40) as f32) / ((1u64 << 24) as f32);
                unit * 2.0 - 1.0
            })
            .collect();

        let chars = text.chars().count();
        if chars > 0 && self.dim >= 3 {
            let hangul = text.chars().filter(|c| ('가'..='힣').contains(c)).count();
            let digits = text.chars().filter(char::is_ascii_digit).count();
            v[0] = chars as f32 / 100.0;
            v[1] = hangul as f32 / chars as f32;
            v[2] = digits as f32 / chars as f32;
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for DeterministicEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn fidelity(&self) -> Fidelity {
        Fidelity::Degraded
    }

    async fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Bounds a primary provider with a timeout and downgrades to the
/// deterministic embedder on error or timeout.
///
/// The downgrade is sticky for observability, not for routing: every call
/// still tries the primary first, but once any call has degraded,
/// `fidelity()` reports [`Fidelity::Degraded`] so callers can tell a
/// degraded snapshot from a full-fidelity one.
pub struct FallbackProvider {
    primary: Arc<dyn EmbeddingProvider>,
    fallback: DeterministicEmbedder,
    timeout: Duration,
    degraded: AtomicBool,
}

impl FallbackProvider {
    pub fn new(primary: Arc<dyn EmbeddingProvider>, timeout: Duration) -> Self {
        let fallback = DeterministicEmbedder::new(primary.dim());
        Self { primary, fallback, timeout, degraded: AtomicBool::new(false) }
    }

    pub fn has_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FallbackProvider {
    fn dim(&self) -> usize {
        self.primary.dim()
    }

    fn fidelity(&self) -> Fidelity {
        if self.has_degraded() {
            Fidelity::Degraded
        } else {
            self.primary.fidelity()
        }
    }

    async fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        match tokio::time::timeout(self.timeout, self.primary.encode(texts)).await {
            Ok(Ok(vectors)) if vectors.len() == texts.len() => Ok(vectors),
            Ok(Ok(vectors)) => {
                self.degraded.store(true, Ordering::SeqCst);
                tracing::warn!(
                    expected = texts.len(),
                    got = vectors.len(),
                    "embedding provider returned wrong row count, using deterministic fallback"
                );
                self.fallback.encode(texts).await
            }
            Ok(Err(err)) => {
                self.degraded.store(true, Ordering::SeqCst);
                tracing::warn!(error = %err, "embedding provider failed, using deterministic fallback");
                self.fallback.encode(texts).await
            }
            Err(_) => {
                self.degraded.store(true, Ordering::SeqCst);
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "embedding provider timed out, using deterministic fallback");
                self.fallback.encode(texts).await
            }
        }
    }
}

/// Selects a provider the way deployments configure it: the deterministic
/// embedder when `APP_USE_FAKE_EMBEDDINGS` is set, otherwise whatever
/// primary the caller supplies, wrapped with the timeout fallback.
pub fn default_provider(
    primary: Option<Arc<dyn EmbeddingProvider>>,
    dim: usize,
    timeout: Duration,
) -> Arc<dyn EmbeddingProvider> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    match primary {
        Some(primary) if !use_fake => Arc::new(FallbackProvider::new(primary, timeout)),
        _ => {
            tracing::info!("using deterministic embeddings");
            Arc::new(DeterministicEmbedder::new(dim))
        }
    }
}
