//! Capability seams injected into the engine.
//!
//! Both collaborators are external from the engine's point of view: the
//! embedding capability may live behind a model server, the rule store
//! behind a file or database. Constructor injection keeps the engine free of
//! process-wide singletons and lets tests swap in deterministic fakes.

use crate::types::{Fidelity, RuleTable};
use async_trait::async_trait;

/// Turns texts into fixed-length vectors.
///
/// Rows of the returned matrix are L2-normalized and correspond 1:1 to the
/// input slice. Encoding is the only suspension point in the engine; callers
/// bound it with a timeout and fall back to a degraded provider on failure.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn dim(&self) -> usize;
    /// Which strategy this provider currently answers with.
    fn fidelity(&self) -> Fidelity;
    async fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Durable storage for the learned normalization rules.
///
/// `save` rewrites the full table; writers must not interleave (the
/// normalizer serializes read-modify-write-persist under one lock).
pub trait RuleStore: Send + Sync {
    /// `Ok(None)` means the store has never been written (first run).
    fn load(&self) -> anyhow::Result<Option<RuleTable>>;
    fn save(&self, rules: &RuleTable) -> anyhow::Result<()>;
}

impl<T: RuleStore + ?Sized> RuleStore for std::sync::Arc<T> {
    fn load(&self) -> anyhow::Result<Option<RuleTable>> {
        (**self).load()
    }

    fn save(&self, rules: &RuleTable) -> anyhow::Result<()> {
        (**self).save(rules)
    }
}
