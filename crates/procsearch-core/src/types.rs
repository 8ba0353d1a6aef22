//! Domain types shared by the normalization, scoring, and fusion engines.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Three views of one free-text field.
///
/// - `original`: the text as supplied by the source, trimmed
/// - `normalized`: canonical vocabulary applied (brands, colors, units)
/// - `searchable`: lowercase projection of `normalized` keeping only word
///   characters and Hangul, single-space separated
///
/// `searchable` is always derived from `normalized`; re-deriving it from the
/// same `normalized` value is idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedText {
    pub original: String,
    pub normalized: String,
    pub searchable: String,
}

/// Monetary amount attached to a listing. Amounts are compared only by
/// ratio during duplicate detection, never summed, so `f64` is sufficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
    pub vat_included: bool,
}

impl Price {
    pub fn krw(amount: f64) -> Self {
        Self { amount, currency: "KRW".to_string(), vat_included: true }
    }
}

/// One retrievable unit aggregated from a source (public-bid announcement,
/// commerce catalog item). Owned by the caller; the engine only reads it.
///
/// `metadata` is the escape hatch for genuinely source-specific fields
/// (announcement numbers, vendor URLs); everything queryable lives in the
/// typed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub source: String,
    pub name: NormalizedText,
    pub price: Price,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub specifications: HashMap<String, String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Which embedding strategy produced a vector or snapshot.
///
/// `Degraded` marks the deterministic pseudo-embedding fallback; callers can
/// distinguish degraded rankings from full-fidelity ones through this flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fidelity {
    Full,
    Degraded,
}

/// One ranked retrieval result. `index` points into the corpus the snapshot
/// was built from; `rank` is dense and 1-based, ordered by `fused_score`
/// descending with ties broken by corpus index ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredHit {
    pub index: usize,
    pub keyword_score: f32,
    pub semantic_score: f32,
    pub fused_score: f32,
    pub rank: usize,
}

/// Indices of listings judged to denote the same real-world item.
/// The first member is the retained canonical record; only groups with two
/// or more members are ever emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub members: Vec<usize>,
}

impl DuplicateGroup {
    pub fn canonical(&self) -> usize {
        self.members[0]
    }
}

/// Vocabulary a normalization rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Colors,
    Brands,
    Units,
}

impl RuleCategory {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Colors => "colors",
            Self::Brands => "brands",
            Self::Units => "units",
        }
    }

    pub fn all() -> &'static [RuleCategory] {
        &[Self::Colors, Self::Brands, Self::Units]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "colors" => Some(Self::Colors),
            "brands" => Some(Self::Brands),
            "units" => Some(Self::Units),
            _ => None,
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps spelling/language/unit variants to one canonical term.
///
/// Within a category standard terms are unique and a variant string belongs
/// to at most one rule; rules are only ever appended to, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationRule {
    pub standard_term: String,
    pub variants: Vec<String>,
    pub category: RuleCategory,
    pub confidence: f32,
}

/// The full learned rule set, keyed by category.
pub type RuleTable = HashMap<RuleCategory, Vec<NormalizationRule>>;
