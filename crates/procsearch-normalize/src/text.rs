//! Whole-field text preprocessing.
//!
//! Produces the three views of a listing name: the trimmed original, a
//! normalized form with canonical brands/colors/units applied, and the
//! lowercase searchable projection the keyword index consumes. The token
//! passes run brand -> color -> unit; the unit pass scans the already
//! normalized text for number+unit spans.

use std::sync::Arc;

use anyhow::Result;
use regex::Regex;

use procsearch_core::types::{NormalizedText, RuleCategory};

use crate::term::TermNormalizer;

/// Marketing boilerplate stripped before any token normalization.
const BOILERPLATE: &[&str] = &["신상품", "특가", "할인", "무료배송", "당일배송", "인기상품"];

pub struct TextPreprocessor {
    normalizer: Arc<TermNormalizer>,
    unit_pattern: Regex,
}

impl TextPreprocessor {
    pub fn new(normalizer: Arc<TermNormalizer>) -> Result<Self> {
        let unit_pattern = Regex::new(r#"(\d+(?:\.\d+)?)\s*([A-Za-z가-힣"']+)"#)?;
        Ok(Self { normalizer, unit_pattern })
    }

    pub async fn process(&self, text: &str) -> NormalizedText {
        if text.trim().is_empty() {
            return NormalizedText::default();
        }
        let original = text.trim().to_string();

        let mut normalized = basic_normalize(&original);
        normalized = self.normalize_tokens(&normalized, RuleCategory::Brands).await;
        normalized = self.normalize_tokens(&normalized, RuleCategory::Colors).await;
        normalized = self.normalize_units(&normalized).await;

        let searchable = searchable_projection(&normalized);
        NormalizedText { original, normalized, searchable }
    }

    /// Replaces each whitespace-delimited token with its canonical form.
    async fn normalize_tokens(&self, text: &str, category: RuleCategory) -> String {
        let mut out: Vec<String> = Vec::new();
        for token in text.split_whitespace() {
            out.push(self.normalizer.normalize(token, category).await);
        }
        out.join(" ")
    }

    /// Rewrites `<number><unit>` spans (with optional inner whitespace) to
    /// `<number><canonical unit>`.
    async fn normalize_units(&self, text: &str) -> String {
        struct UnitSpan {
            start: usize,
            end: usize,
            number: String,
            unit: String,
        }

        let spans: Vec<UnitSpan> = self
            .unit_pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let m = caps.get(0)?;
                Some(UnitSpan {
                    start: m.start(),
                    end: m.end(),
                    number: caps.get(1)?.as_str().to_string(),
                    unit: caps.get(2)?.as_str().to_string(),
                })
            })
            .collect();

        let mut result = String::with_capacity(text.len());
        let mut cursor = 0;
        for span in spans {
            let canonical = self.normalizer.normalize(&span.unit, RuleCategory::Units).await;
            result.push_str(&text[cursor..span.start]);
            if canonical == span.unit {
                result.push_str(&text[span.start..span.end]);
            } else {
                result.push_str(&span.number);
                result.push_str(&canonical);
            }
            cursor = span.end;
        }
        result.push_str(&text[cursor..]);
        result
    }
}

/// Strips characters outside word/Hangul/`-.()`, removes boilerplate tokens,
/// and collapses whitespace runs.
fn basic_normalize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() || matches!(c, '-' | '.' | '(' | ')') {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut cleaned = cleaned;
    for word in BOILERPLATE {
        cleaned = cleaned.replace(word, "");
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase projection keeping only word characters and Hangul.
fn searchable_projection(text: &str) -> String {
    let kept: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
