#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Cross-source record fusion.
//!
//! Different sources describe the same item with different wording, rounding
//! and metadata; this module clusters listings that denote one real-world
//! item and collapses each cluster to its first-seen member. Clustering is a
//! greedy single pass: each unprocessed listing anchors a group and absorbs
//! every later listing similar *to the anchor*. Members of one group are not
//! re-checked against each other — see the non-transitivity test.

use similar::TextDiff;

use procsearch_core::config::Settings;
use procsearch_core::types::{DuplicateGroup, Listing};

pub struct Deduplicator {
    /// Cheap cutoff before the price/category gates run.
    name_pre_filter: f32,
    /// Final acceptance threshold; stricter than the pre-filter.
    name_threshold: f32,
    /// Lowest tolerated `min/max` price ratio (0.8 = 20% divergence).
    price_ratio_floor: f32,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl Deduplicator {
    pub fn new(name_pre_filter: f32, name_threshold: f32, price_ratio_floor: f32) -> Self {
        Self { name_pre_filter, name_threshold, price_ratio_floor }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.name_pre_filter, settings.name_threshold, settings.price_ratio_floor)
    }

    /// Greedy O(n²) clustering over unprocessed indices. Only groups with at
    /// least two members are returned; groups are disjoint and each group's
    /// first index is the canonical member.
    pub fn find_duplicates(&self, listings: &[Listing]) -> Vec<DuplicateGroup> {
        let mut groups = Vec::new();
        let mut processed = vec![false; listings.len()];

        for i in 0..listings.len() {
            if processed[i] {
                continue;
            }
            let mut members = vec![i];
            for j in (i + 1)..listings.len() {
                if processed[j] {
                    continue;
                }
                if self.are_similar(&listings[i], &listings[j]) {
                    members.push(j);
                    processed[j] = true;
                }
            }
            if members.len() > 1 {
                processed[i] = true;
                groups.push(DuplicateGroup { members });
            }
        }

        tracing::debug!(listings = listings.len(), groups = groups.len(), "duplicate scan complete");
        groups
    }

    /// Collapses every duplicate group to its canonical member, preserving
    /// input order among the kept listings.
    pub fn dedupe(&self, listings: Vec<Listing>) -> (Vec<Listing>, Vec<DuplicateGroup>) {
        let groups = self.find_duplicates(&listings);
        let mut dropped = vec![false; listings.len()];
        for group in &groups {
            for &member in &group.members[1..] {
                dropped[member] = true;
            }
        }
        let kept = listings
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !dropped[*i])
            .map(|(_, listing)| listing)
            .collect();
        (kept, groups)
    }

    /// Symmetric pairwise equivalence test. All gates must hold; a gate whose
    /// inputs are missing (zero price, empty category) is skipped rather
    /// than treated as a mismatch.
    pub fn are_similar(&self, a: &Listing, b: &Listing) -> bool {
        let name_similarity = name_similarity(&a.name.normalized, &b.name.normalized);
        if name_similarity < self.name_pre_filter {
            return false;
        }

        if a.price.amount > 0.0 && b.price.amount > 0.0 {
            let ratio = a.price.amount.min(b.price.amount) / a.price.amount.max(b.price.amount);
            if ratio < f64::from(self.price_ratio_floor) {
                return false;
            }
        }

        if !a.category.is_empty() && !b.category.is_empty() {
            let shared = a.category.iter().any(|token| b.category.contains(token));
            if !shared {
                return false;
            }
        }

        name_similarity >= self.name_threshold
    }
}

/// Character-level diff ratio of the lowercased names, in [0, 1].
/// Empty input on either side counts as wholly dissimilar.
pub fn name_similarity(a: &str, b: &str) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    TextDiff::from_chars(&a, &b).ratio()
}
