//! Pattern learning and rule suggestion
//!
//! Mines categorized history for recurring description tokens and groups
//! uncategorized descriptions into candidate rules.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{normalize, Categorizer};
use crate::models::{Category, Transaction};

/// Minimum characters for a single token to count as a pattern
const MIN_TOKEN_CHARS: usize = 4;

/// Minimum transactions sharing a key before a rule is suggested
const MIN_GROUP_SIZE: usize = 2;

/// A token or token pair that recurs within one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub pattern: String,
    pub category_id: i64,
    pub occurrences: usize,
}

/// A rule the user could add to cover uncategorized transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedRule {
    pub pattern: String,
    pub category_id: i64,
    pub category_name: String,
    pub confidence: f64,
    /// Uncategorized transactions sharing the pattern
    pub match_count: usize,
}

impl Categorizer {
    /// Recurring (pattern, category) pairs from categorized transactions
    ///
    /// Each transaction contributes every distinct token of at least four
    /// characters plus every adjacent token pair. Pairs seen at least
    /// `pattern_min_occurrences` times are returned, most frequent first.
    pub fn extract_learning_patterns(&self, transactions: &[Transaction]) -> Vec<LearnedPattern> {
        let mut counts: BTreeMap<(String, i64), usize> = BTreeMap::new();

        for tx in transactions {
            let (Some(category_id), Some(description)) = (tx.category_id, &tx.description) else {
                continue;
            };

            for pattern in description_patterns(&normalize(description)) {
                *counts.entry((pattern, category_id)).or_insert(0) += 1;
            }
        }

        let mut patterns: Vec<LearnedPattern> = counts
            .into_iter()
            .filter(|(_, count)| *count >= self.config.pattern_min_occurrences)
            .map(|((pattern, category_id), occurrences)| LearnedPattern {
                pattern,
                category_id,
                occurrences,
            })
            .collect();

        patterns.sort_by(|a, b| {
            b.occurrences
                .cmp(&a.occurrences)
                .then_with(|| a.pattern.cmp(&b.pattern))
                .then_with(|| a.category_id.cmp(&b.category_id))
        });

        debug!(count = patterns.len(), "Extracted learning patterns");
        patterns
    }

    /// Suggest rules for groups of similar uncategorized descriptions
    ///
    /// Descriptions are grouped by their first two significant tokens. A
    /// group of two or more whose key the categorizer can place with enough
    /// confidence becomes a suggestion.
    pub fn suggest_rules(
        &self,
        uncategorized: &[Transaction],
        categories: &[Category],
    ) -> Vec<SuggestedRule> {
        let mut groups: BTreeMap<String, usize> = BTreeMap::new();

        for tx in uncategorized.iter().filter(|tx| tx.category_id.is_none()) {
            let Some(description) = tx.description.as_deref() else {
                continue;
            };
            if let Some(key) = group_key(&normalize(description)) {
                *groups.entry(key).or_insert(0) += 1;
            }
        }

        let mut suggestions: Vec<SuggestedRule> = groups
            .into_iter()
            .filter(|(_, count)| *count >= MIN_GROUP_SIZE)
            .filter_map(|(key, match_count)| {
                let prediction = self.predict(&key, categories, &[], &[])?;
                if prediction.confidence <= self.config.suggestion_min_confidence {
                    return None;
                }
                Some(SuggestedRule {
                    pattern: key,
                    category_id: prediction.category_id,
                    category_name: prediction.category_name,
                    confidence: prediction.confidence,
                    match_count,
                })
            })
            .collect();

        suggestions.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| b.match_count.cmp(&a.match_count))
                .then_with(|| a.pattern.cmp(&b.pattern))
        });

        debug!(count = suggestions.len(), "Suggested rules");
        suggestions
    }
}

/// Distinct long tokens and adjacent token pairs of a normalized description
fn description_patterns(text: &str) -> BTreeSet<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut patterns = BTreeSet::new();

    for token in &tokens {
        if token.chars().count() >= MIN_TOKEN_CHARS {
            patterns.insert(token.to_string());
        }
    }
    for pair in tokens.windows(2) {
        patterns.insert(format!("{} {}", pair[0], pair[1]));
    }

    patterns
}

/// First two tokens longer than three characters, joined by a space
fn group_key(text: &str) -> Option<String> {
    let significant: Vec<&str> = text
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .take(2)
        .collect();

    if significant.is_empty() {
        None
    } else {
        Some(significant.join(" "))
    }
}
