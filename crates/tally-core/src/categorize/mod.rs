//! Categorizer - maps free-text descriptions to categories
//!
//! Matching is layered, strongest evidence first:
//! 1. User rules (wildcard patterns, highest priority first)
//! 2. The category's own keywords
//! 3. The global keyword dictionary
//! 4. Historical learning from previously categorized transactions
//! 5. Fuzzy similarity against category names (only when nothing else matched)
//!
//! Every stage contributes candidates; the most confident one wins and the
//! runner-up is reported as an alternative.

pub mod keywords;
pub mod learning;
pub mod text;

use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CategorizerConfig;
use crate::models::{Category, CategoryRule, Transaction};

pub use learning::{LearnedPattern, SuggestedRule};
pub use text::{dice_coefficient, normalize};
use text::{fold_case, is_similar};

/// Which heuristic produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    Rule,
    Keyword,
    Dictionary,
    History,
    Fuzzy,
}

impl PredictionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Keyword => "keyword",
            Self::Dictionary => "dictionary",
            Self::History => "history",
            Self::Fuzzy => "fuzzy",
        }
    }
}

impl std::str::FromStr for PredictionSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "rule" => Ok(Self::Rule),
            "keyword" => Ok(Self::Keyword),
            "dictionary" => Ok(Self::Dictionary),
            "history" => Ok(Self::History),
            "fuzzy" => Ok(Self::Fuzzy),
            _ => Err(format!("Unknown prediction source: {}", s)),
        }
    }
}

impl std::fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runner-up category for a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativePrediction {
    pub category_id: i64,
    pub category_name: String,
    pub confidence: f64,
    pub source: PredictionSource,
}

/// Best category for a description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPrediction {
    pub category_id: i64,
    pub category_name: String,
    /// Self-reported certainty in [0, 1]
    pub confidence: f64,
    pub source: PredictionSource,
    pub alternative: Option<AlternativePrediction>,
}

#[derive(Debug, Clone)]
struct Candidate {
    category_id: i64,
    category_name: String,
    confidence: f64,
    source: PredictionSource,
}

impl Candidate {
    fn new(category: &Category, confidence: f64, source: PredictionSource) -> Self {
        Self {
            category_id: category.id,
            category_name: category.name.clone(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }
}

/// Layered description categorizer
#[derive(Debug, Clone, Default)]
pub struct Categorizer {
    config: CategorizerConfig,
}

impl Categorizer {
    /// Categorizer with the built-in thresholds and dictionary
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CategorizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CategorizerConfig {
        &self.config
    }

    /// Predict the category of a description
    ///
    /// Returns `None` for empty descriptions or when no heuristic matched.
    pub fn predict(
        &self,
        description: &str,
        categories: &[Category],
        history: &[Transaction],
        rules: &[CategoryRule],
    ) -> Option<CategoryPrediction> {
        let text = normalize(description);
        if text.is_empty() {
            return None;
        }

        let mut candidates = Vec::new();

        if let Some(candidate) = self.match_rules(&text, categories, rules) {
            candidates.push(candidate);
        }
        candidates.extend(self.match_category_keywords(&text, categories));
        candidates.extend(self.match_dictionary(&text, categories));
        if let Some(candidate) = self.match_history(&text, categories, history) {
            candidates.push(candidate);
        }

        if candidates.is_empty() {
            if let Some(candidate) = self.match_fuzzy(&text, categories) {
                candidates.push(candidate);
            }
        }

        let prediction = rank(candidates);
        debug!(
            description = %text,
            category = prediction.as_ref().map(|p| p.category_name.as_str()),
            source = prediction.as_ref().map(|p| p.source.as_str()),
            "Categorization complete"
        );
        prediction
    }

    /// Predict every transaction's category, keyed by transaction id
    ///
    /// Transactions without a description or without a prediction are omitted.
    pub fn batch_categorize(
        &self,
        items: &[Transaction],
        categories: &[Category],
        history: &[Transaction],
        rules: &[CategoryRule],
    ) -> BTreeMap<i64, CategoryPrediction> {
        items
            .iter()
            .filter_map(|tx| {
                let description = tx.description.as_deref()?;
                self.predict(description, categories, history, rules)
                    .map(|prediction| (tx.id, prediction))
            })
            .collect()
    }

    /// Rules matching a description, in evaluation order
    pub fn explain_rules<'r>(
        &self,
        description: &str,
        rules: &'r [CategoryRule],
    ) -> Vec<&'r CategoryRule> {
        let text = normalize(description);
        if text.is_empty() {
            return vec![];
        }
        sorted_rules(rules)
            .into_iter()
            .filter(|rule| rule_matches(&text, &rule.pattern))
            .collect()
    }

    fn match_rules(
        &self,
        text: &str,
        categories: &[Category],
        rules: &[CategoryRule],
    ) -> Option<Candidate> {
        for rule in sorted_rules(rules) {
            let Some(category) = categories.iter().find(|c| c.id == rule.category_id) else {
                debug!(rule_id = rule.id, "Skipping rule for unknown category");
                continue;
            };
            if rule_matches(text, &rule.pattern) {
                debug!(rule_id = rule.id, pattern = %rule.pattern, "Rule matched");
                return Some(Candidate::new(
                    category,
                    self.config.rule_confidence,
                    PredictionSource::Rule,
                ));
            }
        }
        None
    }

    fn match_category_keywords(&self, text: &str, categories: &[Category]) -> Vec<Candidate> {
        categories
            .iter()
            .filter(|category| {
                category.keywords.iter().any(|keyword| {
                    let keyword = normalize(keyword);
                    !keyword.is_empty() && text.contains(&keyword)
                })
            })
            .map(|category| {
                Candidate::new(
                    category,
                    self.config.keyword_confidence,
                    PredictionSource::Keyword,
                )
            })
            .collect()
    }

    fn match_dictionary(&self, text: &str, categories: &[Category]) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for group in &self.config.dictionary {
            let hit = group.keywords.iter().any(|keyword| {
                let keyword = normalize(keyword);
                !keyword.is_empty() && text.contains(&keyword)
            });
            if !hit {
                continue;
            }

            let names: Vec<String> = group
                .names
                .iter()
                .map(|name| normalize(name))
                .filter(|name| !name.is_empty())
                .collect();

            for category in categories.iter().filter(|c| c.kind == group.kind) {
                let category_name = normalize(&category.name);
                if names.iter().any(|name| category_name.contains(name.as_str())) {
                    candidates.push(Candidate::new(
                        category,
                        self.config.dictionary_confidence,
                        PredictionSource::Dictionary,
                    ));
                }
            }
        }

        candidates
    }

    fn match_history(
        &self,
        text: &str,
        categories: &[Category],
        history: &[Transaction],
    ) -> Option<Candidate> {
        // (category_id, count) in order of first appearance
        let mut tally: Vec<(i64, usize)> = Vec::new();
        let mut similar_total = 0usize;

        for tx in history {
            let (Some(category_id), Some(description)) = (tx.category_id, &tx.description) else {
                continue;
            };
            let past = normalize(description);
            if !is_similar(text, &past, self.config.history_similarity) {
                continue;
            }

            similar_total += 1;
            match tally.iter_mut().find(|(id, _)| *id == category_id) {
                Some((_, count)) => *count += 1,
                None => tally.push((category_id, 1)),
            }
        }

        let mut winner: Option<(i64, usize)> = None;
        for &(id, count) in &tally {
            if winner.is_none_or(|(_, best)| count > best) {
                winner = Some((id, count));
            }
        }

        let (category_id, count) = winner?;
        if count < self.config.history_min_occurrences {
            return None;
        }
        let category = categories.iter().find(|c| c.id == category_id)?;

        let share = count as f64 / similar_total as f64;
        let confidence = (self.config.history_base_confidence
            + share * self.config.history_confidence_span)
            .min(self.config.history_confidence_cap);

        Some(Candidate::new(category, confidence, PredictionSource::History))
    }

    fn match_fuzzy(&self, text: &str, categories: &[Category]) -> Option<Candidate> {
        let mut best: Option<(&Category, f64)> = None;

        for category in categories {
            let similarity = dice_coefficient(text, &normalize(&category.name));
            if best.is_none_or(|(_, top)| similarity > top) {
                best = Some((category, similarity));
            }
        }

        let (category, similarity) = best?;
        if similarity <= self.config.fuzzy_threshold {
            return None;
        }

        Some(Candidate::new(
            category,
            similarity * self.config.fuzzy_confidence_scale,
            PredictionSource::Fuzzy,
        ))
    }
}

/// Rules by descending priority; equal priorities keep their input order
fn sorted_rules(rules: &[CategoryRule]) -> Vec<&CategoryRule> {
    let mut sorted: Vec<&CategoryRule> = rules.iter().collect();
    sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
    sorted
}

/// Match a wildcard pattern (`*` = any run) against normalized text
///
/// Patterns that do not compile as a regex fall back to substring containment.
pub fn rule_matches(text: &str, pattern: &str) -> bool {
    let folded = fold_case(pattern.trim());
    if folded.is_empty() {
        return false;
    }

    match Regex::new(&folded.replace('*', ".*")) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "Invalid rule pattern, using substring match");
            text.contains(folded.as_str())
        }
    }
}

/// Keep the best candidate per category, most confident first
fn rank(mut candidates: Vec<Candidate>) -> Option<CategoryPrediction> {
    // Stable sort: equal confidences keep stage order
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.category_id));

    let mut iter = candidates.into_iter();
    let top = iter.next()?;
    let alternative = iter.next().map(|c| AlternativePrediction {
        category_id: c.category_id,
        category_name: c.category_name,
        confidence: c.confidence,
        source: c.source,
    });

    Some(CategoryPrediction {
        category_id: top.category_id,
        category_name: top.category_name,
        confidence: top.confidence,
        source: top.source,
        alternative,
    })
}
