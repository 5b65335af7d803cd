//! Text normalization and string similarity for categorization

use std::collections::HashMap;

/// Lowercase, fold `ё` to `е`, replace anything but Cyrillic/Latin letters,
/// digits and whitespace with a space, and collapse whitespace
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .map(|ch| if ch == 'ё' { 'е' } else { ch })
        .map(|ch| if is_word_char(ch) { ch } else { ' ' })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ('а'..='я').contains(&ch)
}

/// Lowercase and fold `ё` without stripping punctuation (for rule patterns)
pub fn fold_case(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|ch| if ch == 'ё' { 'е' } else { ch })
        .collect()
}

/// Sørensen-Dice coefficient over character bigrams, in [0, 1]
pub fn dice_coefficient(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let a_bigrams = bigrams(a);
    let b_bigrams = bigrams(b);
    if a_bigrams.is_empty() || b_bigrams.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<(char, char), usize> = HashMap::new();
    for bigram in &a_bigrams {
        *counts.entry(*bigram).or_insert(0) += 1;
    }

    let mut shared = 0usize;
    for bigram in &b_bigrams {
        if let Some(count) = counts.get_mut(bigram) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }

    (2 * shared) as f64 / (a_bigrams.len() + b_bigrams.len()) as f64
}

fn bigrams(text: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Containment either way, or bigram similarity at or above `threshold`
pub fn is_similar(a: &str, b: &str, threshold: f64) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(b) || b.contains(a) || dice_coefficient(a, b) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_and_folds() {
        assert_eq!(normalize("  NETFLIX.COM*12345 "), "netflix com 12345");
        assert_eq!(normalize("Ёлка-Палка, кафе!"), "елка палка кафе");
        assert_eq!(normalize("Café"), "caf");
        assert_eq!(normalize("***"), "");
    }

    #[test]
    fn test_fold_case_keeps_punctuation() {
        assert_eq!(fold_case("Netflix.*"), "netflix.*");
        assert_eq!(fold_case("ЁЖ"), "еж");
    }

    #[test]
    fn test_dice_coefficient() {
        assert_eq!(dice_coefficient("netflix", "netflix"), 1.0);
        assert_eq!(dice_coefficient("", "netflix"), 0.0);
        assert_eq!(dice_coefficient("a", "b"), 0.0);
        // 6 shared bigrams out of 6 + 10
        assert!((dice_coefficient("netflix", "netflix com") - 0.75).abs() < 1e-9);
        assert!(dice_coefficient("uber trip", "lyft ride") < 0.3);
    }

    #[test]
    fn test_dice_counts_repeated_bigrams_once_each() {
        // "aaaa" has three "aa" bigrams, "aa" has one
        assert!((dice_coefficient("aaaa", "aa") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_is_similar() {
        assert!(is_similar("starbucks 123", "starbucks", 0.7));
        assert!(is_similar("пятерочка 1234", "пятерочка 1235", 0.7));
        assert!(!is_similar("uber", "", 0.7));
        assert!(!is_similar("netflix", "spotify", 0.7));
    }
}
