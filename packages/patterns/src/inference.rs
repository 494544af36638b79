//! Contextual pattern inference from free text.
//!
//! Scoring sits behind [`PatternInference`] so the keyword heuristic can be
//! replaced without touching clustering or adherence code.

use pattern_discovery_patterns_models::{PatternDefinition, PatternMatch};

/// Scores how strongly a piece of text suggests a pattern.
pub trait PatternInference {
    /// Returns a score in `[0, 1]`; 0 means no evidence.
    fn score(&self, text: &str, pattern: &PatternDefinition) -> f64;
}

/// Share of a pattern's keywords that appear in the text.
///
/// Matching is case-insensitive substring search, so multi-word keywords
/// like "town hall" work as phrases.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordInference;

impl PatternInference for KeywordInference {
    #[allow(clippy::cast_precision_loss)]
    fn score(&self, text: &str, pattern: &PatternDefinition) -> f64 {
        if pattern.keywords.is_empty() {
            return 0.0;
        }
        let haystack = text.to_lowercase();
        let hits = pattern
            .keywords
            .iter()
            .filter(|k| haystack.contains(&k.to_lowercase()))
            .count();
        hits as f64 / pattern.keywords.len() as f64
    }
}

/// Ranks `patterns` for `text`, best first.
///
/// Patterns scoring zero are dropped; ties keep ascending pattern number.
#[must_use]
pub fn rank_patterns(
    text: &str,
    patterns: &[PatternDefinition],
    inference: &dyn PatternInference,
) -> Vec<PatternMatch> {
    let mut matches: Vec<PatternMatch> = patterns
        .iter()
        .map(|p| PatternMatch {
            number: p.number,
            name: p.name.clone(),
            score: inference.score(text, p).clamp(0.0, 1.0),
        })
        .filter(|m| m.score > 0.0)
        .collect();

    matches.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.number.cmp(&b.number)));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::all_patterns;

    struct Fixed(f64);

    impl PatternInference for Fixed {
        fn score(&self, _text: &str, pattern: &PatternDefinition) -> f64 {
            if pattern.number == 37 { self.0 } else { 0.0 }
        }
    }

    #[test]
    fn keyword_share() {
        let pattern = crate::registry::pattern(61).unwrap();
        let total = pattern.keywords.len();
        let score = KeywordInference.score("A small PLAZA with a fountain", &pattern);
        #[allow(clippy::cast_precision_loss)]
        let expected = 2.0 / total as f64;
        assert!((score - expected).abs() < 1e-12, "score {score}");
    }

    #[test]
    fn ranks_best_first_and_drops_zero() {
        let ranked = rank_patterns(
            "The neighborhood block party on our street",
            &all_patterns(),
            &KeywordInference,
        );
        assert!(!ranked.is_empty());
        assert_eq!(ranked[0].number, 14);
        assert!(ranked.iter().all(|m| m.score > 0.0));
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn nothing_matches_unrelated_text() {
        assert!(rank_patterns("zzz", &all_patterns(), &KeywordInference).is_empty());
    }

    #[test]
    fn custom_inference_is_pluggable() {
        let ranked = rank_patterns("anything", &all_patterns(), &Fixed(2.5));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].number, 37);
        assert!((ranked[0].score - 1.0).abs() < f64::EPSILON);
    }
}
