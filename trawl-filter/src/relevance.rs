//! Relevance scoring of a video against the search term.
//!
//! Hashtags carry 60% of the weight and the description the remaining 40%;
//! both component scores are clamped to `[0, 1]` before combining.

use tracing::debug;

/// Combined relevance verdict with its component scores.
///
/// Stored scores are rounded to three decimals so serialized records stay
/// readable; the threshold comparison runs on the unrounded value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relevance {
    pub score: f64,
    pub hashtag_score: f64,
    pub description_score: f64,
    pub is_relevant: bool,
}

impl Relevance {
    pub fn grade(
        search_term: &str,
        hashtags: &[String],
        description: &str,
        threshold: f64,
    ) -> Self {
        let hashtag_score = hashtag_relevance(search_term, hashtags);
        let description_score = description_relevance(search_term, description);
        let score = hashtag_score * 0.6 + description_score * 0.4;
        let is_relevant = score >= threshold;
        debug!(
            score = round3(score),
            hashtag_score = round3(hashtag_score),
            description_score = round3(description_score),
            is_relevant,
            "relevance.scored"
        );
        Self {
            score: round3(score),
            hashtag_score: round3(hashtag_score),
            description_score: round3(description_score),
            is_relevant,
        }
    }
}

/// Score hashtag overlap with the search term.
///
/// An exact match weighs 2, a hashtag containing the term 1.5, a hashtag
/// contained in the term counts half. The sum is normalized against the best
/// case of every hashtag matching exactly.
pub fn hashtag_relevance(search_term: &str, hashtags: &[String]) -> f64 {
    if hashtags.is_empty() || search_term.is_empty() {
        return 0.0;
    }
    let term = search_term.to_lowercase();
    let term = term.trim();
    let mut matches = 0.0_f64;
    let mut partial = 0.0_f64;
    for hashtag in hashtags {
        let tag = hashtag.to_lowercase();
        let tag = tag.trim();
        if tag == term {
            matches += 2.0;
        } else if tag.contains(term) {
            matches += 1.5;
        } else if term.contains(tag) {
            partial += 1.0;
        }
    }
    let total = matches + partial * 0.5;
    let best = (hashtags.len() * 2) as f64;
    (total / best).min(1.0)
}

/// Score how often the search term's words occur in the description.
///
/// Occurrences are counted as substrings, so "pasta" also matches inside
/// "pastasciutta". Normalized against a tenth of the description's word count
/// with a floor of one, then capped at 1.
pub fn description_relevance(search_term: &str, description: &str) -> f64 {
    if description.is_empty() || search_term.is_empty() {
        return 0.0;
    }
    let term = search_term.to_lowercase();
    let desc = description.to_lowercase();
    let mut matches = 0usize;
    for word in term.trim().split_whitespace() {
        matches += desc.matches(word).count();
    }
    let words = desc.split_whitespace().count();
    if words == 0 {
        return 0.0;
    }
    (matches as f64 / (words as f64 * 0.1).max(1.0)).min(1.0)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
