//! Feature Extractor — converts a message into a fixed linguistic feature
//! vector.
//!
//! Seven surface features, each computed by an independent scan of the
//! token stream:
//!  1. keyword density — risk-term tokens per token
//!  2. first-person pronoun ratio
//!  3. negative-sentiment marker count
//!  4. future-tense presence
//!  5. hopelessness marker count
//!  6. question ratio (question sentences / sentences)
//!  7. imperative-language presence
//!
//! Pure function of the content; empty or whitespace-only input yields the
//! all-zero vector.

// ── Marker word lists ───────────────────────────────────────────────────────

const RISK_TERMS: &[&str] = &[
    "die", "dying", "dead", "kill", "suicide", "suicidal", "hurt", "harm",
    "knife", "gun", "pills", "attack",
];

const FIRST_PERSON: &[&str] = &[
    "i", "me", "my", "myself", "mine", "i'm", "i've", "i'll",
];

const NEGATIVE_MARKERS: &[&str] = &[
    "no", "not", "never", "nothing", "nobody", "alone", "empty", "hopeless",
    "worthless", "hate", "can't", "cannot", "sad", "miserable", "numb",
    "broken", "exhausted",
];

const FUTURE_MARKERS: &[&str] = &[
    "will", "going", "gonna", "tomorrow", "tonight", "soon", "plan",
    "planning",
];

const HOPELESSNESS_PHRASES: &[&str] = &[
    "hopeless", "worthless", "pointless", "meaningless", "no point",
    "why bother", "give up", "nothing matters", "no hope", "no future",
];

const QUESTION_WORDS: &[&str] = &["what", "where", "when", "how", "who", "why"];

const IMPERATIVE_VERBS: &[&str] = &[
    "send", "show", "tell", "come", "meet", "give", "let",
];

// ── Feature vector ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FeatureVector {
    pub keyword_density: f64,
    pub first_person_ratio: f64,
    pub negative_marker_count: u32,
    pub future_tense: bool,
    pub hopelessness_count: u32,
    pub question_ratio: f64,
    pub imperative_present: bool,
}

impl FeatureVector {
    /// True when no feature carries any signal.
    pub fn is_zero(&self) -> bool {
        self.keyword_density == 0.0
            && self.first_person_ratio == 0.0
            && self.negative_marker_count == 0
            && !self.future_tense
            && self.hopelessness_count == 0
            && self.question_ratio == 0.0
            && !self.imperative_present
    }
}

// ── Extraction ──────────────────────────────────────────────────────────────

pub fn extract(content: &str) -> FeatureVector {
    let lower = content.to_lowercase();
    let tokens: Vec<&str> = lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .filter(|w| !w.is_empty())
        .collect();

    if tokens.is_empty() {
        return FeatureVector::default();
    }
    let total = tokens.len() as f64;

    let risk_hits = count_in(&tokens, RISK_TERMS);
    let first_person = count_in(&tokens, FIRST_PERSON);
    let negative = count_in(&tokens, NEGATIVE_MARKERS);
    let future = tokens.iter().any(|t| FUTURE_MARKERS.contains(t));
    let imperative = tokens.iter().any(|t| IMPERATIVE_VERBS.contains(t));
    let questions = count_in(&tokens, QUESTION_WORDS);

    // Hopelessness markers include multi-word phrases, so they scan the
    // lowered text rather than the token stream.
    let hopelessness = HOPELESSNESS_PHRASES
        .iter()
        .filter(|p| lower.contains(*p))
        .count() as u32;

    FeatureVector {
        keyword_density: risk_hits as f64 / total,
        first_person_ratio: first_person as f64 / total,
        negative_marker_count: negative,
        future_tense: future,
        hopelessness_count: hopelessness,
        question_ratio: question_ratio(content, questions),
        imperative_present: imperative,
    }
}

fn count_in(tokens: &[&str], family: &[&str]) -> u32 {
    tokens.iter().filter(|t| family.contains(*t)).count() as u32
}

/// Ratio of question sentences to total sentences, falling back to
/// question-word presence when the text has no sentence punctuation.
fn question_ratio(content: &str, question_words: u32) -> f64 {
    let sentences: Vec<&str> = content
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.is_empty() {
        return 0.0;
    }
    let marks = content.matches('?').count();
    if marks > 0 {
        (marks as f64 / sentences.len() as f64).min(1.0)
    } else if question_words > 0 {
        // Interrogative words without a question mark still read as probing.
        0.25
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_zero_vector() {
        assert!(extract("").is_zero());
        assert!(extract("   \n\t ").is_zero());
    }

    #[test]
    fn neutral_text_yields_zero_vector() {
        let features = extract("the weather was pleasant all afternoon");
        assert!(features.is_zero(), "{features:?}");
    }

    #[test]
    fn first_person_ratio_counts_pronouns() {
        let features = extract("I hate myself and my life");
        // "i", "myself", "my" out of 6 tokens
        assert!((features.first_person_ratio - 0.5).abs() < 1e-9);
        assert!(features.negative_marker_count >= 1);
    }

    #[test]
    fn hopelessness_phrases_match_across_words() {
        let features = extract("there is no point, it all feels hopeless");
        assert_eq!(features.hopelessness_count, 2);
    }

    #[test]
    fn question_ratio_uses_sentence_marks() {
        let features = extract("How old are you? Where do you live?");
        assert!((features.question_ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn future_tense_and_imperatives_flagged() {
        let features = extract("send me a photo tonight");
        assert!(features.imperative_present);
        assert!(features.future_tense);
    }
}
