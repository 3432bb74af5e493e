//! Yes/no confirmation classification for short caller utterances
//!
//! Interprets a transcribed reply to a "is that right?" style question as an
//! affirmative, a negative, or neither. Used by the guided-fill state machine
//! while a staged value is awaiting confirmation.

use once_cell::sync::Lazy;
use regex::Regex;

// Static regexes for confirmation matching
static AFFIRMATIVE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(yes|yep|yeah|correct|right|confirm|sure|y)$").unwrap());

static NEGATIVE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(no|nope|nah|not|incorrect|wrong|change|don't|dont)").unwrap());

/// Outcome of classifying a caller utterance as a confirmation reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Affirmative,
    Negative,
    Ambiguous,
}

/// Whether the utterance reads as a positive confirmation.
///
/// Matches the whole normalized utterance against a small lexicon, or the
/// "that ... right" shape of replies like "that's right".
pub fn is_affirmative(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    if t.is_empty() {
        return false;
    }
    AFFIRMATIVE_REGEX.is_match(&t) || (t.contains("that") && t.contains("right"))
}

/// Whether the utterance reads as a negative confirmation.
///
/// Matches a negative leading word, or an embedded "not right" / "wrong".
pub fn is_negative(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    if t.is_empty() {
        return false;
    }
    NEGATIVE_REGEX.is_match(&t) || t.contains("not right") || t.contains("wrong")
}

/// Classify a caller utterance as a confirmation reply.
///
/// The affirmative predicate is checked first, so a crafted utterance that
/// satisfies both reads as affirmative. Empty input is ambiguous.
pub fn classify(text: &str) -> Confirmation {
    if is_affirmative(text) {
        Confirmation::Affirmative
    } else if is_negative(text) {
        Confirmation::Negative
    } else {
        Confirmation::Ambiguous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_lexicon() {
        for word in ["yes", "yep", "yeah", "correct", "right", "confirm", "sure", "y"] {
            assert_eq!(classify(word), Confirmation::Affirmative, "word: {word}");
        }
    }

    #[test]
    fn test_affirmative_is_whole_utterance_only() {
        // Lexicon words must match the whole utterance
        assert_eq!(classify("yes please go on"), Confirmation::Ambiguous);
        // ...except the "that ... right" heuristic
        assert_eq!(classify("that's right"), Confirmation::Affirmative);
        assert_eq!(classify("yeah that sounds right to me"), Confirmation::Affirmative);
    }

    #[test]
    fn test_negative_prefixes() {
        for phrase in ["no", "nope", "nah", "not quite", "incorrect", "wrong", "change it", "don't", "dont save that"] {
            assert_eq!(classify(phrase), Confirmation::Negative, "phrase: {phrase}");
        }
        assert_eq!(classify("that is not right"), Confirmation::Negative);
        assert_eq!(classify("you got it wrong"), Confirmation::Negative);
    }

    #[test]
    fn test_ambiguous() {
        assert_eq!(classify("maybe"), Confirmation::Ambiguous);
        assert_eq!(classify(""), Confirmation::Ambiguous);
        assert_eq!(classify("   "), Confirmation::Ambiguous);
        assert_eq!(classify("Paris"), Confirmation::Ambiguous);
    }

    #[test]
    fn test_case_and_whitespace_normalization() {
        assert_eq!(classify("  YES  "), Confirmation::Affirmative);
        assert_eq!(classify("Nope"), Confirmation::Negative);
    }

    #[test]
    fn test_affirmative_wins_ties() {
        // Satisfies the "that ... right" affirmative heuristic and contains
        // "wrong"; affirmative is checked first.
        assert_eq!(classify("that was right not wrong"), Confirmation::Affirmative);
    }
}
