//! Speaking-time estimation for agent utterances
//!
//! The session layer flips the visual indicator to "speaking" when agent
//! audio starts and needs to schedule the transition back to "idle". Synthesis
//! duration is not reported by the channel, so it is estimated from the text
//! at a 180 words-per-minute reading rate.

use std::time::Duration;

/// Fallback delay when the agent turn carried no text.
const EMPTY_TEXT_DELAY_MS: u64 = 2000;

/// Minimum delay applied to any non-empty utterance.
const MIN_DELAY_MS: u64 = 2500;

/// Trailing buffer added on top of the linear estimate.
const TRAILING_BUFFER_MS: u64 = 500;

/// Assumed speaking rate in words per minute.
const WORDS_PER_MINUTE: u64 = 180;

/// Estimate how long the agent will take to speak `text`.
///
/// `None` or empty text yields a fixed 2 s delay. Otherwise the estimate is
/// linear in the whitespace-separated word count, floored at 2.5 s, with a
/// 500 ms trailing buffer.
pub fn estimate_speaking_delay(text: Option<&str>) -> Duration {
    let words = match text {
        Some(t) if !t.trim().is_empty() => t.split_whitespace().count() as u64,
        _ => return Duration::from_millis(EMPTY_TEXT_DELAY_MS),
    };

    let estimated_ms = words * 60_000 / WORDS_PER_MINUTE;
    Duration::from_millis(MIN_DELAY_MS.max(estimated_ms + TRAILING_BUFFER_MS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_text_uses_fixed_delay() {
        assert_eq!(estimate_speaking_delay(None), Duration::from_millis(2000));
        assert_eq!(estimate_speaking_delay(Some("")), Duration::from_millis(2000));
        assert_eq!(estimate_speaking_delay(Some("   ")), Duration::from_millis(2000));
    }

    #[test]
    fn test_short_text_hits_floor() {
        // 3 words -> 1000ms estimate + 500ms buffer, floored to 2500ms
        assert_eq!(
            estimate_speaking_delay(Some("one two three")),
            Duration::from_millis(2500)
        );
    }

    #[test]
    fn test_long_text_scales_linearly() {
        // 180 words at 180 wpm -> 60000ms estimate + 500ms buffer
        let text = vec!["word"; 180].join(" ");
        assert_eq!(
            estimate_speaking_delay(Some(&text)),
            Duration::from_millis(60_500)
        );
    }

    #[test]
    fn test_word_count_ignores_extra_whitespace() {
        assert_eq!(
            estimate_speaking_delay(Some("  one   two\tthree  ")),
            Duration::from_millis(2500)
        );
    }
}
