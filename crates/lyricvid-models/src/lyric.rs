//! Timed lyric lines and duration estimation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default tempo assumed when the job supplies none.
pub const DEFAULT_BPM: u32 = 120;

/// Minimum on-screen duration for any scene, in seconds.
pub const MIN_SCENE_DURATION: f64 = 1.0;

/// One time-stamped lyric line from the inbound job payload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LyricLine {
    /// Lyric text rendered as the scene overlay.
    pub text: String,

    /// Start time within the song, in seconds.
    #[serde(default)]
    pub time: f64,

    /// Explicit duration in seconds. Derived from word count and BPM when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Optional mood hint used for background generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

impl LyricLine {
    /// Create a lyric line with only text and a start time.
    pub fn new(text: impl Into<String>, time: f64) -> Self {
        Self {
            text: text.into(),
            time,
            duration: None,
            mood: None,
        }
    }

    /// Number of whitespace-separated words.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Mood hint, defaulting to "neutral".
    pub fn mood_or_default(&self) -> &str {
        self.mood.as_deref().unwrap_or("neutral")
    }

    /// Effective scene duration: the explicit value when present, otherwise
    /// estimated from word count and tempo.
    pub fn effective_duration(&self, bpm: u32) -> f64 {
        match self.duration {
            Some(d) => d,
            None => calculate_duration(&self.text, bpm),
        }
    }
}

/// Estimate how long a lyric line stays on screen.
///
/// Assumes roughly four words per beat: `beats = max(1, words / 4)`,
/// `duration = beats * 60 / bpm`, clamped to at least one second.
pub fn calculate_duration(text: &str, bpm: u32) -> f64 {
    let words = text.split_whitespace().count() as f64;
    let beats = (words / 4.0).max(1.0);
    let seconds_per_beat = 60.0 / bpm.max(1) as f64;
    (beats * seconds_per_beat).max(MIN_SCENE_DURATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_floor() {
        // Two words at 120 bpm: max(1, 0.5) * 0.5 = 0.5, floored to 1.0
        assert_eq!(calculate_duration("hello world", 120), 1.0);
    }

    #[test]
    fn test_duration_scales_with_words() {
        let short = calculate_duration("one two three four", 90);
        let long = calculate_duration("one two three four five six seven eight", 90);
        assert!(long > short);
    }

    #[test]
    fn test_duration_monotonic_in_word_count() {
        let mut text = String::new();
        let mut prev = 0.0;
        for i in 0..20 {
            text.push_str(&format!("word{} ", i));
            let d = calculate_duration(&text, 100);
            assert!(d >= prev, "duration must not decrease as words are added");
            assert!(d >= MIN_SCENE_DURATION);
            prev = d;
        }
    }

    #[test]
    fn test_duration_zero_bpm_is_safe() {
        // bpm is clamped to 1; no division by zero
        let d = calculate_duration("a few words here", 0);
        assert!(d.is_finite());
        assert!(d >= MIN_SCENE_DURATION);
    }

    #[test]
    fn test_explicit_duration_wins() {
        let line = LyricLine {
            text: "hello world".to_string(),
            time: 0.0,
            duration: Some(4.5),
            mood: None,
        };
        assert_eq!(line.effective_duration(120), 4.5);
    }

    #[test]
    fn test_mood_default() {
        let line = LyricLine::new("text", 0.0);
        assert_eq!(line.mood_or_default(), "neutral");
    }
}
