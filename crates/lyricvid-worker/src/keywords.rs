//! Keyword extraction and texture prompt building.
//!
//! Best-effort reduction of lyric text to descriptive terms via a stop-word
//! filter, merged with the style's keyword templates into an AI texture
//! prompt. A per-style fallback vocabulary covers lyrics that yield nothing.

use lyricvid_models::StyleProfile;

/// Maximum keywords folded into a prompt.
const MAX_KEYWORDS: usize = 5;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
    "would", "shall", "should", "may", "might", "must", "can", "could", "i", "you", "he", "she",
    "it", "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "its", "our",
    "their", "mine", "yours", "hers", "ours", "theirs", "this", "that", "these", "those", "am",
    "not", "so", "too", "just",
];

/// Extract up to `max` descriptive keywords from lyric text.
///
/// Lowercases, drops punctuation, filters stop words and short tokens, and
/// deduplicates while preserving order.
pub fn extract_keywords(text: &str, max: usize) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    for raw in text.split_whitespace() {
        let word: String = raw
            .chars()
            .filter(|c| c.is_alphabetic())
            .collect::<String>()
            .to_lowercase();
        if word.len() < 3 {
            continue;
        }
        if STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        if keywords.contains(&word) {
            continue;
        }
        keywords.push(word);
        if keywords.len() >= max {
            break;
        }
    }

    keywords
}

/// Fallback vocabulary used when extraction yields nothing.
fn fallback_vocabulary(style_key: &str) -> &'static [&'static str] {
    if style_key.contains("dreamy") || style_key.contains("floating") {
        &["ethereal", "dreamy", "misty", "glowing", "soft"]
    } else if style_key.contains("minimal") {
        &["minimal", "clean", "simple", "elegant", "geometric"]
    } else if style_key.contains("glitch") || style_key.contains("cyberpunk") {
        &["neon", "digital", "fragmented", "electric", "synthetic"]
    } else if style_key.contains("vintage") || style_key.contains("lofi") {
        &["vintage", "retro", "warm", "grainy", "nostalgic"]
    } else if style_key.contains("brutalist") {
        &["gritty", "urban", "industrial", "textured", "raw"]
    } else {
        &["abstract", "texture", "pattern", "background"]
    }
}

/// Build an AI texture prompt from a lyric line and a style profile.
pub fn build_texture_prompt(lyric_text: &str, mood: &str, style: &StyleProfile) -> String {
    let mut keywords = extract_keywords(lyric_text, MAX_KEYWORDS);
    if keywords.is_empty() {
        keywords = fallback_vocabulary(&style.key)
            .iter()
            .map(|s| s.to_string())
            .collect();
    }

    format!(
        "Abstract looping background texture, high resolution, cinematic, {} mood, {}, {}, no text",
        mood,
        style.generation_keywords.join(", "),
        keywords.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyricvid_models::StyleLibrary;

    #[test]
    fn test_extraction_filters_stop_words() {
        let keywords = extract_keywords("the light is in my heart", 5);
        assert_eq!(keywords, vec!["light", "heart"]);
    }

    #[test]
    fn test_extraction_dedupes_and_limits() {
        let keywords = extract_keywords("dance dance dance tonight tonight forever always maybe", 3);
        assert_eq!(keywords.len(), 3);
        assert_eq!(keywords[0], "dance");
        assert_eq!(keywords[1], "tonight");
    }

    #[test]
    fn test_extraction_strips_punctuation() {
        let keywords = extract_keywords("burning, falling... rising!", 5);
        assert_eq!(keywords, vec!["burning", "falling", "rising"]);
    }

    #[test]
    fn test_prompt_contains_style_and_lyric_terms() {
        let lib = StyleLibrary::builtin();
        let style = lib.select(Some("dreamy"));
        let prompt = build_texture_prompt("golden sunlight fading", "peaceful", style);
        assert!(prompt.contains("peaceful mood"));
        assert!(prompt.contains("golden"));
        assert!(prompt.contains("pastel color palette"));
        assert!(prompt.contains("no text"));
    }

    #[test]
    fn test_prompt_uses_fallback_vocabulary() {
        let lib = StyleLibrary::builtin();
        let style = lib.select(Some("minimalist"));
        // Every word is a stop word, so extraction yields nothing
        let prompt = build_texture_prompt("i am so in it", "calm", style);
        assert!(prompt.contains("geometric"));
    }
}
