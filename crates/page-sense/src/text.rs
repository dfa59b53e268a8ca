//! Small text-budget helpers shared by the sensor and the prompt layer.

const TRUNCATION_MARKER: &str = "... [truncated]";

/// Clip `text` to at most `max_chars` characters, appending a marker when
/// anything was cut. Character-based, so multi-byte text is safe.
pub fn clip(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_none() {
        head
    } else {
        format!("{}{}", head, TRUNCATION_MARKER)
    }
}

/// Rough token count for budget logging: about four characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(clip("hello", 10), "hello");
        assert_eq!(clip("hello", 5), "hello");
    }

    #[test]
    fn long_text_is_cut_and_marked() {
        let clipped = clip("abcdefgh", 4);
        assert_eq!(clipped, format!("abcd{}", TRUNCATION_MARKER));
    }

    #[test]
    fn clip_respects_multibyte_boundaries() {
        let clipped = clip("日本語テキスト", 3);
        assert!(clipped.starts_with("日本語"));
    }

    #[test]
    fn token_estimate_is_quarter_of_chars() {
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens(""), 0);
    }
}
