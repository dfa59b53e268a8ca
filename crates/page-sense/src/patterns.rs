//! Text pattern detection over the visible page text.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::DetectedPatterns;

/// Currency-symbol-prefixed amounts: `$1,299.99`, `€45`, `£ 12.50`.
static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[$€£¥]\s?\d[\d,]*(?:\.\d{1,2})?").expect("price pattern compiles")
});

/// Clock times with meridiem: `9:30 AM`, `11:05pm`.
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,2}:\d{2}\s?(?:AM|PM|am|pm)\b").expect("time pattern compiles")
});

/// Run both detectors over `text`, deduplicating while preserving the order
/// of first appearance.
pub fn detect(text: &str) -> DetectedPatterns {
    DetectedPatterns {
        prices: collect_unique(&PRICE_RE, text),
        times: collect_unique(&TIME_RE, text),
    }
}

fn collect_unique(re: &Regex, text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for m in re.find_iter(text) {
        let hit = m.as_str().to_string();
        if seen.insert(hit.clone()) {
            found.push(hit);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_dedupe_in_first_seen_order() {
        let text = "Was $1,299.99, now $999. Also $1,299.99 at checkout. From €45.";
        let patterns = detect(text);
        assert_eq!(patterns.prices, vec!["$1,299.99", "$999", "€45"]);
    }

    #[test]
    fn times_require_meridiem() {
        let text = "Departs 9:30 AM, arrives 11:05pm. Build took 14:30.";
        let patterns = detect(text);
        assert_eq!(patterns.times, vec!["9:30 AM", "11:05pm"]);
    }

    #[test]
    fn plain_text_detects_nothing() {
        assert!(detect("no structured data here").is_empty());
    }
}
