//! Instruction-shaped plan outlines.
//!
//! A short todo list keeps the model oriented across steps: it sees
//! where it is in a typical flow for the kind of task at hand. The
//! outline is heuristic scaffolding, not a contract; the model is
//! free to deviate and the controller never enforces it.

use once_cell::sync::Lazy;
use regex::Regex;

static FROM_TO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bfrom\s+([A-Za-z][A-Za-z .'-]*?)\s+to\s+([A-Za-z][A-Za-z .'-]*?)(?:\s+(?:on|in|for|by|next|this|departing|leaving)\b|[,.;!?]|$)")
        .expect("from/to pattern compiles")
});

const RETAILERS: &[(&str, &str)] = &[
    ("amazon", "amazon.com"),
    ("ebay", "ebay.com"),
    ("walmart", "walmart.com"),
    ("target", "target.com"),
    ("best buy", "bestbuy.com"),
    ("bestbuy", "bestbuy.com"),
];

const SEARCH_ENGINES: &[(&str, &str)] = &[
    ("google", "google.com"),
    ("bing", "bing.com"),
    ("duckduckgo", "duckduckgo.com"),
];

/// A recognized plan shape rendered into the prompt with progress
/// markers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoOutline {
    lines: Vec<String>,
}

impl TodoOutline {
    /// Pick the outline shape that best matches the instruction.
    pub fn for_instruction(instruction: &str) -> Self {
        let lowered = instruction.to_lowercase();

        if let Some((_, domain)) = RETAILERS.iter().find(|(name, _)| lowered.contains(name)) {
            return Self::shopping(domain);
        }
        if lowered.contains("flight") {
            let route = FROM_TO_RE
                .captures(instruction)
                .map(|c| (c[1].trim().to_string(), c[2].trim().to_string()));
            return Self::flights(route);
        }
        if ["job", "career", "hiring", "position", "vacanc"]
            .iter()
            .any(|k| lowered.contains(k))
        {
            return Self::jobs();
        }
        if lowered.contains("bookmark") {
            return Self::bookmarks();
        }
        if let Some((_, domain)) = SEARCH_ENGINES.iter().find(|(name, _)| lowered.contains(name)) {
            return Self::web_search(domain);
        }
        Self::generic()
    }

    fn shopping(domain: &str) -> Self {
        Self {
            lines: vec![
                format!("Navigate to {domain}"),
                "Search for the requested item".to_string(),
                "Review the search results".to_string(),
                "Open the most promising listing".to_string(),
                "Extract the item details".to_string(),
                "Complete with the findings".to_string(),
            ],
        }
    }

    fn flights(route: Option<(String, String)>) -> Self {
        let (origin, destination) = match route {
            Some((origin, destination)) => {
                (format!("Enter origin {origin}"), format!("Enter destination {destination}"))
            }
            None => ("Enter the origin".to_string(), "Enter the destination".to_string()),
        };
        Self {
            lines: vec![
                "Navigate to a flight search site".to_string(),
                origin,
                destination,
                "Search for flights".to_string(),
                "Extract prices and times".to_string(),
                "Complete with the best options".to_string(),
            ],
        }
    }

    fn jobs() -> Self {
        Self {
            lines: vec![
                "Navigate to the job board".to_string(),
                "Search for the role".to_string(),
                "Review the matching listings".to_string(),
                "Extract the listing details".to_string(),
                "Complete with the findings".to_string(),
            ],
        }
    }

    fn bookmarks() -> Self {
        Self {
            lines: vec![
                "Open the bookmarks page".to_string(),
                "Locate the requested entry".to_string(),
                "Extract the entry details".to_string(),
                "Complete with the findings".to_string(),
            ],
        }
    }

    fn web_search(domain: &str) -> Self {
        Self {
            lines: vec![
                format!("Navigate to {domain}"),
                "Run the search query".to_string(),
                "Review the results".to_string(),
                "Extract the relevant information".to_string(),
                "Complete with the findings".to_string(),
            ],
        }
    }

    fn generic() -> Self {
        Self {
            lines: vec![
                "Navigate to the relevant site".to_string(),
                "Locate the key content or control".to_string(),
                "Interact as the task requires".to_string(),
                "Extract the needed information".to_string(),
                "Complete with the result".to_string(),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render with `[x]` marks for finished lines and an arrow on the
    /// current one. `completed` is the count of successfully executed
    /// steps so far.
    pub fn render(&self, completed: usize) -> String {
        let current = completed.min(self.lines.len().saturating_sub(1));
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let n = i + 1;
                if i < completed {
                    format!("[x] {n}. {line}")
                } else if i == current {
                    format!("-> [ ] {n}. {line}")
                } else {
                    format!("[ ] {n}. {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retailer_mention_picks_shopping_shape() {
        let outline = TodoOutline::for_instruction("Find a USB hub on Amazon under $20");
        assert!(outline.render(0).contains("amazon.com"));
        assert_eq!(outline.len(), 6);
    }

    #[test]
    fn flight_route_is_extracted() {
        let outline =
            TodoOutline::for_instruction("Book a flight from New York to San Francisco on Friday");
        let text = outline.render(0);
        assert!(text.contains("Enter origin New York"));
        assert!(text.contains("Enter destination San Francisco"));
    }

    #[test]
    fn flight_without_route_stays_generic_about_cities() {
        let outline = TodoOutline::for_instruction("Compare flight prices for the holidays");
        assert!(outline.render(0).contains("Enter the origin"));
    }

    #[test]
    fn unrecognized_instruction_falls_back_to_generic() {
        let outline = TodoOutline::for_instruction("Check the weather in Berlin");
        assert!(outline.render(0).contains("Navigate to the relevant site"));
        assert_eq!(outline.len(), 5);
    }

    #[test]
    fn render_marks_done_and_current() {
        let outline = TodoOutline::for_instruction("Check the weather in Berlin");
        let text = outline.render(2);
        assert!(text.contains("[x] 1."));
        assert!(text.contains("[x] 2."));
        assert!(text.contains("-> [ ] 3."));
        assert!(text.contains("[ ] 4."));
        // Past the end: everything done, arrow sticks to the last line.
        let text = outline.render(99);
        assert!(text.contains("[x] 5."));
        assert!(!text.contains("-> [ ]"));
    }
}
