//! Slot extraction from rendered content.
//!
//! Rendered pages tag named regions with `<!-- slot:NAME -->` markers. A
//! single left-to-right scan captures the text between one marker and the
//! next (or end of input) under the marker's name; text before the first
//! marker becomes the residual content. Markers do not nest, and an
//! unterminated marker captures to end of input.

use std::collections::HashMap;

/// The result of one [`parse_slots`] pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SlotParse {
    /// Trimmed, non-empty captures by marker name. The reserved name
    /// `default` selects a layout's primary insertion point.
    pub slots: HashMap<String, String>,
    /// Trimmed text outside any marker region.
    pub content: String,
}

/// Scans `input` for slot markers and splits it into named slots plus
/// residual content.
///
/// Captures are trimmed; an empty capture drops its slot. Malformed marker
/// text (a comment that is not a well-formed `slot:NAME`) is treated as
/// plain content.
///
/// # Examples
///
/// ```
/// use pageflow::slots::parse_slots;
///
/// let parsed = parse_slots("<!-- slot:header -->Hi<!-- slot:footer -->Bye");
/// assert_eq!(parsed.slots["header"], "Hi");
/// assert_eq!(parsed.slots["footer"], "Bye");
/// assert_eq!(parsed.content, "");
/// ```
pub fn parse_slots(input: &str) -> SlotParse {
    let mut markers = Vec::new();
    let mut scan = 0;
    while let Some(offset) = input[scan..].find("<!--") {
        let start = scan + offset;
        match parse_marker(&input[start..]) {
            Some((name, len)) => {
                markers.push((start, start + len, name));
                scan = start + len;
            }
            // Not a slot marker; keep scanning past the comment opener.
            None => scan = start + 4,
        }
    }

    let mut slots = HashMap::new();
    let content = match markers.first() {
        Some((first_start, ..)) => input[..*first_start].trim().to_owned(),
        None => input.trim().to_owned(),
    };

    for (i, (_, capture_start, name)) in markers.iter().enumerate() {
        let capture_end = markers
            .get(i + 1)
            .map(|(next_start, ..)| *next_start)
            .unwrap_or(input.len());
        let captured = input[*capture_start..capture_end].trim();
        if !captured.is_empty() {
            slots.insert(name.clone(), captured.to_owned());
        }
    }

    SlotParse { slots, content }
}

// Parses `<!-- slot:NAME -->` at the start of `text`, returning the name and
// the marker's byte length.
fn parse_marker(text: &str) -> Option<(String, usize)> {
    let rest = text.strip_prefix("<!--")?;
    let after_ws = rest.trim_start();
    let after_tag = after_ws.strip_prefix("slot:")?;

    let name_len = after_tag
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    if name_len == 0 {
        return None;
    }
    let name = &after_tag[..name_len];

    let tail = after_tag[name_len..].trim_start();
    let close = tail.strip_prefix("-->")?;
    let len = text.len() - close.len();
    Some((name.to_owned(), len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_markers_all_content() {
        let parsed = parse_slots("  <h1>hi</h1>\n");
        assert!(parsed.slots.is_empty());
        assert_eq!(parsed.content, "<h1>hi</h1>");
    }

    #[test]
    fn two_slots_no_residual() {
        let parsed = parse_slots("<!-- slot:header -->Hi<!-- slot:footer -->Bye");
        assert_eq!(parsed.slots.len(), 2);
        assert_eq!(parsed.slots["header"], "Hi");
        assert_eq!(parsed.slots["footer"], "Bye");
        assert_eq!(parsed.content, "");
    }

    #[test]
    fn content_before_first_marker_is_residual() {
        let parsed = parse_slots("<main>body</main>\n<!-- slot:aside -->links");
        assert_eq!(parsed.content, "<main>body</main>");
        assert_eq!(parsed.slots["aside"], "links");
    }

    #[test]
    fn last_slot_captures_to_end_of_input() {
        let parsed = parse_slots("<!-- slot:main -->line one\nline two\n");
        assert_eq!(parsed.slots["main"], "line one\nline two");
    }

    #[test]
    fn captures_are_trimmed() {
        let parsed = parse_slots("<!-- slot:a -->\n  padded  \n<!-- slot:b -->x");
        assert_eq!(parsed.slots["a"], "padded");
    }

    #[test]
    fn empty_capture_drops_slot() {
        let parsed = parse_slots("<!-- slot:ghost -->   <!-- slot:real -->text");
        assert!(!parsed.slots.contains_key("ghost"));
        assert_eq!(parsed.slots["real"], "text");
    }

    #[test]
    fn whitespace_inside_marker_tolerated() {
        let parsed = parse_slots("<!--slot:tight-->a<!--  slot:spaced  -->b");
        assert_eq!(parsed.slots["tight"], "a");
        assert_eq!(parsed.slots["spaced"], "b");
    }

    #[test]
    fn plain_comment_is_content() {
        let parsed = parse_slots("<!-- not a slot -->still here");
        assert!(parsed.slots.is_empty());
        assert_eq!(parsed.content, "<!-- not a slot -->still here");
    }

    #[test]
    fn duplicate_name_last_capture_wins() {
        let parsed = parse_slots("<!-- slot:x -->one<!-- slot:x -->two");
        assert_eq!(parsed.slots["x"], "two");
    }

    #[test]
    fn reconstruction_covers_all_non_whitespace_once() {
        let input = "intro <!-- slot:a -->alpha<!-- slot:b -->beta";
        let parsed = parse_slots(input);
        let mut rebuilt = parsed.content.clone();
        rebuilt.push_str(&parsed.slots["a"]);
        rebuilt.push_str(&parsed.slots["b"]);
        let squashed: String = input
            .replace("<!-- slot:a -->", "")
            .replace("<!-- slot:b -->", "")
            .split_whitespace()
            .collect();
        let rebuilt_squashed: String = rebuilt.split_whitespace().collect();
        assert_eq!(rebuilt_squashed, squashed);
    }
}
