// Safe text-content replacement.
//
// Replacing prose inside source without a parser risks renaming identifiers
// or object keys that happen to share the text. Every candidate occurrence
// is vetted with a local-context predicate and the operation refuses
// entirely when no occurrence passes — a failed edit is recoverable, a
// corrupted file is not.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextReplaceError {
    #[error("old text {0:?} not found")]
    NotFound(String),

    /// Occurrences exist, but each looks like code rather than content.
    #[error("no safe occurrence of {0:?}; all matches look like identifiers or keys")]
    NoSafeOccurrence(String),
}

/// Replace the first safe occurrence of `old_text` with `new_text`.
///
/// When `bias_offset` is given (usually from the element locator), the
/// occurrence nearest that byte offset is preferred over document order.
pub fn replace_text(
    source: &str,
    old_text: &str,
    new_text: &str,
    bias_offset: Option<usize>,
) -> Result<String, TextReplaceError> {
    let old_text = old_text.trim();
    if old_text.is_empty() {
        return Err(TextReplaceError::NotFound(String::new()));
    }

    let mut occurrences = find_occurrences(source, old_text);
    if occurrences.is_empty() {
        return Err(TextReplaceError::NotFound(old_text.to_string()));
    }

    if let Some(bias) = bias_offset {
        occurrences.sort_by_key(|position| position.abs_diff(bias));
    }

    for position in occurrences {
        if is_safe_occurrence(source, position, old_text.len()) {
            let mut patched = String::with_capacity(source.len() + new_text.len());
            patched.push_str(&source[..position]);
            patched.push_str(new_text);
            patched.push_str(&source[position + old_text.len()..]);
            return Ok(patched);
        }
    }

    Err(TextReplaceError::NoSafeOccurrence(old_text.to_string()))
}

fn find_occurrences(source: &str, needle: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut search_from = 0;
    while let Some(found) = source[search_from..].find(needle) {
        positions.push(search_from + found);
        search_from += found + needle.len();
    }
    positions
}

/// Judge one occurrence by the characters around it.
///
/// Unsafe: part of a longer identifier, a property access (`.` before), or
/// an object key / type annotation (`:` after). Safe: markup text content
/// (`>` before, ignoring whitespace) or a string literal enclosed in one
/// matching pair of quotes.
fn is_safe_occurrence(source: &str, start: usize, len: usize) -> bool {
    let end = start + len;
    let before = source[..start].chars().next_back();
    let after = source[end..].chars().next();

    if let Some(ch) = before {
        if is_identifier_char(ch) || ch == '.' {
            return false;
        }
    }
    if let Some(ch) = after {
        if is_identifier_char(ch) || ch == ':' {
            return false;
        }
    }

    // String-literal content: same quote on both sides.
    if let (Some(open), Some(close)) = (before, after) {
        if (open == '"' || open == '\'' || open == '`') && open == close {
            return true;
        }
    }

    // Markup content: nearest non-whitespace character to the left closes a
    // tag. The right side is free-form (trailing text, nested tags).
    let left_context = source[..start].trim_end();
    if left_context.ends_with('>') {
        return true;
    }

    // Mid-text edits ("completed" inside ">task completed<") keep plain
    // prose characters on both sides.
    let prose_before = before.is_none_or(|ch| ch.is_whitespace() || ch.is_ascii_punctuation());
    let prose_after = after.is_none_or(|ch| ch == '<' || ch.is_whitespace());
    prose_before && prose_after && left_is_markup_text(source, start)
}

/// A quick scan left for whether the occurrence sits in element text: the
/// nearest `<` or `>` to the left must be a `>`.
fn left_is_markup_text(source: &str, start: usize) -> bool {
    source[..start]
        .rfind(['<', '>'])
        .is_some_and(|position| source[position..].starts_with('>'))
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_markup_text_content() {
        let source = "<h1 className=\"title\">Welcome home</h1>";
        let patched = replace_text(source, "Welcome home", "Hello there", None).unwrap();
        assert_eq!(patched, "<h1 className=\"title\">Hello there</h1>");
    }

    #[test]
    fn prefers_prose_over_property_access() {
        let source = "const done = task.completed;\nreturn <span>completed</span>;";
        let patched = replace_text(source, "completed", "finished", None).unwrap();
        assert_eq!(patched, "const done = task.completed;\nreturn <span>finished</span>;");
    }

    #[test]
    fn refuses_when_only_property_access_exists() {
        let source = "const done = task.completed;";
        let error = replace_text(source, "completed", "finished", None).unwrap_err();
        assert_eq!(error, TextReplaceError::NoSafeOccurrence("completed".to_string()));
    }

    #[test]
    fn refuses_object_keys() {
        let source = "const state = { completed: true };";
        let error = replace_text(source, "completed", "finished", None).unwrap_err();
        assert_eq!(error, TextReplaceError::NoSafeOccurrence("completed".to_string()));
    }

    #[test]
    fn refuses_partial_identifier_matches() {
        let source = "let completedCount = 3;";
        let error = replace_text(source, "completed", "finished", None).unwrap_err();
        assert_eq!(error, TextReplaceError::NoSafeOccurrence("completed".to_string()));
    }

    #[test]
    fn replaces_string_literal_content() {
        let source = "const label = \"Submit\";";
        let patched = replace_text(source, "Submit", "Send", None).unwrap();
        assert_eq!(patched, "const label = \"Send\";");
    }

    #[test]
    fn bias_offset_selects_nearest_occurrence() {
        let source = "<p>Save</p>\n<!-- filler -->\n<button>Save</button>";
        let near_button = source.rfind("Save").unwrap();
        let patched = replace_text(source, "Save", "Store", Some(near_button)).unwrap();
        assert_eq!(patched, "<p>Save</p>\n<!-- filler -->\n<button>Store</button>");
    }

    #[test]
    fn document_order_without_bias() {
        let source = "<p>Save</p><button>Save</button>";
        let patched = replace_text(source, "Save", "Store", None).unwrap();
        assert_eq!(patched, "<p>Store</p><button>Save</button>");
    }

    #[test]
    fn missing_text_is_not_found() {
        let error = replace_text("<p>hello</p>", "absent", "x", None).unwrap_err();
        assert_eq!(error, TextReplaceError::NotFound("absent".to_string()));
    }

    #[test]
    fn whitespace_between_tag_and_text_is_still_safe() {
        let source = "<p>\n  Welcome aboard\n</p>";
        let patched = replace_text(source, "Welcome aboard", "Hi", None).unwrap();
        assert_eq!(patched, "<p>\n  Hi\n</p>");
    }
}
