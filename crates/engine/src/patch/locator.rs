// Element locator: byte-range resolution from line/text/class hints.
//
// Strategies are independent `(source, hints) -> Option<ElementLocation>`
// functions tried in fixed precedence. Each either returns a verified span
// or nothing; the caller fails the whole request when every strategy passes.

/// How far above the hinted line the backward tag scan may reach.
const LINE_LOOKBACK_LINES: usize = 40;

/// Text snippets longer than this are truncated before searching.
const MAX_TEXT_SNIPPET_CHARS: usize = 80;

/// Class tokens containing these substrings identify an element well.
const SEMANTIC_KEYWORDS: &[&str] =
    &["gradient", "heading", "title", "hero", "banner", "card", "btn", "button", "nav", "logo"];

/// Utility prefixes too common to identify a single element.
const LAYOUT_PREFIXES: &[&str] = &[
    "p-", "px-", "py-", "pt-", "pb-", "pl-", "pr-", "m-", "mx-", "my-", "mt-", "mb-", "ml-",
    "mr-", "w-", "h-", "gap-", "space-", "items-", "justify-", "content-", "self-", "col-",
    "row-", "inset-", "top-", "bottom-", "left-", "right-", "z-", "overflow-", "text-", "bg-",
];

/// Bare utility tokens excluded from class-membership ranking.
const LAYOUT_TOKENS: &[&str] =
    &["flex", "grid", "block", "inline", "hidden", "relative", "absolute", "fixed", "container"];

/// Elements that never wrap text content.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "source", "track", "wbr"];

/// Hints extracted from a durable update request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocatorHints<'a> {
    pub selector: &'a str,
    /// 1-based line number from the element's source location.
    pub line_number: Option<u32>,
    pub text_content: Option<&'a str>,
    pub class_attribute: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    /// `start..end` spans an existing class attribute value.
    Attribute,
    /// `start == end` is the insertion point for a new attribute.
    Insert,
}

/// Byte range identifying the markup to rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementLocation {
    pub start: usize,
    pub end: usize,
    /// Current attribute value text ("" for an insertion point).
    pub current_text: String,
    pub kind: LocationKind,
    /// Spelling of the class attribute in this file: `className` or `class`.
    pub attribute_name: &'static str,
}

type Strategy = fn(&str, &LocatorHints) -> Option<ElementLocation>;

/// Strategies in precedence order, with names for error reporting.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("line_number", by_line_number),
    ("selector_id", by_selector_id),
    ("text_content", by_text_content),
    ("class_membership", by_class_membership),
];

/// Resolve an element's class-attribute span, returning the first strategy
/// that succeeds along with its name.
pub fn locate_element(source: &str, hints: &LocatorHints) -> Option<(ElementLocation, &'static str)> {
    for (name, strategy) in STRATEGIES {
        if let Some(location) = strategy(source, hints) {
            return Some((location, name));
        }
    }
    None
}

/// Names of all strategies, for error messages.
pub fn strategy_names() -> String {
    STRATEGIES.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", ")
}

// ── Strategy 1: line number ─────────────────────────────────────────

fn by_line_number(source: &str, hints: &LocatorHints) -> Option<ElementLocation> {
    let line_number = hints.line_number? as usize;
    if line_number == 0 {
        return None;
    }

    let line_end = offset_of_line_end(source, line_number)?;
    let lookback_floor = offset_of_line_start(source, line_number.saturating_sub(LINE_LOOKBACK_LINES).max(1));

    let tag_start = nearest_open_tag_before(source, line_end, lookback_floor)?;
    class_attribute_location(source, tag_start)
}

// ── Strategy 2: selector-encoded id ─────────────────────────────────

fn by_selector_id(source: &str, hints: &LocatorHints) -> Option<ElementLocation> {
    let id = id_from_selector(hints.selector)?;

    for quote in ['"', '\''] {
        let needle = format!("id={quote}{id}{quote}");
        if let Some(attr_pos) = source.find(&needle) {
            let tag_start = source[..attr_pos].rfind('<')?;
            if !is_open_tag_at(source, tag_start) {
                continue;
            }
            // The id attribute must sit inside this tag, not a later one.
            let tag_close = source[tag_start..].find('>')? + tag_start;
            if attr_pos > tag_close {
                continue;
            }
            return class_attribute_location(source, tag_start);
        }
    }
    None
}

fn id_from_selector(selector: &str) -> Option<&str> {
    let hash = selector.find('#')?;
    let rest = &selector[hash + 1..];
    let end = rest
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'))
        .unwrap_or(rest.len());
    let id = &rest[..end];
    (!id.is_empty()).then_some(id)
}

// ── Strategy 3: text content ────────────────────────────────────────

fn by_text_content(source: &str, hints: &LocatorHints) -> Option<ElementLocation> {
    let trimmed = hints.text_content?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let snippet = truncate_chars(trimmed, MAX_TEXT_SNIPPET_CHARS);

    let text_pos = source.find(snippet)?;
    let tag_start = enclosing_open_tag(source, text_pos)?;
    class_attribute_location(source, tag_start)
}

/// Walk backward from `from` through balanced tags to the nearest opening
/// tag that has not been closed again before `from`.
fn enclosing_open_tag(source: &str, from: usize) -> Option<usize> {
    let mut cursor = from;
    let mut unmatched_closers = 0usize;

    while let Some(lt) = source[..cursor].rfind('<') {
        let rest = &source[lt..];

        if rest.starts_with("</") {
            unmatched_closers += 1;
        } else if is_open_tag_at(source, lt) {
            let gt = rest.find('>')?;
            let self_closing = rest[..gt].ends_with('/');
            let name = tag_name_at(source, lt);
            let void = VOID_TAGS.contains(&name.as_str());

            if !self_closing && !void {
                if unmatched_closers == 0 {
                    return Some(lt);
                }
                unmatched_closers -= 1;
            }
        }
        // Comments, doctypes and processing instructions are neutral.

        cursor = lt;
    }

    None
}

// ── Strategy 4: class-attribute membership ──────────────────────────

fn by_class_membership(source: &str, hints: &LocatorHints) -> Option<ElementLocation> {
    let class_attribute = hints.class_attribute?;
    let ranked = rank_class_tokens(class_attribute);
    if ranked.is_empty() {
        return None;
    }

    let spans = class_attribute_spans(source);
    for token in &ranked {
        for (start, end, attribute_name) in &spans {
            let value = &source[*start..*end];
            if value.split_whitespace().any(|candidate| candidate == *token) {
                return Some(ElementLocation {
                    start: *start,
                    end: *end,
                    current_text: value.to_string(),
                    kind: LocationKind::Attribute,
                    attribute_name: *attribute_name,
                });
            }
        }
    }
    None
}

/// Order an element's own tokens by how well they identify it: tokens with
/// semantic keywords first, generic layout utilities dropped entirely.
fn rank_class_tokens(class_attribute: &str) -> Vec<&str> {
    let mut semantic = Vec::new();
    let mut other = Vec::new();

    for token in class_attribute.split_whitespace() {
        let lower = token.to_ascii_lowercase();
        // Semantic keywords win even under a layout prefix: bg-gradient-to-r
        // identifies an element, bg-white does not.
        if SEMANTIC_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
            semantic.push(token);
            continue;
        }
        if LAYOUT_TOKENS.contains(&lower.as_str())
            || LAYOUT_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
        {
            continue;
        }
        other.push(token);
    }

    semantic.extend(other);
    semantic
}

/// Byte spans of every class-attribute *value* in the file, with the
/// attribute spelling each one uses.
fn class_attribute_spans(source: &str) -> Vec<(usize, usize, &'static str)> {
    let mut spans = Vec::new();
    for (needle, attribute_name) in [("className=", "className"), ("class=", "class")] {
        let mut search_from = 0;
        while let Some(found) = source[search_from..].find(needle) {
            let attr_start = search_from + found;
            search_from = attr_start + needle.len();

            if !attribute_boundary_before(source, attr_start) {
                continue;
            }
            let value_start = attr_start + needle.len();
            let Some(quote) = source[value_start..].chars().next() else { continue };
            if quote != '"' && quote != '\'' {
                continue;
            }
            let inner_start = value_start + 1;
            let Some(len) = source[inner_start..].find(quote) else { continue };
            if !spans.iter().any(|(start, end, _)| (*start, *end) == (inner_start, inner_start + len)) {
                spans.push((inner_start, inner_start + len, attribute_name));
            }
        }
    }
    spans.sort_unstable();
    spans
}

// ── Shared tag helpers ──────────────────────────────────────────────

fn is_open_tag_at(source: &str, lt: usize) -> bool {
    source[lt..].starts_with('<')
        && source[lt + 1..].chars().next().is_some_and(|ch| ch.is_ascii_alphabetic())
}

fn tag_name_at(source: &str, lt: usize) -> String {
    source[lt + 1..]
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Nearest `<tag` (not `</`) at or before `from`, bounded below by `floor`.
fn nearest_open_tag_before(source: &str, from: usize, floor: usize) -> Option<usize> {
    let mut cursor = from.min(source.len());
    while let Some(lt) = source[..cursor].rfind('<') {
        if lt < floor {
            return None;
        }
        if is_open_tag_at(source, lt) {
            return Some(lt);
        }
        cursor = lt;
    }
    None
}

/// Extract the class attribute value span of the tag opening at `tag_start`,
/// or the insertion point right after the tag name when the attribute is
/// absent. Returns `None` when the attribute exists but is a `{...}`
/// expression that cannot be rewritten as a string literal.
fn class_attribute_location(source: &str, tag_start: usize) -> Option<ElementLocation> {
    let tag_close = source[tag_start..].find('>')? + tag_start;
    let tag_body = &source[tag_start..tag_close];

    for (needle, attribute_name) in [("className=", "className"), ("class=", "class")] {
        let mut search_from = 0;
        while let Some(found) = tag_body[search_from..].find(needle) {
            let attr_offset = search_from + found;
            search_from = attr_offset + needle.len();

            if !attribute_boundary_before(tag_body, attr_offset) {
                continue;
            }

            let value_offset = attr_offset + needle.len();
            let quote = tag_body[value_offset..].chars().next()?;
            if quote == '{' {
                // Expression-valued attribute: rewriting would corrupt code.
                return None;
            }
            if quote != '"' && quote != '\'' {
                continue;
            }
            let inner = value_offset + 1;
            let len = tag_body[inner..].find(quote)?;
            let start = tag_start + inner;
            return Some(ElementLocation {
                start,
                end: start + len,
                current_text: source[start..start + len].to_string(),
                kind: LocationKind::Attribute,
                attribute_name,
            });
        }
    }

    // No class attribute on the tag: report where one can be inserted,
    // spelled the way the rest of the file spells it.
    let name_len = tag_name_at(source, tag_start).len();
    let insert_at = tag_start + 1 + name_len;
    Some(ElementLocation {
        start: insert_at,
        end: insert_at,
        current_text: String::new(),
        kind: LocationKind::Insert,
        attribute_name: preferred_attribute(source),
    })
}

/// Attribute spelling a new class attribute should use in this file.
/// JSX sources carry `className=`; plain HTML and Vue templates use
/// `class=`. Files with neither default to JSX spelling.
fn preferred_attribute(source: &str) -> &'static str {
    if source.contains("className=") {
        "className"
    } else if source.contains("class=") {
        "class"
    } else {
        "className"
    }
}

/// An attribute name must start a word: preceded by whitespace or `<tag `.
fn attribute_boundary_before(text: &str, attr_start: usize) -> bool {
    match text[..attr_start].chars().next_back() {
        Some(ch) => ch.is_whitespace(),
        None => false,
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

fn offset_of_line_start(source: &str, line_number: usize) -> usize {
    if line_number <= 1 {
        return 0;
    }
    let mut seen = 1usize;
    for (index, byte) in source.bytes().enumerate() {
        if byte == b'\n' {
            seen += 1;
            if seen == line_number {
                return index + 1;
            }
        }
    }
    source.len()
}

fn offset_of_line_end(source: &str, line_number: usize) -> Option<usize> {
    if line_number > source.lines().count() {
        return None;
    }
    let start = offset_of_line_start(source, line_number);
    Some(source[start..].find('\n').map(|index| start + index).unwrap_or(source.len()))
}
