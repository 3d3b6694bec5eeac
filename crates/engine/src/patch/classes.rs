// CSS property/value to utility-class conversion.
//
// Known values map through static tables; anything else becomes an
// arbitrary-value token (`p-[13px]`). Before a new token is inserted, the
// tokens already in the class string that belong to the same semantic
// category are stripped. Category membership is decided by value shape, not
// prefix alone — `text-red-500`, `text-lg` and `text-center` share a prefix
// but never displace each other.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("property {0:?} has no utility-class mapping")]
    UnsupportedProperty(String),

    #[error("value {value:?} for {property:?} has no token or arbitrary form")]
    UnsupportedValue { property: String, value: String },
}

/// Result of folding one change into a class string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    /// The class string with conflicting tokens removed and the new one added.
    pub class_attribute: String,
    /// The token that was inserted.
    pub token: String,
}

// ── Value tables ────────────────────────────────────────────────────

/// Tailwind default palette, keyed by normalized 6-digit hex.
const COLOR_TABLE: &[(&str, &str)] = &[
    ("#ffffff", "white"),
    ("#000000", "black"),
    ("#f8fafc", "slate-50"),
    ("#e2e8f0", "slate-200"),
    ("#64748b", "slate-500"),
    ("#1e293b", "slate-800"),
    ("#0f172a", "slate-900"),
    ("#f9fafb", "gray-50"),
    ("#e5e7eb", "gray-200"),
    ("#9ca3af", "gray-400"),
    ("#6b7280", "gray-500"),
    ("#374151", "gray-700"),
    ("#111827", "gray-900"),
    ("#fee2e2", "red-100"),
    ("#ef4444", "red-500"),
    ("#dc2626", "red-600"),
    ("#f97316", "orange-500"),
    ("#f59e0b", "amber-500"),
    ("#eab308", "yellow-500"),
    ("#22c55e", "green-500"),
    ("#16a34a", "green-600"),
    ("#10b981", "emerald-500"),
    ("#14b8a6", "teal-500"),
    ("#06b6d4", "cyan-500"),
    ("#0ea5e9", "sky-500"),
    ("#3b82f6", "blue-500"),
    ("#2563eb", "blue-600"),
    ("#6366f1", "indigo-500"),
    ("#8b5cf6", "violet-500"),
    ("#a855f7", "purple-500"),
    ("#d946ef", "fuchsia-500"),
    ("#ec4899", "pink-500"),
    ("#f43f5e", "rose-500"),
];

const FONT_SIZE_TABLE: &[(&str, &str)] = &[
    ("12px", "xs"),
    ("14px", "sm"),
    ("16px", "base"),
    ("18px", "lg"),
    ("20px", "xl"),
    ("24px", "2xl"),
    ("30px", "3xl"),
    ("36px", "4xl"),
    ("48px", "5xl"),
    ("60px", "6xl"),
    ("72px", "7xl"),
];

const FONT_WEIGHT_TABLE: &[(&str, &str)] = &[
    ("100", "thin"),
    ("200", "extralight"),
    ("300", "light"),
    ("400", "normal"),
    ("normal", "normal"),
    ("500", "medium"),
    ("600", "semibold"),
    ("700", "bold"),
    ("bold", "bold"),
    ("800", "extrabold"),
    ("900", "black"),
];

/// Spacing scale shared by padding and margin.
const SPACING_TABLE: &[(&str, &str)] = &[
    ("0", "0"),
    ("0px", "0"),
    ("2px", "0.5"),
    ("4px", "1"),
    ("6px", "1.5"),
    ("8px", "2"),
    ("10px", "2.5"),
    ("12px", "3"),
    ("16px", "4"),
    ("20px", "5"),
    ("24px", "6"),
    ("32px", "8"),
    ("40px", "10"),
    ("48px", "12"),
    ("64px", "16"),
    ("80px", "20"),
    ("96px", "24"),
];

const BORDER_WIDTH_TABLE: &[(&str, &str)] = &[
    ("0", "0"),
    ("0px", "0"),
    ("1px", ""),
    ("2px", "2"),
    ("4px", "4"),
    ("8px", "8"),
];

const BORDER_RADIUS_TABLE: &[(&str, &str)] = &[
    ("0", "none"),
    ("0px", "none"),
    ("2px", "sm"),
    ("4px", ""),
    ("6px", "md"),
    ("8px", "lg"),
    ("12px", "xl"),
    ("16px", "2xl"),
    ("24px", "3xl"),
    ("9999px", "full"),
    ("50%", "full"),
];

const BORDER_STYLES: &[&str] = &["solid", "dashed", "dotted", "double", "hidden", "none"];

const TEXT_ALIGNMENTS: &[&str] = &["left", "center", "right", "justify", "start", "end"];

// ── Categories ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    All,
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    fn suffix(self) -> &'static str {
        match self {
            Side::All => "",
            Side::Top => "t",
            Side::Bottom => "b",
            Side::Left => "l",
            Side::Right => "r",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    TextColor,
    BackgroundColor,
    BorderColor,
    FontSize,
    FontWeight,
    TextAlign,
    Padding(Side),
    Margin(Side),
    BorderWidth(Side),
    BorderRadius,
    BorderStyle,
}

/// Map a CSS property (camelCase or kebab-case) to its category.
fn category_of(property: &str) -> Option<Category> {
    let normalized = to_kebab_case(property);
    let category = match normalized.as_str() {
        "color" => Category::TextColor,
        "background-color" | "background" => Category::BackgroundColor,
        "border-color" => Category::BorderColor,
        "font-size" => Category::FontSize,
        "font-weight" => Category::FontWeight,
        "text-align" => Category::TextAlign,
        "padding" => Category::Padding(Side::All),
        "padding-top" => Category::Padding(Side::Top),
        "padding-bottom" => Category::Padding(Side::Bottom),
        "padding-left" => Category::Padding(Side::Left),
        "padding-right" => Category::Padding(Side::Right),
        "margin" => Category::Margin(Side::All),
        "margin-top" => Category::Margin(Side::Top),
        "margin-bottom" => Category::Margin(Side::Bottom),
        "margin-left" => Category::Margin(Side::Left),
        "margin-right" => Category::Margin(Side::Right),
        "border-width" => Category::BorderWidth(Side::All),
        "border-top-width" => Category::BorderWidth(Side::Top),
        "border-bottom-width" => Category::BorderWidth(Side::Bottom),
        "border-left-width" => Category::BorderWidth(Side::Left),
        "border-right-width" => Category::BorderWidth(Side::Right),
        "border-radius" => Category::BorderRadius,
        "border-style" => Category::BorderStyle,
        _ => return None,
    };
    Some(category)
}

fn to_kebab_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

// ── Public entry point ──────────────────────────────────────────────

/// Fold one `{property, value}` change into a class string: strip the
/// category's existing tokens, then append the converted token.
pub fn apply_change(
    class_attribute: &str,
    property: &str,
    value: &str,
) -> Result<AppliedChange, ConversionError> {
    let category =
        category_of(property).ok_or_else(|| ConversionError::UnsupportedProperty(property.to_string()))?;
    let token = token_for(category, property, value)?;

    let mut tokens: Vec<String> = class_attribute
        .split_whitespace()
        .filter(|existing| !belongs_to_category(existing, category))
        .map(str::to_string)
        .collect();
    tokens.push(token.clone());

    Ok(AppliedChange { class_attribute: tokens.join(" "), token })
}

// ── Token synthesis ─────────────────────────────────────────────────

fn token_for(category: Category, property: &str, value: &str) -> Result<String, ConversionError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConversionError::UnsupportedValue {
            property: property.to_string(),
            value: value.to_string(),
        });
    }

    let token = match category {
        Category::TextColor => color_token("text", value),
        Category::BackgroundColor => color_token("bg", value),
        Category::BorderColor => color_token("border", value),
        Category::FontSize => match lookup(FONT_SIZE_TABLE, value) {
            Some(size) => format!("text-{size}"),
            None => arbitrary("text", value),
        },
        Category::FontWeight => match lookup(FONT_WEIGHT_TABLE, value) {
            Some(weight) => format!("font-{weight}"),
            None => arbitrary("font", value),
        },
        Category::TextAlign => {
            let value = value.to_ascii_lowercase();
            if TEXT_ALIGNMENTS.contains(&value.as_str()) {
                format!("text-{value}")
            } else {
                return Err(ConversionError::UnsupportedValue {
                    property: property.to_string(),
                    value,
                });
            }
        }
        Category::Padding(side) => scale_token("p", side, value),
        Category::Margin(side) => scale_token("m", side, value),
        Category::BorderWidth(side) => {
            let base = format!("border{}", dashed(side.suffix()));
            match lookup(BORDER_WIDTH_TABLE, value) {
                Some("") => base,
                Some(width) => format!("{base}-{width}"),
                None => format!("{base}-[{}]", escape_value(value)),
            }
        }
        Category::BorderRadius => match lookup(BORDER_RADIUS_TABLE, value) {
            Some("") => "rounded".to_string(),
            Some(radius) => format!("rounded-{radius}"),
            None => format!("rounded-[{}]", escape_value(value)),
        },
        Category::BorderStyle => {
            let value = value.to_ascii_lowercase();
            if BORDER_STYLES.contains(&value.as_str()) {
                format!("border-{value}")
            } else {
                // No arbitrary form exists for border styles.
                return Err(ConversionError::UnsupportedValue {
                    property: property.to_string(),
                    value,
                });
            }
        }
    };

    Ok(token)
}

fn dashed(suffix: &str) -> String {
    if suffix.is_empty() {
        String::new()
    } else {
        format!("-{suffix}")
    }
}

fn color_token(prefix: &str, value: &str) -> String {
    match color_name(value) {
        Some(name) => format!("{prefix}-{name}"),
        None => arbitrary(prefix, value),
    }
}

fn scale_token(prefix: &str, side: Side, value: &str) -> String {
    let base = format!("{prefix}{}", side.suffix());
    match lookup(SPACING_TABLE, value) {
        Some(step) => format!("{base}-{step}"),
        None => format!("{base}-[{}]", escape_value(value)),
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], value: &str) -> Option<&'static str> {
    let needle = value.to_ascii_lowercase();
    table.iter().find(|(key, _)| *key == needle).map(|(_, mapped)| *mapped)
}

/// Resolve a CSS color to a palette name: named colors, 3/6-digit hex.
fn color_name(value: &str) -> Option<&'static str> {
    let lower = value.to_ascii_lowercase();
    match lower.as_str() {
        "white" => return Some("white"),
        "black" => return Some("black"),
        "transparent" => return Some("transparent"),
        "currentcolor" => return Some("current"),
        _ => {}
    }

    let hex = normalize_hex(&lower)?;
    lookup(COLOR_TABLE, &hex)
}

/// Expand `#abc` to `#aabbcc`; pass 6-digit hex through lowercased.
fn normalize_hex(value: &str) -> Option<String> {
    let digits = value.strip_prefix('#')?;
    match digits.len() {
        3 => {
            let mut out = String::with_capacity(7);
            out.push('#');
            for ch in digits.chars() {
                out.push(ch);
                out.push(ch);
            }
            Some(out)
        }
        6 => Some(format!("#{digits}")),
        _ => None,
    }
}

/// Arbitrary-value token: `prefix-[value]`, spaces become underscores.
fn arbitrary(prefix: &str, value: &str) -> String {
    format!("{prefix}-[{}]", escape_value(value))
}

fn escape_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join("_")
}

// ── Category stripping ──────────────────────────────────────────────

fn belongs_to_category(token: &str, category: Category) -> bool {
    match category {
        Category::TextColor => suffix_is_color(token, "text-"),
        Category::BackgroundColor => suffix_is_color(token, "bg-"),
        Category::BorderColor => suffix_is_color(token, "border-"),
        Category::FontSize => {
            token.strip_prefix("text-").is_some_and(|suffix| size_shape_re().is_match(suffix))
        }
        Category::FontWeight => {
            token.strip_prefix("font-").is_some_and(|suffix| weight_shape_re().is_match(suffix))
        }
        Category::TextAlign => token
            .strip_prefix("text-")
            .is_some_and(|suffix| TEXT_ALIGNMENTS.contains(&suffix)),
        Category::Padding(side) => spacing_token_matches(token, "p", side),
        Category::Margin(side) => spacing_token_matches(token, "m", side),
        Category::BorderWidth(side) => border_width_matches(token, side),
        Category::BorderRadius => token == "rounded" || token.starts_with("rounded-"),
        Category::BorderStyle => token
            .strip_prefix("border-")
            .is_some_and(|suffix| BORDER_STYLES.contains(&suffix)),
    }
}

fn suffix_is_color(token: &str, prefix: &str) -> bool {
    token.strip_prefix(prefix).is_some_and(|suffix| color_shape_re().is_match(suffix))
}

/// Setting all sides displaces every side token; a single side displaces
/// only its own tokens.
fn spacing_token_matches(token: &str, prefix: &str, side: Side) -> bool {
    let sides: &[&str] = match side {
        Side::All => &["", "t", "b", "l", "r", "x", "y"],
        Side::Top => &["t"],
        Side::Bottom => &["b"],
        Side::Left => &["l"],
        Side::Right => &["r"],
    };
    sides.iter().any(|suffix| {
        token
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix(suffix))
            .and_then(|rest| rest.strip_prefix('-'))
            .is_some_and(|rest| spacing_shape_re().is_match(rest))
    })
}

fn border_width_matches(token: &str, side: Side) -> bool {
    let sides: &[&str] = match side {
        Side::All => &["", "-t", "-b", "-l", "-r"],
        Side::Top => &["-t"],
        Side::Bottom => &["-b"],
        Side::Left => &["-l"],
        Side::Right => &["-r"],
    };
    sides.iter().any(|suffix| {
        let Some(rest) = token.strip_prefix("border") else { return false };
        let Some(rest) = rest.strip_prefix(suffix) else { return false };
        rest.is_empty()
            || rest
                .strip_prefix('-')
                .is_some_and(|width| width_shape_re().is_match(width))
    })
}

fn color_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:[a-z]+-(?:50|[1-9]50|[1-9]00)|white|black|transparent|current|inherit|\[(?:#|rgb|hsl)[^\]]*\])$",
        )
        .expect("color shape pattern should compile")
    })
}

fn size_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:xs|sm|base|lg|xl|[2-9]xl|\[[0-9.]+(?:px|rem|em|%)\])$")
            .expect("size shape pattern should compile")
    })
}

fn weight_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:thin|extralight|light|normal|medium|semibold|bold|extrabold|black|\[[0-9]+\])$",
        )
        .expect("weight shape pattern should compile")
    })
}

fn spacing_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[0-9]+(?:\.5)?|px|\[[^\]]+\])$")
            .expect("spacing shape pattern should compile")
    })
}

fn width_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:0|2|4|8|\[[^\]]+\])$").expect("width shape pattern should compile")
    })
}
