//! Inline-style declaration helpers for the protocol guard

use regex::Regex;

/// Numeric pixel length token inside a style value. Deliberately textual:
/// the substitution applies to `<number>px` wherever it appears in a
/// declaration value and touches nothing else.
pub(super) const PX_LENGTH_PATTERN: &str = r"([0-9]*\.?[0-9]+)px";

/// Points per pixel at the word-processor reference DPI
const PT_PER_PX: f64 = 0.75;

/// Rewrite every pixel length to points, bumping `converted` once per token.
/// Non-px declarations pass through verbatim.
pub(super) fn convert_px_lengths(style: &str, pattern: &Regex, converted: &mut u32) -> String {
    pattern
        .replace_all(style, |caps: &regex::Captures<'_>| match caps[1]
            .parse::<f64>()
        {
            Ok(value) => {
                *converted += 1;
                format!("{}pt", value * PT_PER_PX)
            }
            Err(_) => caps[0].to_string(),
        })
        .into_owned()
}

/// Whether the style value already declares `property` (exact name,
/// case-insensitive). `border-collapse` does not count as `border`.
pub(super) fn has_declaration(style: &str, property: &str) -> bool {
    style.split(';').any(|declaration| {
        declaration
            .split(':')
            .next()
            .map(|name| name.trim().eq_ignore_ascii_case(property))
            .unwrap_or(false)
    })
}

/// Append a declaration, normalizing the separator to `"; "`.
pub(super) fn append_declaration(style: &str, declaration: &str) -> String {
    let base = style.trim_end().trim_end_matches(';').trim_end();
    if base.trim().is_empty() {
        declaration.to_string()
    } else {
        format!("{base}; {declaration}")
    }
}
