//! Guard-aware serialization of the parsed document tree
//!
//! The parser is borrowed; this walk re-emits the body subtree while the
//! protocol rewrites are applied in place: style/stylesheet nodes are
//! dropped, inline pixel lengths become points, tables and cells receive
//! their protocol defaults, and math wrappers collapse to their text.

use super::css;
use regex::Regex;
use scraper::{ElementRef, Node};

/// Mutable state threaded through one serialization walk
pub(super) struct GuardPass<'a> {
    pub px_pattern: &'a Regex,
    pub converted_units: &'a mut u32,
}

/// Elements serialized without a closing tag
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Serialize every child of `root` (the body element) into `out`.
pub(super) fn serialize_children(root: ElementRef<'_>, pass: &mut GuardPass<'_>, out: &mut String) {
    for child in root.children() {
        match child.value() {
            Node::Text(text) => escape_text(&text.text, out),
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(&comment.comment);
                out.push_str("-->");
            }
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    serialize_element(element, pass, out);
                }
            }
            _ => {}
        }
    }
}

fn serialize_element(element: ElementRef<'_>, pass: &mut GuardPass<'_>, out: &mut String) {
    let name = element.value().name();

    if name == "style" {
        return;
    }
    if name == "link" && element.value().attr("rel") == Some("stylesheet") {
        return;
    }
    if name == "math" {
        // The wrapper goes away; its plain-text content stays in place.
        for text in element.text() {
            escape_text(text, out);
        }
        return;
    }

    let style = rewritten_style(element, pass);
    let needs_align = name == "table" && element.value().attr("align").is_none();

    out.push('<');
    out.push_str(name);

    let mut wrote_style = false;
    for (attr_name, attr_value) in element.value().attrs() {
        out.push(' ');
        out.push_str(attr_name);
        out.push_str("=\"");
        if attr_name == "style" {
            match style.as_deref() {
                Some(value) => escape_attr(value, out),
                None => escape_attr(attr_value, out),
            }
            wrote_style = true;
        } else {
            escape_attr(attr_value, out);
        }
        out.push('"');
    }

    if needs_align {
        out.push_str(" align=\"center\"");
    }
    if !wrote_style {
        if let Some(value) = style.as_deref() {
            out.push_str(" style=\"");
            escape_attr(value, out);
            out.push('"');
        }
    }

    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    serialize_children(element, pass, out);

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// The style value to emit for this element, if any: pixel lengths
/// converted, plus the table/cell protocol defaults when unset.
fn rewritten_style(element: ElementRef<'_>, pass: &mut GuardPass<'_>) -> Option<String> {
    let mut style = element
        .value()
        .attr("style")
        .map(|value| css::convert_px_lengths(value, pass.px_pattern, pass.converted_units));

    match element.value().name() {
        "table" => {
            let mut value = style.unwrap_or_default();
            if !css::has_declaration(&value, "border-collapse") {
                value = css::append_declaration(&value, "border-collapse:collapse");
            }
            if !css::has_declaration(&value, "border") {
                value = css::append_declaration(&value, "border:1pt solid #000");
            }
            style = Some(value);
        }
        "td" | "th" => {
            let mut value = style.unwrap_or_default();
            if !css::has_declaration(&value, "border") {
                value = css::append_declaration(&value, "border:1pt solid #000");
            }
            if !css::has_declaration(&value, "padding") {
                value = css::append_declaration(&value, "padding:4pt");
            }
            style = Some(value);
        }
        _ => {}
    }

    style
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
}
