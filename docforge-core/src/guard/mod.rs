//! Typography protocol guard
//!
//! Rewrites arbitrary model- or user-produced HTML into the constrained
//! dialect that pastes cleanly into a word processor, and reports what it
//! changed. Parsing is delegated to the borrowed HTML parser; the guard is
//! a thin rewrite pass over the resulting tree. Every step is independent
//! and idempotent, so running the guard over already-guarded output changes
//! nothing further.

mod css;
mod serialize;

use crate::protocol::TypographyDefaults;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Counters describing one guard invocation. Purely descriptive; nothing
/// feeds back into the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardReport {
    pub removed_style_tags: u32,
    pub removed_stylesheet_links: u32,
    pub converted_units: u32,
    pub tables_processed: u32,
    pub math_nodes_removed: u32,
    pub enforced_body_style: bool,
}

/// Normalized body markup plus the change report
#[derive(Debug, Clone)]
pub struct GuardedHtml {
    /// Serialized inner markup of the document body
    pub html: String,
    pub report: GuardReport,
}

/// The body style every guarded document is presented under: quoted font
/// family with a SimSun/serif fallback chain, point size, fixed line
/// height, zero margin and padding. Callers apply this to whatever wrapper
/// they paste the returned fragment into.
pub fn enforced_body_style(typography: &TypographyDefaults) -> String {
    format!(
        "font-family:'{}', 'SimSun', serif; font-size:{}pt; line-height:1.5; margin:0; padding:0",
        typography.font_family,
        typography.font_size()
    )
}

/// Rewrite `html` into the paste-safe dialect.
///
/// Steps, in order: drop `<style>` and stylesheet `<link>` elements,
/// convert inline pixel lengths to points (1px = 0.75pt, counted per
/// token), normalize tables and cells (collapsed borders, default border
/// and padding in pt, centered when no alignment is declared), unwrap math
/// markup while keeping its text, and enforce the body style. Malformed
/// input never fails; whatever the parser recovers is normalized
/// best-effort.
pub fn guard_html(html: &str, typography: &TypographyDefaults) -> GuardedHtml {
    let document = Html::parse_document(html);
    let mut report = GuardReport::default();

    let style_sel = Selector::parse("style").unwrap();
    let stylesheet_sel = Selector::parse(r#"link[rel="stylesheet"]"#).unwrap();
    let table_sel = Selector::parse("table").unwrap();
    let math_sel = Selector::parse("math").unwrap();
    let body_sel = Selector::parse("body").unwrap();

    report.removed_style_tags = document.select(&style_sel).count() as u32;
    report.removed_stylesheet_links = document.select(&stylesheet_sel).count() as u32;
    report.tables_processed = document.select(&table_sel).count() as u32;
    report.math_nodes_removed = document.select(&math_sel).count() as u32;

    let px_pattern = Regex::new(css::PX_LENGTH_PATTERN).unwrap();
    let mut out = String::with_capacity(html.len());
    if let Some(body) = document.select(&body_sel).next() {
        let mut pass = serialize::GuardPass {
            px_pattern: &px_pattern,
            converted_units: &mut report.converted_units,
        };
        serialize::serialize_children(body, &mut pass, &mut out);
    }

    report.enforced_body_style = true;

    debug!(
        removed_style_tags = report.removed_style_tags,
        removed_stylesheet_links = report.removed_stylesheet_links,
        converted_units = report.converted_units,
        tables_processed = report.tables_processed,
        math_nodes_removed = report.math_nodes_removed,
        "guarded document"
    );

    GuardedHtml { html: out, report }
}
