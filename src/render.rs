//! Markdown rendering of recommendation results.
//!
//! Output is deterministic: the same result always yields byte-identical
//! text, so reports can be diffed between runs.

use std::fmt::Write;

use crate::item::{format_published, Item};
use crate::recommend::RecommendResult;

const TITLE: &str = "# Recommended Items";

/// Render one result as a standalone report.
pub fn render_recommendation_markdown(result: &RecommendResult) -> String {
    let mut out = format!("{TITLE}\n\n");
    push_body(&mut out, result);
    out
}

/// Render several results under one title, each under its own `##` heading,
/// in the order given.
pub fn render_multi_recommendation_markdown<S: AsRef<str>>(
    sections: &[(S, RecommendResult)],
) -> String {
    let mut out = format!("{TITLE}\n");
    if sections.is_empty() {
        return out;
    }

    out.push('\n');
    for (heading, result) in sections {
        let _ = write!(out, "## {}\n\n", heading.as_ref());
        push_body(&mut out, result);
    }
    out
}

fn push_body(out: &mut String, result: &RecommendResult) {
    let meta = &result.meta;
    let mut wrote_meta = false;

    if let Some(strategy) = &meta.strategy {
        let _ = writeln!(out, "_Strategy_: {strategy}");
        wrote_meta = true;
    }
    if let Some(limit) = meta.limit {
        let _ = writeln!(out, "_Limit_: {limit}");
        wrote_meta = true;
    }
    if meta.strategy.as_deref() == Some("keyword_from_seen") {
        if let Some(keywords) = &meta.top_keywords {
            let _ = writeln!(out, "_Top keywords_: {}", format_keywords(keywords));
            wrote_meta = true;
        }
    }
    if wrote_meta {
        out.push('\n');
    }

    for (n, item) in result.items.iter().enumerate() {
        push_item(out, n + 1, item);
    }
}

fn format_keywords(keywords: &[(String, usize)]) -> String {
    if keywords.is_empty() {
        return "(none)".to_string();
    }
    keywords
        .iter()
        .map(|(keyword, weight)| format!("{keyword}({weight})"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_item(out: &mut String, n: usize, item: &Item) {
    let _ = writeln!(out, "## {n}. {}", item.title());
    let _ = writeln!(out, "- ID: `{}`", item.item_id());
    let _ = writeln!(out, "- Source: {}", item.source_type());
    let _ = writeln!(out, "- Channel: {}", item.source_url());
    let _ = writeln!(out, "- Published: {}", format_published(&item.published()));
    let _ = writeln!(out, "- Link: {}", item.link());
    out.push('\n');
}
