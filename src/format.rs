// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

// Markdown and link formatting for assistant messages.
//
// The stream delivers raw text; messages are rendered as plain text
// while streaming and converted to HTML once complete. The conversion
// is the widget's small dialect: bold spans, contiguous bullet or
// numbered lines grouped into one list, paragraphs, and link rewriting
// with two special cases (auth triggers and checkout links).

use std::sync::OnceLock;

/// Result of formatting one message.
pub struct FormatOutcome {
    pub html: String,
    /// Auth URL discovered in an auth-trigger link, to be remembered
    /// for the popup flow.
    pub auth_url: Option<String>,
}

fn link_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link pattern is valid")
    })
}

fn unordered_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"^\s*[-*]\s+(.*)").expect("unordered list pattern is valid")
    })
}

fn ordered_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"^\s*(\d+)[.)]\s+(.*)").expect("ordered list pattern is valid")
    })
}

/// Format a complete raw message into HTML.
///
/// Links are rewritten before list/paragraph conversion so that the
/// generated anchors survive untouched.
pub fn format_message(raw: &str) -> FormatOutcome {
    let mut auth_url = None;
    let linked = rewrite_links(raw, &mut auth_url);
    FormatOutcome {
        html: convert_markdown(&linked),
        auth_url,
    }
}

/// Rewrite `[text](url)` links.
///
/// Authentication-provider URLs become `#auth` trigger anchors and are
/// reported to the caller; cart/checkout URLs get fixed anchor text;
/// everything else becomes an ordinary external link.
fn rewrite_links(text: &str, auth_url: &mut Option<String>) -> String {
    link_pattern()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let label = &caps[1];
            let url = &caps[2];
            if url.contains("shopify.com/authentication")
                && (url.contains("oauth/authorize") || url.contains("authentication"))
            {
                *auth_url = Some(url.to_string());
                format!(r##"<a href="#auth" class="auth-trigger">{label}</a>"##)
            } else if url.contains("/cart") || url.contains("checkout") {
                format!(
                    r#"<a href="{url}" target="_blank" rel="noopener noreferrer">click here to proceed to checkout</a>"#
                )
            } else {
                format!(
                    r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{label}</a>"#
                )
            }
        })
        .into_owned()
}

#[derive(PartialEq, Clone, Copy)]
enum ListKind {
    Unordered,
    Ordered,
}

/// Convert the markdown dialect to HTML.
fn convert_markdown(text: &str) -> String {
    // `regex` has no backreferences, so the original's single
    // `(\*\*|__)(.*?)\1` pattern is two passes here.
    static BOLD_STARS: OnceLock<regex::Regex> = OnceLock::new();
    static BOLD_UNDERSCORES: OnceLock<regex::Regex> = OnceLock::new();
    let stars =
        BOLD_STARS.get_or_init(|| regex::Regex::new(r"\*\*(.*?)\*\*").expect("valid pattern"));
    let underscores =
        BOLD_UNDERSCORES.get_or_init(|| regex::Regex::new(r"__(.*?)__").expect("valid pattern"));

    let text = stars.replace_all(text, "<strong>$1</strong>");
    let text = underscores.replace_all(&text, "<strong>$1</strong>");

    let mut html = String::new();
    let mut current: Option<ListKind> = None;
    let mut items: Vec<String> = Vec::new();
    let mut start_number: u64 = 1;

    let flush = |html: &mut String,
                 current: &mut Option<ListKind>,
                 items: &mut Vec<String>,
                 start_number: u64| {
        match current.take() {
            Some(ListKind::Unordered) => {
                html.push_str(&format!("<ul>{}</ul>", items.concat()));
            }
            Some(ListKind::Ordered) => {
                html.push_str(&format!(r#"<ol start="{start_number}">{}</ol>"#, items.concat()));
            }
            None => {}
        }
        items.clear();
    };

    for line in text.split('\n') {
        if let Some(caps) = unordered_pattern().captures(line) {
            if current != Some(ListKind::Unordered) {
                flush(&mut html, &mut current, &mut items, start_number);
                current = Some(ListKind::Unordered);
            }
            items.push(format!("<li>{}</li>", &caps[1]));
        } else if let Some(caps) = ordered_pattern().captures(line) {
            if current != Some(ListKind::Ordered) {
                flush(&mut html, &mut current, &mut items, start_number);
                current = Some(ListKind::Ordered);
                // The list starts at whatever number the first item used.
                start_number = caps[1].parse().unwrap_or(1);
            }
            items.push(format!("<li>{}</li>", &caps[2]));
        } else {
            flush(&mut html, &mut current, &mut items, start_number);
            if line.trim().is_empty() {
                html.push_str("<br>");
            } else {
                html.push_str(&format!("<p>{line}</p>"));
            }
        }
    }
    flush(&mut html, &mut current, &mut items, start_number);

    html.replace("</p><p>", "</p>\n<p>")
}
