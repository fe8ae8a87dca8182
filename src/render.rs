// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

// Rendering surfaces.
//
// The stream processor and the widget never touch a concrete UI; they
// drive a `Surface`. `TranscriptSurface` builds the HTML transcript an
// embedding webview consumes. `ConsoleSurface` is the terminal
// front-end used by the binary.

use crate::format;
use crate::session::ChatSession;
use crate::stream::{Product, ToolUse};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Opaque handle to one in-progress assistant message.
pub type MessageId = usize;

// ---------------------------------------------------------------------------
// Surface trait
// ---------------------------------------------------------------------------

/// Target rendering surface for chat output.
///
/// Implementations own all presentation concerns. Methods take `&self`;
/// implementations use interior mutability because the processor, the
/// widget, and the poller share one surface.
pub trait Surface: Send + Sync {
    /// Echo a message the user sent.
    fn user_message(&self, text: &str);

    /// Create a new empty assistant message and return its handle.
    fn begin_assistant_message(&self) -> MessageId;

    /// Append raw text to an in-progress message (plain rendering).
    fn append_text(&self, id: MessageId, text: &str);

    /// Replace a message's text entirely (used for failure strings).
    fn set_text(&self, id: MessageId, text: &str);

    /// Apply markdown and link formatting to a complete message.
    fn finalize_message(&self, id: MessageId);

    fn show_typing(&self);
    fn hide_typing(&self);

    /// Render a product carousel.
    fn render_products(&self, products: &[Product]);

    /// Render an expandable tool-call summary.
    fn render_tool_use(&self, tool: &ToolUse);

    /// Show a static assistant-style line (welcome, failure, status).
    fn notice(&self, text: &str);

    /// Present the authentication window for the given URL.
    fn open_auth(&self, url: &str);
}

// ---------------------------------------------------------------------------
// TranscriptSurface
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Entry {
    User(String),
    Assistant { raw: String, html: Option<String> },
    Notice(String),
    Products(Vec<Product>),
    ToolUse(ToolUse),
}

/// Surface that accumulates an HTML transcript.
///
/// Assistant messages are kept as raw text while streaming and rendered
/// to HTML on finalize. Auth URLs discovered during formatting are
/// remembered in the session for the popup flow.
pub struct TranscriptSurface {
    session: Arc<ChatSession>,
    entries: Mutex<Vec<Entry>>,
    typing: AtomicBool,
}

impl TranscriptSurface {
    pub fn new(session: Arc<ChatSession>) -> Self {
        Self {
            session,
            entries: Mutex::new(Vec::new()),
            typing: AtomicBool::new(false),
        }
    }

    pub fn typing(&self) -> bool {
        self.typing.load(Ordering::Relaxed)
    }

    /// Raw text of an assistant message (empty for other entries).
    pub fn raw_text(&self, id: MessageId) -> String {
        let entries = self.entries.lock().expect("transcript lock");
        match entries.get(id) {
            Some(Entry::Assistant { raw, .. }) => raw.clone(),
            _ => String::new(),
        }
    }

    /// Render the whole transcript as HTML.
    pub fn to_html(&self) -> String {
        let entries = self.entries.lock().expect("transcript lock");
        let mut out = String::new();
        for entry in entries.iter() {
            match entry {
                Entry::User(text) => {
                    out.push_str(&format!(r#"<div class="user-message"><p>{text}</p></div>"#));
                }
                Entry::Assistant { raw, html } => match html {
                    Some(html) => {
                        out.push_str(&format!(r#"<div class="ai-message">{html}</div>"#));
                    }
                    None => {
                        out.push_str(&format!(r#"<div class="ai-message">{raw}</div>"#));
                    }
                },
                Entry::Notice(text) => {
                    out.push_str(&format!(r#"<div class="ai-message"><p>{text}</p></div>"#));
                }
                Entry::Products(products) => {
                    out.push_str(r#"<div class="product-grid">"#);
                    if products.is_empty() {
                        out.push_str("<p>No products found</p>");
                    }
                    for p in products {
                        out.push_str(&format!(
                            r#"<div class="product-card"><h3>{}</h3><p>{}</p></div>"#,
                            p.title, p.price
                        ));
                    }
                    out.push_str("</div>");
                }
                Entry::ToolUse(tool) => match tool {
                    ToolUse::Call { name, arguments } => {
                        out.push_str(&format!(
                            r#"<div class="tool-use"><span>Calling tool: {name}</span><pre>{}</pre></div>"#,
                            serde_json::to_string_pretty(arguments).unwrap_or_default()
                        ));
                    }
                    ToolUse::Raw(text) => {
                        out.push_str(&format!(r#"<div class="tool-use">{text}</div>"#));
                    }
                },
            }
        }
        out
    }
}

impl Surface for TranscriptSurface {
    fn user_message(&self, text: &str) {
        self.entries
            .lock()
            .expect("transcript lock")
            .push(Entry::User(text.to_string()));
    }

    fn begin_assistant_message(&self) -> MessageId {
        let mut entries = self.entries.lock().expect("transcript lock");
        entries.push(Entry::Assistant {
            raw: String::new(),
            html: None,
        });
        entries.len() - 1
    }

    fn append_text(&self, id: MessageId, text: &str) {
        let mut entries = self.entries.lock().expect("transcript lock");
        if let Some(Entry::Assistant { raw, html }) = entries.get_mut(id) {
            raw.push_str(text);
            // Streaming text renders plain until the next finalize.
            *html = None;
        }
    }

    fn set_text(&self, id: MessageId, text: &str) {
        let mut entries = self.entries.lock().expect("transcript lock");
        if let Some(Entry::Assistant { raw, html }) = entries.get_mut(id) {
            *raw = text.to_string();
            *html = None;
        }
    }

    fn finalize_message(&self, id: MessageId) {
        let mut entries = self.entries.lock().expect("transcript lock");
        if let Some(Entry::Assistant { raw, html }) = entries.get_mut(id) {
            let outcome = format::format_message(raw);
            if let Some(url) = &outcome.auth_url {
                self.session.set_auth_url(url);
            }
            *html = Some(outcome.html);
        }
    }

    fn show_typing(&self) {
        self.typing.store(true, Ordering::Relaxed);
    }

    fn hide_typing(&self) {
        self.typing.store(false, Ordering::Relaxed);
    }

    fn render_products(&self, products: &[Product]) {
        self.entries
            .lock()
            .expect("transcript lock")
            .push(Entry::Products(products.to_vec()));
    }

    fn render_tool_use(&self, tool: &ToolUse) {
        self.entries
            .lock()
            .expect("transcript lock")
            .push(Entry::ToolUse(tool.clone()));
    }

    fn notice(&self, text: &str) {
        self.entries
            .lock()
            .expect("transcript lock")
            .push(Entry::Notice(text.to_string()));
    }

    fn open_auth(&self, url: &str) {
        // No window to open; the embedder reads the URL out of the
        // transcript's session. Record it as a notice so it is visible.
        self.notice(&format!("Sign in to continue: {url}"));
    }
}

// ---------------------------------------------------------------------------
// ConsoleSurface
// ---------------------------------------------------------------------------

/// Terminal surface: streams assistant text to stdout as it arrives.
pub struct ConsoleSurface {
    next_id: Mutex<MessageId>,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(0),
        }
    }

    fn println(text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{text}");
    }
}

impl Default for ConsoleSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for ConsoleSurface {
    fn user_message(&self, text: &str) {
        Self::println(&format!("you> {text}"));
    }

    fn begin_assistant_message(&self) -> MessageId {
        let mut next = self.next_id.lock().expect("console lock");
        let id = *next;
        *next += 1;
        id
    }

    fn append_text(&self, _id: MessageId, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "{text}");
        let _ = stdout.flush();
    }

    fn set_text(&self, _id: MessageId, text: &str) {
        Self::println("");
        Self::println(text);
    }

    fn finalize_message(&self, _id: MessageId) {
        // Text already streamed; just end the line.
        Self::println("");
    }

    fn show_typing(&self) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "...");
        let _ = stderr.flush();
    }

    fn hide_typing(&self) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r   \r");
        let _ = stderr.flush();
    }

    fn render_products(&self, products: &[Product]) {
        Self::println("");
        Self::println("Top matched products:");
        if products.is_empty() {
            Self::println("  (no products found)");
        }
        for p in products {
            match &p.url {
                Some(url) => Self::println(&format!("  - {}: {} ({url})", p.title, p.price)),
                None => Self::println(&format!("  - {}: {}", p.title, p.price)),
            }
        }
    }

    fn render_tool_use(&self, tool: &ToolUse) {
        match tool {
            ToolUse::Call { name, arguments } => {
                Self::println(&format!(
                    "[tool] {name} {}",
                    serde_json::to_string(arguments).unwrap_or_default()
                ));
            }
            ToolUse::Raw(text) => Self::println(&format!("[tool] {text}")),
        }
    }

    fn notice(&self, text: &str) {
        Self::println(text);
    }

    fn open_auth(&self, url: &str) {
        Self::println(&format!("Open this link in your browser to sign in: {url}"));
    }
}
