// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

// Stream event wire types.
//
// Each `data:` record on the chat stream carries a JSON object with a
// `type` discriminant. The enum below is closed: every known kind has a
// variant, and anything else lands in `Unknown` so that new server-side
// event kinds never break an already-deployed widget.

use serde::Deserialize;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// StreamEvent
// ---------------------------------------------------------------------------

/// One parsed record from the chat response stream.
///
/// Field names follow the wire format exactly (`conversation_id`,
/// `chunk`, `tool_use_message`, ...). Unrecognized `type` values
/// deserialize to `Unknown` and are ignored by the processor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Server-assigned conversation id, persisted for the session.
    Id {
        #[serde(default)]
        conversation_id: Option<String>,
    },
    /// A piece of assistant text for the active message.
    Chunk {
        #[serde(default)]
        chunk: String,
    },
    /// The active message is textually complete; apply formatting.
    MessageComplete,
    /// The assistant's turn is over.
    EndTurn,
    /// Server-side failure; replaces the active message text.
    Error {
        #[serde(default)]
        error: String,
    },
    /// Server is shedding load; replaces the active message text.
    RateLimitExceeded {
        #[serde(default)]
        error: String,
    },
    /// The user must authenticate before the request can proceed.
    AuthRequired,
    /// Product search results for the carousel.
    ProductResults {
        #[serde(default)]
        products: Vec<Product>,
    },
    /// The assistant invoked a tool; shown as an expandable summary.
    ToolUse {
        #[serde(default)]
        tool_use_message: Option<String>,
    },
    /// Boundary between assistant messages within one turn.
    NewMessage,
    /// A content block finished; more output is coming.
    ContentBlockComplete,
    /// Forward-compatible fallback for unrecognized `type` values.
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A single product entry from a `product_results` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Display string, already formatted by the server (e.g. "$49.00").
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// ToolUse
// ---------------------------------------------------------------------------

/// A tool invocation extracted from a `tool_use` event message.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolUse {
    /// The message matched the "Calling tool: NAME with arguments: ARGS"
    /// shape. `arguments` is the parsed JSON, or the raw argument string
    /// wrapped in a JSON string when it isn't valid JSON.
    Call {
        name: String,
        arguments: serde_json::Value,
    },
    /// The message did not match; render it as plain text.
    Raw(String),
}

fn tool_call_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"Calling tool: (\w+) with arguments: (.+)")
            .expect("tool call pattern is valid")
    })
}

impl ToolUse {
    /// Parse a tool-use message, degrading to `Raw` when it does not
    /// match the expected shape.
    pub fn parse(message: &str) -> ToolUse {
        match tool_call_pattern().captures(message) {
            Some(caps) => {
                let name = caps[1].to_string();
                let args_str = caps[2].to_string();
                let arguments = serde_json::from_str(&args_str)
                    .unwrap_or(serde_json::Value::String(args_str));
                ToolUse::Call { name, arguments }
            }
            None => ToolUse::Raw(message.to_string()),
        }
    }
}
