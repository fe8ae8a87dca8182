// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

// Stream event processor.
//
// Consumes the byte stream of one chat response, reassembles
// newline-delimited records, parses each as a tagged event, and drives
// the rendering surface in record order. Malformed records are skipped;
// a transport failure aborts the stream after one user-visible failure
// message. The processor never retries; re-sending is a user action.

use super::decoder::Utf8Decoder;
use super::event::{StreamEvent, ToolUse};
use super::types::{
    StreamError, DATA_PREFIX, GENERIC_FAILURE, RECORD_SEPARATOR, SERVER_BUSY,
};
use crate::client::TransportError;
use crate::render::{MessageId, Surface};
use crate::session::ChatSession;
use bytes::Bytes;
use std::sync::Arc;
use tokio_stream::{Stream, StreamExt};

/// Drives one chat response stream to completion.
///
/// The surface and session are injected; the processor owns no UI and
/// no transport. At most one assistant message is active at a time, and
/// a `new_message` event finalizes the current one before the next is
/// created.
pub struct StreamEventProcessor {
    surface: Arc<dyn Surface>,
    session: Arc<ChatSession>,
}

impl StreamEventProcessor {
    pub fn new(surface: Arc<dyn Surface>, session: Arc<ChatSession>) -> Self {
        Self { surface, session }
    }

    /// Consume the stream until the server closes it or transport fails.
    ///
    /// `user_message` is the message that started this stream; it is
    /// persisted when the server asks for authentication so the send
    /// can be resumed after the popup flow.
    pub async fn process(
        &self,
        mut input: impl Stream<Item = Result<Bytes, TransportError>> + Unpin,
        user_message: &str,
    ) {
        let mut decoder = Utf8Decoder::new();
        let mut buffer = String::new();
        let mut active = self.surface.begin_assistant_message();

        while let Some(read) = input.next().await {
            let chunk = match read {
                Ok(chunk) => chunk,
                Err(err) => {
                    tracing::warn!(error = %err, "chat stream transport failure");
                    self.surface.hide_typing();
                    self.surface.notice(GENERIC_FAILURE);
                    return;
                }
            };

            buffer.push_str(&decoder.decode(&chunk));

            // Everything before a separator is a complete record; the
            // remainder stays buffered for the next read.
            while let Some(pos) = buffer.find(RECORD_SEPARATOR) {
                let record: String = buffer.drain(..pos + RECORD_SEPARATOR.len()).collect();
                if let Some(event) = parse_record(&record[..pos]) {
                    self.dispatch(event, &mut active, user_message);
                }
            }
        }

        if decoder.has_pending() {
            tracing::debug!("stream ended inside a multi-byte character");
        }
        // Stream end: no forced finalize of the active message.
        self.surface.hide_typing();
    }

    fn dispatch(&self, event: StreamEvent, active: &mut MessageId, user_message: &str) {
        match event {
            StreamEvent::Id { conversation_id } => {
                if let Some(id) = conversation_id {
                    self.session.set_conversation_id(&id);
                }
            }
            StreamEvent::Chunk { chunk } => {
                self.surface.hide_typing();
                self.surface.append_text(*active, &chunk);
            }
            StreamEvent::MessageComplete => {
                self.surface.hide_typing();
                self.surface.finalize_message(*active);
            }
            StreamEvent::EndTurn => {
                self.surface.hide_typing();
            }
            StreamEvent::Error { error } => {
                tracing::error!(%error, "stream error event");
                self.surface.hide_typing();
                self.surface.set_text(*active, GENERIC_FAILURE);
            }
            StreamEvent::RateLimitExceeded { error } => {
                tracing::error!(%error, "rate limit exceeded");
                self.surface.hide_typing();
                self.surface.set_text(*active, SERVER_BUSY);
            }
            StreamEvent::AuthRequired => {
                self.session.set_last_user_message(user_message);
            }
            StreamEvent::ProductResults { products } => {
                self.surface.render_products(&products);
            }
            StreamEvent::ToolUse { tool_use_message } => {
                if let Some(message) = tool_use_message {
                    self.surface.render_tool_use(&ToolUse::parse(&message));
                }
            }
            StreamEvent::NewMessage => {
                // Finalize the previous message before any chunk can
                // land in the new one.
                self.surface.finalize_message(*active);
                self.surface.show_typing();
                *active = self.surface.begin_assistant_message();
            }
            StreamEvent::ContentBlockComplete => {
                self.surface.show_typing();
            }
            StreamEvent::Unknown => {}
        }
    }
}

/// Parse one complete record into an event.
///
/// Records without the `data: ` prefix are ignored. Records with the
/// prefix but an unparseable payload are logged and skipped.
fn parse_record(record: &str) -> Option<StreamEvent> {
    let payload = record.strip_prefix(DATA_PREFIX)?;
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(err) => {
            let err = StreamError::MalformedEvent(err);
            tracing::warn!(error = %err, record, "skipping malformed stream record");
            None
        }
    }
}
