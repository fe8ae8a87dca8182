// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

// Stream processing constants and errors.

/// Separator between records on the chat stream.
pub const RECORD_SEPARATOR: &str = "\n\n";

/// Prefix a record must carry to be parsed as an event.
pub const DATA_PREFIX: &str = "data: ";

/// Shown when the stream or a request fails.
pub const GENERIC_FAILURE: &str =
    "Sorry, I couldn't process your request. Please try again later.";

/// Shown when the server reports rate limiting.
pub const SERVER_BUSY: &str = "Sorry, our servers are currently busy. Please try again later.";

/// Errors that can occur while parsing stream records.
///
/// Malformed records are logged and skipped; they never abort the
/// stream. Transport-level failures are surfaced by the reader itself
/// (see `client::TransportError`).
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("malformed stream event: {0}")]
    MalformedEvent(#[from] serde_json::Error),
}
