// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

// Chat response streaming.
//
// Responsibilities:
// - Decode the response byte stream incrementally (multi-byte safe)
// - Reassemble `data: <json>\n\n` records across read boundaries
// - Parse records into a closed tagged event type with an Unknown fallback
// - Dispatch events to the rendering surface strictly in arrival order
// - Skip malformed records; abort only on transport failure

mod decoder;
mod event;
mod processor;
mod types;

pub use decoder::Utf8Decoder;
pub use event::{Product, StreamEvent, ToolUse};
pub use processor::StreamEventProcessor;
pub use types::{StreamError, GENERIC_FAILURE, SERVER_BUSY};
