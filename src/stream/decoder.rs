// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

// Incremental UTF-8 decoding.
//
// Network reads can split a multi-byte character across two chunks.
// The decoder carries the incomplete trailing bytes of each chunk into
// the next call, so the character decodes correctly once both halves
// have arrived. Invalid sequences become U+FFFD and decoding continues.

/// Streaming UTF-8 decoder with carry-over of incomplete sequences.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Incomplete trailing bytes from the previous chunk (at most 3).
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(chunk);

        let mut out = String::with_capacity(buf.len());
        let mut start = 0;
        while start < buf.len() {
            match std::str::from_utf8(&buf[start..]) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(
                        std::str::from_utf8(&buf[start..start + valid]).unwrap_or_default(),
                    );
                    match err.error_len() {
                        Some(bad) => {
                            // Truly invalid bytes; replace and resume after them.
                            out.push('\u{FFFD}');
                            start += valid + bad;
                        }
                        None => {
                            // Incomplete sequence at the end; keep for next chunk.
                            self.pending = buf[start + valid..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Bytes still waiting for a continuation (useful at stream end).
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
