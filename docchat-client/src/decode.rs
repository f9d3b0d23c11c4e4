//! Incremental UTF-8 decoding of response body chunks.

/// Replacement for bytes that can never form a valid character.
const REPLACEMENT: char = '\u{FFFD}';

/// Stateful UTF-8 decoder for a byte stream delivered in arbitrary chunks.
///
/// A multi-byte character split across two chunks is held back until its
/// remaining bytes arrive. At most three bytes are ever carried over.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    /// Leading bytes of a character whose tail has not arrived yet.
    pending: Vec<u8>,
}

impl ChunkDecoder {
    /// Create a decoder with no carried-over bytes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk, prefixed by any bytes held over from the last call.
    ///
    /// Invalid sequences become U+FFFD. An incomplete sequence at the end of
    /// the chunk is kept for the next call instead of being replaced.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(chunk);

        let mut out = String::with_capacity(buf.len());
        let mut rest = buf.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush at end of stream. Held-over bytes become a single U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT.to_string()
        }
    }

    /// Number of bytes currently carried over.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
