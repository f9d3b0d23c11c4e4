//! Line framing for the `data:`-prefixed event stream.

/// Prefix that marks an event line.
pub const DATA_PREFIX: &str = "data: ";

/// Splits decoded text into newline-terminated lines.
///
/// Text after the last newline is kept in the buffer until the next
/// [`feed`](LineFramer::feed) or the final [`flush`](LineFramer::flush).
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: String,
}

impl LineFramer {
    /// Create an empty framer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and return every line it completed, without terminators.
    ///
    /// A `\r` before the `\n` is stripped as well.
    pub fn feed(&mut self, text: &str) -> Vec<String> {
        self.buf.push_str(text);

        let Some(last_newline) = self.buf.rfind('\n') else {
            return Vec::new();
        };
        let remainder = self.buf.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buf, remainder);

        complete
            .split_terminator('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect()
    }

    /// Take the trailing partial line at end of stream, if any.
    pub fn flush(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buf);
        Some(match line.strip_suffix('\r') {
            Some(stripped) => stripped.to_string(),
            None => line,
        })
    }

    /// Bytes of partial line currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }
}

/// The payload of an event line, or `None` for blank, comment, and other
/// field lines.
#[must_use]
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
}
