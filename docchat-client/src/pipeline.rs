//! Bytes-to-events pipeline: decoder, framer, and parser in sequence.

use docchat_types::StreamEvent;

use crate::decode::ChunkDecoder;
use crate::framing::{LineFramer, data_payload};
use crate::parse::parse_event;

/// Turns body chunks into [`StreamEvent`]s, independent of how the body was
/// split into chunks.
#[derive(Debug, Default)]
pub struct EventPipeline {
    decoder: ChunkDecoder,
    framer: LineFramer,
}

impl EventPipeline {
    /// Create a pipeline with empty carry-over state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one body chunk and return the events of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let text = self.decoder.decode(chunk);
        self.framer
            .feed(&text)
            .iter()
            .filter_map(|line| data_payload(line).and_then(parse_event))
            .collect()
    }

    /// Flush at end of body: decode held-over bytes and parse the final
    /// unterminated line, if any.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let tail = self.decoder.finish();
        let mut lines = self.framer.feed(&tail);
        lines.extend(self.framer.flush());
        lines
            .iter()
            .filter_map(|line| data_payload(line).and_then(parse_event))
            .collect()
    }
}
