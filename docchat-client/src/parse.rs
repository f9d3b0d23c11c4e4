//! Event-line payload parsing.

use docchat_types::StreamEvent;

/// Parse the payload of one `data:` line into a [`StreamEvent`].
///
/// Unknown `type` values and payloads that fail to deserialize are skipped:
/// one garbled line never aborts an otherwise healthy stream.
pub fn parse_event(payload: &str) -> Option<StreamEvent> {
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(error = %e, payload_len = payload.len(), "skipping unparsable event line");
            None
        }
    }
}
