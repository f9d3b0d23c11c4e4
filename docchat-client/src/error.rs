//! Internal helpers for mapping HTTP/reqwest errors to [`ApiError`].

use std::time::Duration;

use docchat_types::{ApiError, ErrorBody};

/// Map a non-success status and its body to [`ApiError::Status`].
///
/// The body's `detail` string wins; otherwise `fallback` is used.
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str, fallback: &str) -> ApiError {
    ApiError::Status {
        status: status.as_u16(),
        detail: ErrorBody::detail_from(body).unwrap_or_else(|| fallback.to_string()),
    }
}

/// Map a [`reqwest::Error`] to an [`ApiError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error, timeout: Option<Duration>) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout(timeout.unwrap_or_default())
    } else if err.is_decode() {
        ApiError::InvalidResponse(err.to_string())
    } else {
        ApiError::Network(Box::new(err))
    }
}

/// Return the response unchanged on success, or read its body and map the
/// failure with `fallback` as the default detail.
pub(crate) async fn check_status(
    response: reqwest::Response,
    fallback: &str,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    // A body that cannot be read is treated like an absent one.
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = %status, body_len = body.len(), "request failed");
    Err(map_http_status(status, &body, fallback))
}
