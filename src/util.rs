use axum::http::{HeaderMap, header::AsHeaderName};

/// Header value as text; absent and non-visible-ASCII values are both `None`.
pub fn header_str(headers: &HeaderMap, key: impl AsHeaderName) -> Option<&str> {
    headers.get(key).and_then(|value| value.to_str().ok())
}
