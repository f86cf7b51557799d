use axum::http::HeaderMap;
use uuid::Uuid;

use crate::middleware::REQUEST_ID_HEADER;

/// Per-request context, inserted into request extensions by the middleware.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: Uuid,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::now_v7(),
        }
    }

    /// Reuse the caller's `x-request-id` when it is a UUID, otherwise mint one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<Uuid>().ok())
            .map(|request_id| Self { request_id })
            .unwrap_or_default()
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reuses_incoming_request_id() {
        let id = Uuid::now_v7();
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());

        assert_eq!(RequestContext::from_headers(&headers).request_id(), id);
    }

    #[test]
    fn mints_id_when_header_is_missing_or_garbage() {
        let mut headers = HeaderMap::new();
        let minted = RequestContext::from_headers(&headers).request_id();
        assert!(!minted.is_nil());

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        let other = RequestContext::from_headers(&headers).request_id();
        assert_ne!(other, minted);
    }
}
