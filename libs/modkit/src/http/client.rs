//! Traced HTTP client
//!
//! Wraps `reqwest::Client`, opens an `outgoing_http` span per request and
//! stamps a W3C `traceparent` header so downstream services can correlate.

use http::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use std::time::Duration;
use tracing::{Instrument, Level};

/// W3C Trace Context header name
pub const TRACEPARENT: &str = "traceparent";

#[derive(Clone)]
pub struct TracedClient {
    inner: reqwest::Client,
}

impl TracedClient {
    pub fn new(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Client with a total per-request timeout.
    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self::new(reqwest::Client::builder().timeout(timeout).build()?))
    }

    /// Execute a built request inside an `outgoing_http` span, injecting `traceparent`.
    pub async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let span = tracing::span!(
            Level::INFO, "outgoing_http",
            http.method = %req.method(),
            http.url = %req.url(),
            otel.kind = "client",
            http.status_code = tracing::field::Empty,
        );

        inject_trace_context(req.headers_mut());

        let response = self.inner.execute(req).instrument(span.clone()).await?;
        span.record("http.status_code", response.status().as_u16());
        Ok(response)
    }

    /// POST a JSON body.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> reqwest::Result<reqwest::Response> {
        let req = self.inner.post(url).json(body).build()?;
        self.execute(req).await
    }
}

/// Stamp a fresh sampled `traceparent` (version 00) on `headers`.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    let trace_id = format!("{:032x}", rand::random::<u128>());
    let span_id = format!("{:016x}", rand::random::<u64>());
    let traceparent = format!("00-{trace_id}-{span_id}-01");

    if let Ok(value) = HeaderValue::from_str(&traceparent) {
        headers.insert(HeaderName::from_static(TRACEPARENT), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn traceparent_has_w3c_shape() {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);

        let header = headers.get(TRACEPARENT).unwrap().to_str().unwrap();
        let parts: Vec<&str> = header.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "00");
        assert_eq!(parts[1].len(), 32);
        assert_eq!(parts[2].len(), 16);
        assert_eq!(parts[3], "01");
    }

    #[tokio::test]
    async fn post_json_sends_body_and_traceparent() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/send")
                .header_exists("traceparent")
                .json_body(serde_json::json!({ "hello": "world" }));
            then.status(202);
        });

        let client = TracedClient::with_timeout(Duration::from_secs(5)).unwrap();
        let resp = client
            .post_json(&server.url("/send"), &serde_json::json!({ "hello": "world" }))
            .await
            .unwrap();

        assert_eq!(resp.status().as_u16(), 202);
        m.assert();
    }
}
