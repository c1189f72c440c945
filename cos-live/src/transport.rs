//! Request model and transport
//!
//! Operations describe a call as a [`CosRequest`]; a [`RequestExecutor`]
//! signs it, sends it and returns the [`RawResponse`]. [`HttpExecutor`] is
//! the reqwest implementation used in production.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, HOST};
use reqwest::{Client, Method, StatusCode};
use tracing::debug;

use crate::auth::CosSigner;
use crate::config::CosConfig;
use crate::error::{LiveChannelError, MAX_RESPONSE_SIZE};

/// Response headers, keyed by lower-cased header name
pub type ResponseHeaders = HashMap<String, String>;

pub const REQUEST_ID_HEADER: &str = "x-cos-request-id";

/// Characters left unescaped: `A-Z a-z 0-9 - _ . ~`
pub(crate) const COS_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const COS_PATH_ENCODE_SET: &AsciiSet = &COS_ENCODE_SET.remove(b'/');

pub(crate) fn encode(s: &str) -> String {
    utf8_percent_encode(s, COS_ENCODE_SET).to_string()
}

/// One API call, before signing
#[derive(Debug, Clone)]
pub struct CosRequest {
    /// Operation name, used for logging
    pub operation: &'static str,
    pub method: Method,
    pub bucket: String,
    /// Object-style resource under the bucket (`ch1`, `ch1/vod.m3u8`); `None` addresses the bucket
    pub resource: Option<String>,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    /// Headers that must not appear on the wire
    pub forbidden_headers: Vec<HeaderName>,
    pub body: Option<Bytes>,
}

impl CosRequest {
    pub fn new(operation: &'static str, method: Method, bucket: impl Into<String>) -> Self {
        Self {
            operation,
            method,
            bucket: bucket.into(),
            resource: None,
            query: Vec::new(),
            headers: HeaderMap::new(),
            forbidden_headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn forbid_header(mut self, name: HeaderName) -> Self {
        self.headers.remove(&name);
        self.forbidden_headers.push(name);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Unescaped resource path, as signed
    #[must_use]
    pub fn resource_path(&self) -> String {
        match &self.resource {
            Some(resource) => format!("/{resource}"),
            None => "/".to_string(),
        }
    }

    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Query string in insertion order; keys with an empty value render bare (`?live`)
    #[must_use]
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    encode(k)
                } else {
                    format!("{}={}", encode(k), encode(v))
                }
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Headers that go on the wire
    #[must_use]
    pub fn outgoing_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        for name in &self.forbidden_headers {
            headers.remove(name);
        }
        headers
    }
}

/// Raw service response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: ResponseHeaders,
    pub body: Bytes,
}

impl RawResponse {
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.headers.get(REQUEST_ID_HEADER).map(String::as_str)
    }
}

/// Signs and sends a request
///
/// Implementations return `Err` only when no response was obtained; non-2xx
/// responses come back as `Ok`.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: CosRequest) -> Result<RawResponse, LiveChannelError>;
}

#[async_trait]
impl<E: RequestExecutor + ?Sized> RequestExecutor for Arc<E> {
    async fn execute(&self, request: CosRequest) -> Result<RawResponse, LiveChannelError> {
        (**self).execute(request).await
    }
}

/// reqwest-based executor with COS `Authorization` signing
pub struct HttpExecutor {
    config: Arc<CosConfig>,
    signer: CosSigner,
    client: Client,
}

impl HttpExecutor {
    /// Build an executor with its own connection pool
    pub fn new(config: Arc<CosConfig>) -> Result<Self, LiveChannelError> {
        // Redirects would send the signed request to a host it was not signed for.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_max_idle_per_host(10)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| LiveChannelError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            signer: CosSigner::from_config(&config),
            config,
            client,
        })
    }

    fn request_url(&self, request: &CosRequest) -> String {
        let path = utf8_percent_encode(&request.resource_path(), COS_PATH_ENCODE_SET).to_string();
        let query = request.query_string();
        let base = self.config.base_url(&request.bucket);
        if query.is_empty() {
            format!("{base}{path}")
        } else {
            format!("{base}{path}?{query}")
        }
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, request: CosRequest) -> Result<RawResponse, LiveChannelError> {
        let url = url::Url::parse(&self.request_url(&request))?;
        let host = self.config.bucket_host(&request.bucket);

        let mut headers = request.outgoing_headers();
        headers.insert(HOST, HeaderValue::from_str(&host)?);

        let now = chrono::Utc::now().timestamp();
        let signature = self.signer.sign_request(
            &request,
            &headers,
            now,
            self.config.sign_expire_secs,
        )?;
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&signature.authorization())?);

        debug!(
            operation = request.operation,
            method = %request.method,
            url = %url,
            "Sending COS request"
        );

        // An explicit (possibly empty) body gives a fixed Content-Length, so the
        // request is never chunked.
        let body = request.body.unwrap_or_default();
        let response = self
            .client
            .request(request.method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let raw = read_response(response).await?;
        debug!(status = %raw.status, bytes = raw.body.len(), "Received COS response");
        Ok(raw)
    }
}

fn collect_headers(headers: &HeaderMap) -> ResponseHeaders {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

/// Read a response, enforcing [`MAX_RESPONSE_SIZE`]
///
/// Status and headers are taken first; failures while reading the body keep them.
async fn read_response(response: reqwest::Response) -> Result<RawResponse, LiveChannelError> {
    let status = response.status();
    let headers = collect_headers(response.headers());

    if let Err(size) = check_size(response.content_length()) {
        return Err(LiveChannelError::ResponseTooLarge {
            status,
            size,
            headers,
        });
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => {
            return Err(LiveChannelError::Body {
                status,
                message: e.to_string(),
                headers,
            })
        }
    };
    if let Err(size) = check_size(Some(body.len() as u64)) {
        return Err(LiveChannelError::ResponseTooLarge {
            status,
            size,
            headers,
        });
    }

    Ok(RawResponse {
        status,
        headers,
        body,
    })
}

fn check_size(len: Option<u64>) -> Result<(), u64> {
    match len {
        Some(len) if len > MAX_RESPONSE_SIZE as u64 => Err(len),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{CONTENT_TYPE, EXPECT, TRANSFER_ENCODING};

    fn executor(config: CosConfig) -> HttpExecutor {
        HttpExecutor::new(Arc::new(config)).unwrap()
    }

    #[test]
    fn test_query_string_bare_keys() {
        let request = CosRequest::new("test", Method::GET, "b-1")
            .with_query("live", "")
            .with_query("comp", "stat");
        assert_eq!(request.query_string(), "live&comp=stat");
        assert_eq!(request.query_value("comp"), Some("stat"));
        assert_eq!(request.query_value("live"), Some(""));
        assert_eq!(request.query_value("vod"), None);
    }

    #[test]
    fn test_query_string_encodes_values() {
        let request = CosRequest::new("test", Method::GET, "b-1").with_query("prefix", "a b/c");
        assert_eq!(request.query_string(), "prefix=a%20b%2Fc");
    }

    #[test]
    fn test_resource_path() {
        let bucket = CosRequest::new("test", Method::GET, "b-1");
        assert_eq!(bucket.resource_path(), "/");

        let object = bucket.with_resource("ch1/testvod.m3u8");
        assert_eq!(object.resource_path(), "/ch1/testvod.m3u8");
    }

    #[test]
    fn test_forbidden_headers_are_not_sent() {
        let request = CosRequest::new("test", Method::PUT, "b-1")
            .with_header(EXPECT, HeaderValue::from_static("100-continue"))
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/xml"))
            .forbid_header(EXPECT)
            .forbid_header(TRANSFER_ENCODING);

        let outgoing = request.outgoing_headers();
        assert!(outgoing.get(EXPECT).is_none());
        assert!(outgoing.get(TRANSFER_ENCODING).is_none());
        assert!(outgoing.get(CONTENT_TYPE).is_some());
    }

    #[test]
    fn test_request_url() {
        let exec = executor(CosConfig::default());
        let request = CosRequest::new("test", Method::PUT, "b-1")
            .with_resource("my ch")
            .with_query("live", "")
            .with_query("switch", "enabled");
        assert_eq!(
            exec.request_url(&request),
            "https://b-1.cos.ap-guangzhou.myqcloud.com/my%20ch?live&switch=enabled"
        );

        let list = CosRequest::new("test", Method::GET, "b-1");
        assert_eq!(
            exec.request_url(&list),
            "https://b-1.cos.ap-guangzhou.myqcloud.com/"
        );
    }

    #[test]
    fn test_check_size() {
        assert!(check_size(None).is_ok());
        assert!(check_size(Some(MAX_RESPONSE_SIZE as u64)).is_ok());
        assert_eq!(
            check_size(Some(MAX_RESPONSE_SIZE as u64 + 1)),
            Err(MAX_RESPONSE_SIZE as u64 + 1)
        );
    }

    #[test]
    fn test_collect_headers_lowercases() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Cos-Request-Id", HeaderValue::from_static("abc"));
        let collected = collect_headers(&headers);
        assert_eq!(collected.get("x-cos-request-id").map(String::as_str), Some("abc"));
    }
}
