//! Test helpers and fixtures for cos-live tests
//!
//! [`RecordingExecutor`] stands in for the HTTP transport: it records every
//! request it is handed and answers from a queue of canned responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;

use crate::config::CosConfig;
use crate::error::LiveChannelError;
use crate::live::LiveChannelClient;
use crate::transport::{CosRequest, RawResponse, RequestExecutor, ResponseHeaders, REQUEST_ID_HEADER};

pub const TEST_REQUEST_ID: &str = "NWQ4ZmQzZjNfOWRhNzJhMDlfMTYyYjFfMmJm";

/// Config with test credentials
pub fn test_config() -> CosConfig {
    CosConfig {
        secret_id: "AKIDexample".to_string(),
        secret_key: "secretkey".to_string(),
        app_id: "1250000000".to_string(),
        ..CosConfig::default()
    }
}

/// Test fixture builder for RawResponse
pub struct ResponseFixture {
    status: StatusCode,
    headers: ResponseHeaders,
    body: String,
}

impl ResponseFixture {
    pub fn new(status: StatusCode) -> Self {
        let mut headers = ResponseHeaders::new();
        headers.insert(REQUEST_ID_HEADER.to_string(), TEST_REQUEST_ID.to_string());
        headers.insert("server".to_string(), "tencent-cos".to_string());
        Self {
            status,
            headers,
            body: String::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn without_request_id(mut self) -> Self {
        self.headers.remove(REQUEST_ID_HEADER);
        self
    }

    pub fn build(self) -> RawResponse {
        RawResponse {
            status: self.status,
            headers: self.headers,
            body: Bytes::from(self.body),
        }
    }
}

/// Executor that records requests and replays canned responses in order
#[derive(Default)]
pub struct RecordingExecutor {
    requests: Mutex<Vec<CosRequest>>,
    responses: Mutex<VecDeque<Result<RawResponse, LiveChannelError>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: ResponseFixture) -> Self {
        self.push(Ok(response.build()));
        self
    }

    pub fn fail(self, error: LiveChannelError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, response: Result<RawResponse, LiveChannelError>) {
        self.responses
            .lock()
            .expect("responses lock poisoned")
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<CosRequest> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }

    pub fn last_request(&self) -> CosRequest {
        self.requests()
            .pop()
            .expect("no request was executed")
    }
}

#[async_trait]
impl RequestExecutor for RecordingExecutor {
    async fn execute(&self, request: CosRequest) -> Result<RawResponse, LiveChannelError> {
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .push(request);
        self.responses
            .lock()
            .expect("responses lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(ResponseFixture::ok().build()))
    }
}

/// Client over a shared recording executor, so tests can inspect requests afterwards
pub fn test_client(
    executor: RecordingExecutor,
) -> (LiveChannelClient<Arc<RecordingExecutor>>, Arc<RecordingExecutor>) {
    let executor = Arc::new(executor);
    let client = LiveChannelClient::with_executor(test_config(), Arc::clone(&executor));
    (client, executor)
}
