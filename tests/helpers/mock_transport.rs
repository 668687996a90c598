// Recording transports for driver tests.
//
// MockTransport answers from a queue of canned responses and records every
// request it receives, so tests can assert URLs, headers, bodies and call
// counts without any network.
//
// RewriteTransport forwards to the real reqwest transport, replacing the
// scheme and host of each gateway URL with a local mock server address.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use easypay::gateways::{HttpTransport, ReqwestTransport, TransportError, TransportRequest};
use serde_json::Value;
use url::Url;

#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, response: Result<Value, TransportError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_ok(&self, body: Value) {
        self.push(Ok(body));
    }

    pub fn push_status(&self, status: u16, body: Value) {
        self.push(Err(TransportError::Status { status, body }));
    }

    pub fn push_network_error(&self, message: &str) {
        self.push(Err(TransportError::Network(message.to_string())));
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post_json(&self, request: TransportRequest) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockTransport has no queued response")
    }
}

/// Upcast for the driver constructors
pub fn shared(transport: &Arc<MockTransport>) -> Arc<dyn HttpTransport> {
    transport.clone()
}

pub struct RewriteTransport {
    base_url: Url,
    inner: ReqwestTransport,
}

impl RewriteTransport {
    pub fn new(base_url: impl AsRef<str>) -> Arc<Self> {
        Arc::new(Self {
            base_url: Url::parse(base_url.as_ref()).expect("mock server URL"),
            inner: ReqwestTransport::new(),
        })
    }
}

#[async_trait]
impl HttpTransport for RewriteTransport {
    async fn post_json(&self, mut request: TransportRequest) -> Result<Value, TransportError> {
        let gateway_url = Url::parse(&request.url).expect("gateway URL");
        let mut url = self.base_url.join(gateway_url.path()).expect("local URL");
        url.set_query(gateway_url.query());
        request.url = url.to_string();
        self.inner.post_json(request).await
    }
}
