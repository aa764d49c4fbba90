use std::fmt;

use serde_json::Value;

/// Identifies one `update` call. A newer token supersedes every older one
/// for the same service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancellationToken(u64);

impl CancellationToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub token: CancellationToken,
    pub url: String,
    pub term: String,
}

/// What the transport produced for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Body(String),
    Failed(String),
}

/// Parsed payload of the last completed request. Failures and malformed
/// bodies are stored as an empty array.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResponse {
    payload: Value,
}

impl Default for LookupResponse {
    fn default() -> Self {
        Self::empty()
    }
}

impl LookupResponse {
    pub fn empty() -> Self {
        Self {
            payload: Value::Array(Vec::new()),
        }
    }

    pub fn from_payload(payload: Value) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Records of the payload: either the top-level array or the `items`
    /// array of an object.
    pub fn records(&self) -> &[Value] {
        match &self.payload {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("items") {
                Some(Value::Array(items)) => items,
                _ => &[],
            },
            _ => &[],
        }
    }
}

/// Result of [`RemoteLookupService::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupDispatch {
    pub request: LookupRequest,
    /// In-flight request aborted to make room for this one.
    pub superseded: Option<CancellationToken>,
}

type Listener = Box<dyn FnMut(&LookupResponse)>;

/// Owns at most one in-flight lookup and the last response.
pub struct RemoteLookupService {
    endpoint: String,
    next_generation: u64,
    in_flight: Option<CancellationToken>,
    response: LookupResponse,
    listeners: Vec<Listener>,
    requests_issued: usize,
}

impl fmt::Debug for RemoteLookupService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteLookupService")
            .field("endpoint", &self.endpoint)
            .field("in_flight", &self.in_flight)
            .field("response", &self.response)
            .field("listeners", &self.listeners.len())
            .field("requests_issued", &self.requests_issued)
            .finish()
    }
}

impl RemoteLookupService {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            next_generation: 1,
            in_flight: None,
            response: LookupResponse::empty(),
            listeners: Vec::new(),
            requests_issued: 0,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn response(&self) -> &LookupResponse {
        &self.response
    }

    pub fn in_flight(&self) -> Option<CancellationToken> {
        self.in_flight
    }

    pub fn requests_issued(&self) -> usize {
        self.requests_issued
    }

    /// Registers a callback fired after every accepted completion, in
    /// registration order.
    pub fn listener(&mut self, callback: impl FnMut(&LookupResponse) + 'static) {
        self.listeners.push(Box::new(callback));
    }

    /// Aborts the in-flight request (if any) and starts a new one for `query`.
    pub fn update(&mut self, query: &str) -> LookupDispatch {
        let superseded = self.cancel();
        let token = CancellationToken(self.next_generation);
        self.next_generation += 1;
        self.in_flight = Some(token);
        self.requests_issued += 1;

        LookupDispatch {
            request: LookupRequest {
                token,
                url: self.request_url(query),
                term: query.to_string(),
            },
            superseded,
        }
    }

    pub fn cancel(&mut self) -> Option<CancellationToken> {
        self.in_flight.take()
    }

    /// Accepts the completion of `token` if it is still the in-flight request.
    ///
    /// Returns `false` for aborted or superseded tokens; their outcome is
    /// discarded and no listener runs.
    pub fn complete(&mut self, token: CancellationToken, outcome: LookupOutcome) -> bool {
        if self.in_flight != Some(token) {
            return false;
        }
        self.in_flight = None;

        self.response = match outcome {
            LookupOutcome::Body(body) => match serde_json::from_str::<Value>(&body) {
                Ok(payload) => LookupResponse::from_payload(payload),
                Err(err) => {
                    tracing::warn!(endpoint = %self.endpoint, error = %err, "malformed lookup response");
                    LookupResponse::empty()
                }
            },
            LookupOutcome::Failed(reason) => {
                tracing::warn!(endpoint = %self.endpoint, %reason, "lookup request failed");
                LookupResponse::empty()
            }
        };

        for listener in &mut self.listeners {
            listener(&self.response);
        }
        true
    }

    fn request_url(&self, query: &str) -> String {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("term", query)
            .finish();
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{separator}{encoded}", self.endpoint)
    }
}
