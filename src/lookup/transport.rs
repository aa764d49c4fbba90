use std::collections::HashMap;

use super::service::{LookupOutcome, LookupRequest};

/// Sends a lookup request and produces its outcome.
///
/// The page calls `send` when a request is issued and delivers the outcome
/// later through its timer queue, so an implementation never sees
/// cancellation directly.
pub trait LookupTransport {
    fn send(&mut self, request: &LookupRequest) -> LookupOutcome;
}

impl<F> LookupTransport for F
where
    F: FnMut(&LookupRequest) -> LookupOutcome,
{
    fn send(&mut self, request: &LookupRequest) -> LookupOutcome {
        self(request)
    }
}

/// Canned outcomes keyed by full request URL or by search term.
#[derive(Debug, Clone)]
pub struct MockTransport {
    by_url: HashMap<String, LookupOutcome>,
    by_term: HashMap<String, LookupOutcome>,
    fallback: LookupOutcome,
    calls: Vec<LookupRequest>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            by_url: HashMap::new(),
            by_term: HashMap::new(),
            fallback: LookupOutcome::Body("[]".to_string()),
            calls: Vec::new(),
        }
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_to_term(&mut self, term: &str, body: &str) {
        self.by_term
            .insert(term.to_string(), LookupOutcome::Body(body.to_string()));
    }

    pub fn respond_to_url(&mut self, url: &str, body: &str) {
        self.by_url
            .insert(url.to_string(), LookupOutcome::Body(body.to_string()));
    }

    pub fn fail_term(&mut self, term: &str, reason: &str) {
        self.by_term
            .insert(term.to_string(), LookupOutcome::Failed(reason.to_string()));
    }

    pub fn set_fallback(&mut self, outcome: LookupOutcome) {
        self.fallback = outcome;
    }

    pub fn clear(&mut self) {
        self.by_url.clear();
        self.by_term.clear();
    }

    pub fn calls(&self) -> &[LookupRequest] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<LookupRequest> {
        std::mem::take(&mut self.calls)
    }
}

impl LookupTransport for MockTransport {
    fn send(&mut self, request: &LookupRequest) -> LookupOutcome {
        self.calls.push(request.clone());
        self.by_url
            .get(&request.url)
            .or_else(|| self.by_term.get(&request.term))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
