use std::collections::VecDeque;

use crate::config::TraceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TraceCategory {
    Event,
    Timer,
    Lookup,
    Utm,
}

/// Bounded in-memory trace buffer. Lines are mirrored to `tracing` while
/// `emit` is on.
#[derive(Debug)]
pub(crate) struct TraceState {
    pub(crate) enabled: bool,
    pub(crate) events: bool,
    pub(crate) timers: bool,
    pub(crate) lookups: bool,
    pub(crate) emit: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) log_limit: usize,
}

impl TraceState {
    pub(crate) fn from_config(config: &TraceConfig) -> Self {
        Self {
            enabled: config.enabled,
            events: config.events,
            timers: config.timers,
            lookups: config.lookups,
            emit: config.emit,
            logs: VecDeque::new(),
            log_limit: config.log_limit,
        }
    }

    pub(crate) fn wants(&self, category: TraceCategory) -> bool {
        self.enabled
            && match category {
                TraceCategory::Event => self.events,
                TraceCategory::Timer => self.timers,
                TraceCategory::Lookup => self.lookups,
                TraceCategory::Utm => true,
            }
    }

    pub(crate) fn line(&mut self, category: TraceCategory, line: String) {
        if !self.wants(category) {
            return;
        }
        if self.emit {
            tracing::debug!(target: "enrolment_ui::trace", "{line}");
        }
        while self.logs.len() >= self.log_limit {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }

    pub(crate) fn set_log_limit(&mut self, max_entries: usize) {
        self.log_limit = max_entries;
        while self.logs.len() > self.log_limit {
            self.logs.pop_front();
        }
    }

    pub(crate) fn take(&mut self) -> Vec<String> {
        self.logs.drain(..).collect()
    }
}
