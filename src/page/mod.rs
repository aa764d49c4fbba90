//! The page controller: owns the document and every installed behaviour.

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::PageConfig;
use crate::dom::{Dom, NodeId, Rect, truncate_chars};
use crate::effects::{MarketingSource, MenuToggle, Viewport, VisibilityTrigger};
use crate::events::ListenerStore;
use crate::html::parse_html;
use crate::lookup::{
    LookupRequest, LookupResponse, LookupState, LookupTransport, MockTransport, SelectiveLookup,
    WidgetId,
};
use crate::params::CookieJar;
use crate::scheduler::{Animation, Scheduler};
use crate::trace::{TraceCategory, TraceState};
use crate::{Error, Result};

mod actions;
mod dispatch;
mod install;
mod timers;

pub use install::EnhanceReport;

pub(crate) struct AnimationSlot {
    pub(crate) animation: Box<dyn Animation>,
    pub(crate) interval_ms: i64,
    pub(crate) timer_id: Option<i64>,
    pub(crate) started: bool,
    pub(crate) finished: bool,
}

/// A loaded document with its behaviours, virtual clock and cookie jar.
pub struct Page {
    dom: Dom,
    listeners: ListenerStore,
    scheduler: Scheduler,
    active_element: Option<NodeId>,
    widgets: Vec<SelectiveLookup>,
    animations: Vec<AnimationSlot>,
    triggers: Vec<VisibilityTrigger>,
    menus: Vec<MenuToggle>,
    marketing: Option<MarketingSource>,
    cookies: CookieJar,
    location: String,
    viewport: Viewport,
    transport: Option<Box<dyn LookupTransport>>,
    lookup_mocks: MockTransport,
    config: PageConfig,
    trace: TraceState,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("now_ms", &self.scheduler.now_ms)
            .field("active_element", &self.active_element)
            .field("widgets", &self.widgets)
            .field("animations", &self.animations.len())
            .field("menus", &self.menus)
            .field("marketing", &self.marketing)
            .field("cookies", &self.cookies)
            .field("location", &self.location)
            .field("viewport", &self.viewport)
            .finish()
    }
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_config(html, PageConfig::default())
    }

    pub fn from_html_with_config(html: &str, config: PageConfig) -> Result<Self> {
        config.validate()?;
        let dom = parse_html(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            scheduler: Scheduler::new(config.timer_step_limit),
            active_element: None,
            widgets: Vec::new(),
            animations: Vec::new(),
            triggers: Vec::new(),
            menus: Vec::new(),
            marketing: None,
            cookies: CookieJar::new(),
            location: String::new(),
            viewport: Viewport::default(),
            transport: None,
            lookup_mocks: MockTransport::new(),
            trace: TraceState::from_config(&config.trace),
            config,
        })
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace.take()
    }

    /// Toggles mirroring of trace lines to `tracing`.
    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace.emit = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace.events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace.timers = enabled;
    }

    pub fn set_trace_lookups(&mut self, enabled: bool) {
        self.trace.lookups = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Config(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace.set_log_limit(max_entries);
        Ok(())
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::Config(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.scheduler.timer_step_limit = max_steps;
        Ok(())
    }

    /// Sets the URL the page was loaded from; UTM capture reads its query.
    pub fn set_location(&mut self, url: &str) {
        self.location = url.to_string();
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Replaces the viewport without dispatching any event.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Sets an element's layout box; there is no layout engine.
    pub fn set_rect(&mut self, selector: &str, rect: Rect) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dom.set_rect(target, rect)
    }

    /// Wall-clock time of the virtual clock.
    pub fn clock(&self) -> Result<DateTime<Utc>> {
        let now_ms = self.scheduler.now_ms;
        TimeDelta::try_milliseconds(now_ms)
            .and_then(|elapsed| self.config.clock_origin.checked_add_signed(elapsed))
            .ok_or_else(|| {
                Error::Runtime(format!(
                    "virtual clock at {now_ms}ms is outside the representable date range"
                ))
            })
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    pub fn document_cookie(&self) -> Result<String> {
        Ok(self.cookies.document_cookie(self.clock()?))
    }

    pub fn set_document_cookie(&mut self, raw: &str) -> Result<()> {
        let now = self.clock()?;
        self.cookies.set_cookie_string(raw, now)
    }

    /// Routes lookups through `transport` instead of the built-in mocks.
    pub fn set_transport(&mut self, transport: impl LookupTransport + 'static) {
        self.transport = Some(Box::new(transport));
    }

    pub fn set_lookup_mock(&mut self, term: &str, body: &str) {
        self.lookup_mocks.respond_to_term(term, body);
    }

    pub fn set_lookup_failure(&mut self, term: &str, reason: &str) {
        self.lookup_mocks.fail_term(term, reason);
    }

    pub fn clear_lookup_mocks(&mut self) {
        self.lookup_mocks.clear();
    }

    /// Requests sent through the built-in mocks since the last call.
    pub fn take_lookup_calls(&mut self) -> Vec<LookupRequest> {
        self.lookup_mocks.take_calls()
    }

    pub fn widgets(&self) -> &[SelectiveLookup] {
        &self.widgets
    }

    pub fn widget(&self, id: WidgetId) -> Result<&SelectiveLookup> {
        self.widgets
            .get(id.0)
            .ok_or_else(|| Error::Runtime(format!("unknown lookup widget: {}", id.0)))
    }

    pub fn widget_state(&self, id: WidgetId) -> Result<LookupState> {
        Ok(self.widget(id)?.state())
    }

    /// Registers an extra callback on the widget's lookup service.
    pub fn on_lookup_response(
        &mut self,
        id: WidgetId,
        callback: impl FnMut(&LookupResponse) + 'static,
    ) -> Result<()> {
        let widget = self
            .widgets
            .get_mut(id.0)
            .ok_or_else(|| Error::Runtime(format!("unknown lookup widget: {}", id.0)))?;
        widget.service_mut().listener(callback);
        Ok(())
    }

    pub fn menus(&self) -> &[MenuToggle] {
        &self.menus
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    /// Checks whether the class list of the first match contains `class_name`.
    pub fn assert_class(&self, selector: &str, class_name: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.class_contains(target, class_name);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("class {class_name} present={expected}"),
                actual: format!("class=\"{}\"", self.dom.class_name(target)),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_style(&self, selector: &str, property: &str, expected: Option<&str>) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.style_property(target, property);
        if actual.as_deref() != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("{property}: {}", expected.unwrap_or("<unset>")),
                actual: format!("{property}: {}", actual.as_deref().unwrap_or("<unset>")),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.dom.query_selector_all(selector)?.len())
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.value(target)
    }

    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let target = self.select_one(selector)?;
        Ok(self.dom.attr(target, name))
    }

    /// Listeners registered for `event` on the first match, or on the window
    /// when `selector` is `"window"`.
    pub fn listener_count(&self, selector: &str, event: &str) -> Result<usize> {
        let target = if selector == "window" || selector == "document" {
            self.dom.root()
        } else {
            self.select_one(selector)?
        };
        Ok(self.listeners.count(target, event))
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    fn widget_index(&self, id: WidgetId) -> Result<usize> {
        if id.0 < self.widgets.len() {
            Ok(id.0)
        } else {
            Err(Error::Runtime(format!("unknown lookup widget: {}", id.0)))
        }
    }

    fn trace_event_line(&mut self, line: String) {
        self.trace.line(TraceCategory::Event, line);
    }

    fn trace_timer_line(&mut self, line: String) {
        self.trace.line(TraceCategory::Timer, line);
    }

    fn trace_lookup_line(&mut self, line: String) {
        self.trace.line(TraceCategory::Lookup, line);
    }

    fn trace_utm_line(&mut self, line: String) {
        self.trace.line(TraceCategory::Utm, line);
    }
}
