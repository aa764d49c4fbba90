use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::adapter::{FieldSlot, LookupItem, ResultAdapter};
use super::service::{CancellationToken, LookupDispatch, LookupOutcome, RemoteLookupService};
use crate::Result;
use crate::config::DEFAULT_MIN_LENGTH;
use crate::dom::{Dom, NodeId};
use crate::events::Key;

pub const DROPDOWN_CLASS: &str = "SelectiveLookupDisplay";
pub const NO_RESULTS_CLASS: &str = "no-results";
pub const NO_RESULTS_TEXT: &str = "No results found";
pub const ACTIVE_ROW_CLASS: &str = "active";

/// Handle to a widget owned by a [`Page`](crate::Page).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub(crate) usize);

impl WidgetId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupState {
    Idle,
    Querying,
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOptions {
    /// Inputs shorter than this (in characters) never issue a request.
    pub min_length: usize,
    /// Selector of the field receiving the selected value.
    pub target: Option<String>,
    pub max_results: Option<usize>,
    /// Extra class added to the dropdown list.
    pub dropdown_class: Option<String>,
    /// Overrides the page's configured lookup endpoint.
    pub endpoint: Option<String>,
    pub close_on_blur: bool,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            target: None,
            max_results: None,
            dropdown_class: None,
            endpoint: None,
            close_on_blur: true,
        }
    }
}

impl LookupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn target(mut self, selector: &str) -> Self {
        self.target = Some(selector.to_string());
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn dropdown_class(mut self, class_name: &str) -> Self {
        self.dropdown_class = Some(class_name.to_string());
        self
    }

    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn close_on_blur(mut self, close_on_blur: bool) -> Self {
        self.close_on_blur = close_on_blur;
        self
    }
}

/// Autocomplete bound to one text input.
pub struct SelectiveLookup {
    id: WidgetId,
    input: NodeId,
    target: NodeId,
    dropdown: NodeId,
    options: LookupOptions,
    adapter: Box<dyn ResultAdapter>,
    service: RemoteLookupService,
    state: LookupState,
    /// Whether the dropdown is displayed. Stays set while a follow-up query
    /// is in flight over the previous rows.
    open: bool,
    active: bool,
    items: Vec<LookupItem>,
    highlighted: Option<usize>,
    selected: bool,
    notified: Rc<Cell<bool>>,
    cancelled: Option<CancellationToken>,
}

impl fmt::Debug for SelectiveLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectiveLookup")
            .field("id", &self.id)
            .field("input", &self.input)
            .field("target", &self.target)
            .field("dropdown", &self.dropdown)
            .field("state", &self.state)
            .field("open", &self.open)
            .field("active", &self.active)
            .field("items", &self.items)
            .field("highlighted", &self.highlighted)
            .field("service", &self.service)
            .finish()
    }
}

impl SelectiveLookup {
    /// Creates the widget and injects its hidden dropdown into `<body>`.
    pub(crate) fn bind(
        dom: &mut Dom,
        id: WidgetId,
        input: NodeId,
        target: Option<NodeId>,
        options: LookupOptions,
        adapter: Box<dyn ResultAdapter>,
        endpoint: &str,
    ) -> Self {
        let mut class_name = DROPDOWN_CLASS.to_string();
        if let Some(extra) = options.dropdown_class.as_deref().filter(|c| !c.is_empty()) {
            class_name.push(' ');
            class_name.push_str(extra);
        }
        let attrs = HashMap::from([
            ("class".to_string(), class_name),
            (
                "style".to_string(),
                "position: absolute; display: none;".to_string(),
            ),
        ]);
        let body = dom.body();
        let dropdown = dom.create_element(body, "ul", attrs);

        let mut service = RemoteLookupService::new(endpoint);
        let notified = Rc::new(Cell::new(false));
        let flag = Rc::clone(&notified);
        service.listener(move |_| flag.set(true));

        Self {
            id,
            input,
            target: target.unwrap_or(input),
            dropdown,
            options,
            adapter,
            service,
            state: LookupState::Idle,
            open: false,
            active: false,
            items: Vec::new(),
            highlighted: None,
            selected: false,
            notified,
            cancelled: None,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn input(&self) -> NodeId {
        self.input
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn dropdown(&self) -> NodeId {
        self.dropdown
    }

    pub fn options(&self) -> &LookupOptions {
        &self.options
    }

    pub fn state(&self) -> LookupState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the dropdown is displayed, including while a newer query is
    /// pending.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Rows of the last render.
    pub fn items(&self) -> &[LookupItem] {
        &self.items
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn service(&self) -> &RemoteLookupService {
        &self.service
    }

    pub(crate) fn service_mut(&mut self) -> &mut RemoteLookupService {
        &mut self.service
    }

    /// Whether `node` is one of the widget's own elements.
    pub fn contains(&self, dom: &Dom, node: NodeId) -> bool {
        dom.contains(self.input, node) || dom.contains(self.dropdown, node) || node == self.target
    }

    /// Reacts to an `input` event. Returns the request to send, if any.
    pub(crate) fn handle_input(&mut self, dom: &mut Dom) -> Result<Option<LookupDispatch>> {
        if self.selected && self.target != self.input {
            dom.set_value(self.target, "")?;
        }
        self.selected = false;

        let value = dom.value(self.input)?;
        if value.chars().count() < self.options.min_length {
            if self.state == LookupState::Querying {
                self.cancel_request();
                self.close(dom)?;
            }
            return Ok(None);
        }
        let query = self.adapter.query(&value);
        let dispatch = self.service.update(&query);
        self.state = LookupState::Querying;
        Ok(Some(dispatch))
    }

    pub(crate) fn handle_focus(&mut self) {
        self.active = true;
    }

    pub(crate) fn handle_blur(&mut self, dom: &mut Dom) -> Result<()> {
        self.active = false;
        if self.options.close_on_blur {
            self.close(dom)?;
        }
        Ok(())
    }

    /// Feeds a delivered response to the service. Renders and opens when
    /// the service accepted it and the input still has focus.
    pub(crate) fn complete(
        &mut self,
        dom: &mut Dom,
        token: CancellationToken,
        outcome: LookupOutcome,
    ) -> Result<bool> {
        if !self.service.complete(token, outcome) {
            return Ok(false);
        }
        self.handle_response(dom)
    }

    fn handle_response(&mut self, dom: &mut Dom) -> Result<bool> {
        if !self.notified.replace(false) {
            return Ok(false);
        }
        if !self.active {
            if self.state == LookupState::Querying {
                self.state = LookupState::Idle;
            }
            return Ok(false);
        }
        self.render(dom)?;
        self.open(dom)?;
        Ok(true)
    }

    fn render(&mut self, dom: &mut Dom) -> Result<()> {
        let mut items = self.adapter.records(self.service.response());
        if let Some(max) = self.options.max_results {
            items.truncate(max);
        }

        dom.clear_children(self.dropdown);
        if items.is_empty() {
            let attrs = HashMap::from([("class".to_string(), NO_RESULTS_CLASS.to_string())]);
            let row = dom.create_element(self.dropdown, "li", attrs);
            dom.set_text_content(row, NO_RESULTS_TEXT)?;
        }
        for (index, item) in items.iter().enumerate() {
            let attrs = HashMap::from([
                ("data-value".to_string(), item.value.clone()),
                ("data-index".to_string(), index.to_string()),
            ]);
            let row = dom.create_element(self.dropdown, "li", attrs);
            dom.set_text_content(row, &item.label)?;
        }

        self.items = items;
        self.highlighted = None;
        Ok(())
    }

    fn open(&mut self, dom: &mut Dom) -> Result<()> {
        dom.set_style_property(self.dropdown, "display", "block")?;
        self.position(dom)?;
        self.state = LookupState::Open;
        self.open = true;
        Ok(())
    }

    /// Hides the dropdown. Returns whether it was open.
    pub fn close(&mut self, dom: &mut Dom) -> Result<bool> {
        let was_open = self.open;
        self.open = false;
        dom.set_style_property(self.dropdown, "display", "none")?;
        self.highlighted = None;
        if self.state != LookupState::Idle {
            self.state = LookupState::Closed;
        }
        Ok(was_open)
    }

    /// Places the dropdown directly below the input, matching its width.
    pub(crate) fn position(&self, dom: &mut Dom) -> Result<()> {
        let rect = dom.rect(self.input);
        dom.set_style_property(self.dropdown, "top", &px(rect.bottom()))?;
        dom.set_style_property(self.dropdown, "left", &px(rect.left))?;
        dom.set_style_property(self.dropdown, "width", &px(rect.width))?;
        Ok(())
    }

    /// Writes the row at `index` into the form and closes the dropdown.
    pub(crate) fn select(&mut self, dom: &mut Dom, index: usize) -> Result<bool> {
        let Some(item) = self.items.get(index) else {
            return Ok(false);
        };
        for write in self.adapter.distribute(item) {
            let node = match write.slot {
                FieldSlot::Input => self.input,
                FieldSlot::Target => self.target,
            };
            dom.set_value(node, &write.value)?;
        }
        self.selected = true;
        self.cancel_request();
        self.close(dom)?;
        Ok(true)
    }

    pub(crate) fn handle_dropdown_click(&mut self, dom: &mut Dom, target: NodeId) -> Result<bool> {
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            if dom.parent(node) == Some(self.dropdown) {
                let Some(index) = dom
                    .attr(node, "data-index")
                    .and_then(|raw| raw.parse::<usize>().ok())
                else {
                    return Ok(false);
                };
                return self.select(dom, index);
            }
            cursor = dom.parent(node);
        }
        Ok(false)
    }

    pub(crate) fn handle_key(&mut self, dom: &mut Dom, key: &Key) -> Result<bool> {
        match key {
            Key::Escape => self.dismiss(dom),
            Key::ArrowDown | Key::ArrowUp if self.is_open() => {
                let count = self.items.len();
                if count == 0 {
                    return Ok(true);
                }
                let next = match (key, self.highlighted) {
                    (Key::ArrowDown, None) => 0,
                    (Key::ArrowDown, Some(current)) => (current + 1) % count,
                    (_, None) => count - 1,
                    (_, Some(current)) => (current + count - 1) % count,
                };
                self.highlight(dom, next)?;
                Ok(true)
            }
            Key::Enter if self.is_open() => match self.highlighted {
                Some(index) => {
                    self.select(dom, index)?;
                    Ok(true)
                }
                None => Ok(false),
            },
            _ => Ok(false),
        }
    }

    /// Closes the dropdown and cancels a pending query. Returns whether
    /// there was anything to dismiss.
    pub(crate) fn dismiss(&mut self, dom: &mut Dom) -> Result<bool> {
        let querying = self.state == LookupState::Querying;
        let was_open = self.close(dom)?;
        if querying {
            self.cancel_request();
        }
        Ok(was_open || querying)
    }

    /// Drops the in-flight request; the page removes its pending delivery.
    fn cancel_request(&mut self) {
        if let Some(token) = self.service.cancel() {
            self.cancelled = Some(token);
        }
    }

    /// Token of a request the widget cancelled on its own since the last call.
    pub(crate) fn take_cancelled(&mut self) -> Option<CancellationToken> {
        self.cancelled.take()
    }

    fn highlight(&mut self, dom: &mut Dom, index: usize) -> Result<()> {
        let rows = dom.children(self.dropdown).to_vec();
        for (position, row) in rows.into_iter().enumerate() {
            if position == index {
                dom.class_add(row, ACTIVE_ROW_CLASS)?;
            } else {
                dom.class_remove(row, ACTIVE_ROW_CLASS)?;
            }
        }
        self.highlighted = Some(index);
        Ok(())
    }
}

fn px(value: f64) -> String {
    format!("{value}px")
}
