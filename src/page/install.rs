use super::{AnimationSlot, Page};
use crate::dom::NodeId;
use crate::effects::{
    CounterAnimation, MENU_SHOW_CLASS, MENU_TOGGLE_CLASS, MarketingSource, MenuToggle,
    SlideAnimation, SlideDirection, VisibilityTrigger,
};
use crate::events::{Handler, Listener};
use crate::lookup::{
    CompanyLookupAdapter, LookupOptions, ResultAdapter, SelectiveLookup, TextValueAdapter,
    WidgetId,
};
use crate::scheduler::Animation;
use crate::utm::{self, CaptureOutcome};
use crate::{Error, Result};

/// What [`Page::enhance`] installed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnhanceReport {
    pub lookups: Vec<WidgetId>,
    pub menu_toggle: bool,
    pub marketing_source: bool,
    pub counters: usize,
    pub slides: usize,
    pub utm_written: bool,
}

fn bubble(handler: Handler) -> Listener {
    Listener {
        capture: false,
        handler,
    }
}

impl Page {
    /// Lookup options seeded from the page configuration.
    pub fn lookup_options(&self) -> LookupOptions {
        LookupOptions::new().min_length(self.config.lookup.min_length)
    }

    /// Binds a selective lookup to the first input matching `selector`.
    pub fn bind_lookup(
        &mut self,
        selector: &str,
        options: LookupOptions,
        adapter: impl ResultAdapter + 'static,
    ) -> Result<WidgetId> {
        let input = self.select_one(selector)?;
        self.bind_lookup_node(selector, input, options, Box::new(adapter))
    }

    /// Company-name search writing the company number into `target`.
    pub fn bind_company_lookup(&mut self, selector: &str, target: &str) -> Result<WidgetId> {
        let options = self.lookup_options().target(target);
        self.bind_lookup(selector, options, CompanyLookupAdapter::new())
    }

    fn bind_lookup_node(
        &mut self,
        selector: &str,
        input: NodeId,
        options: LookupOptions,
        adapter: Box<dyn ResultAdapter>,
    ) -> Result<WidgetId> {
        let tag = self.dom.tag_name(input).unwrap_or_default().to_string();
        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }
        let target = options
            .target
            .as_deref()
            .map(|target| self.select_one(target))
            .transpose()?;
        let endpoint = options
            .endpoint
            .clone()
            .unwrap_or_else(|| self.config.lookup.endpoint.clone());

        let id = WidgetId(self.widgets.len());
        let mut widget =
            SelectiveLookup::bind(&mut self.dom, id, input, target, options, adapter, &endpoint);
        if self.active_element == Some(input) {
            widget.handle_focus();
        }
        let dropdown = widget.dropdown();
        self.widgets.push(widget);

        self.listeners.add(input, "input", bubble(Handler::LookupInput(id)));
        self.listeners.add(input, "focus", bubble(Handler::LookupFocus(id)));
        self.listeners.add(input, "blur", bubble(Handler::LookupBlur(id)));
        self.listeners.add(input, "keydown", bubble(Handler::LookupKeyDown(id)));
        self.listeners
            .add(dropdown, "click", bubble(Handler::LookupDropdownClick(id)));
        let root = self.dom.root();
        self.listeners.add(root, "click", bubble(Handler::OutsideClick));
        self.listeners.add(root, "resize", bubble(Handler::WindowResize));

        tracing::debug!(widget = id.0, %endpoint, input = %self.dom.node_label(input), "bound selective lookup");
        Ok(id)
    }

    /// Closes every open dropdown. Returns how many were open.
    pub fn close_all(&mut self) -> Result<usize> {
        let mut closed = 0;
        for widget in &mut self.widgets {
            if widget.close(&mut self.dom)? {
                closed += 1;
            }
        }
        Ok(closed)
    }

    /// Wires the header menu toggle. `Ok(false)` when either element is absent.
    pub fn install_menu_toggle(&mut self) -> Result<bool> {
        let button = self.dom.query_selector(&format!(".{MENU_TOGGLE_CLASS}"))?;
        let menu = self.dom.query_selector(&format!(".{MENU_SHOW_CLASS}"))?;
        let (Some(button), Some(menu)) = (button, menu) else {
            return Ok(false);
        };
        if self.menus.iter().any(|existing| existing.button == button) {
            return Ok(true);
        }

        let idx = self.menus.len();
        self.menus.push(MenuToggle::new(&self.dom, button, menu));
        self.listeners
            .add(button, "click", bubble(Handler::MenuToggle(idx)));
        Ok(true)
    }

    /// Wires the marketing-source select and applies its current value.
    /// `Ok(false)` when the select is absent.
    pub fn install_marketing_source(&mut self) -> Result<bool> {
        let Some(marketing) = MarketingSource::locate(&self.dom)? else {
            return Ok(false);
        };
        marketing.update(&mut self.dom)?;
        self.listeners.add(
            marketing.select,
            "change",
            bubble(Handler::MarketingSourceChange),
        );
        self.marketing = Some(marketing);
        Ok(true)
    }

    /// Stores the location's campaign parameters in the UTM cookie on first
    /// visit. Returns whether a cookie was written.
    pub fn capture_utm(&mut self) -> Result<bool> {
        let now = self.clock()?;
        let outcome = utm::capture(&mut self.cookies, &self.location, &self.config.utm, now)?;
        let line = match &outcome {
            CaptureOutcome::Written(found) => format!(
                "[utm] written cookie={} keys={}",
                self.config.utm.cookie_name,
                found.keys().cloned().collect::<Vec<_>>().join(",")
            ),
            CaptureOutcome::AlreadyCaptured => {
                format!("[utm] skipped cookie={} already_captured", self.config.utm.cookie_name)
            }
            CaptureOutcome::NothingToCapture => "[utm] skipped no_parameters".to_string(),
        };
        self.trace_utm_line(line);
        Ok(matches!(outcome, CaptureOutcome::Written(_)))
    }

    /// Counts the element's text from 1 to `end` once it scrolls into view.
    pub fn animate_counter(&mut self, selector: &str, end: u64) -> Result<usize> {
        let element = self.select_one(selector)?;
        self.animate_counter_node(element, end)
    }

    fn animate_counter_node(&mut self, element: NodeId, end: u64) -> Result<usize> {
        let effects = &self.config.effects;
        let interval_ms = effects.counter_interval_ms;
        let counter = CounterAnimation::new(element, end, effects.counter_frames);
        self.register_animation(element, Box::new(counter), interval_ms)
    }

    /// Offsets the element and slides it back once it scrolls into view.
    pub fn slide_into_view(
        &mut self,
        selector: &str,
        offset: f64,
        direction: SlideDirection,
    ) -> Result<usize> {
        let element = self.select_one(selector)?;
        self.slide_into_view_node(element, offset, direction)
    }

    fn slide_into_view_node(
        &mut self,
        element: NodeId,
        offset: f64,
        direction: SlideDirection,
    ) -> Result<usize> {
        let effects = &self.config.effects;
        let interval_ms = effects.slide_interval_ms;
        let slide = SlideAnimation::new(element, offset, direction, effects.slide_step_px);
        self.register_animation(element, Box::new(slide), interval_ms)
    }

    /// Starts any [`Animation`] on a fixed interval once `selector` is in view.
    pub fn animate_when_visible(
        &mut self,
        selector: &str,
        animation: impl Animation + 'static,
        interval_ms: i64,
    ) -> Result<usize> {
        if interval_ms <= 0 {
            return Err(Error::Config("animation interval must be positive".into()));
        }
        let element = self.select_one(selector)?;
        self.register_animation(element, Box::new(animation), interval_ms)
    }

    fn register_animation(
        &mut self,
        element: NodeId,
        mut animation: Box<dyn Animation>,
        interval_ms: i64,
    ) -> Result<usize> {
        animation.prepare(&mut self.dom)?;
        let slot = self.animations.len();
        self.animations.push(AnimationSlot {
            animation,
            interval_ms,
            timer_id: None,
            started: false,
            finished: false,
        });

        let trigger_idx = self.triggers.len();
        self.triggers.push(VisibilityTrigger::new(element, slot));
        self.check_visibility(trigger_idx)?;
        if !self.triggers[trigger_idx].fired {
            let root = self.dom.root();
            self.listeners
                .add(root, "scroll", bubble(Handler::VisibilityCheck(trigger_idx)));
        }
        Ok(slot)
    }

    /// Whether an animation registered by `animate_*`/`slide_into_view` has
    /// reached its final frame.
    pub fn animation_finished(&self, slot: usize) -> bool {
        self.animations.get(slot).is_some_and(|entry| entry.finished)
    }

    /// Installs every behaviour whose elements exist in the document.
    ///
    /// Markup hooks: `data-selective-lookup` (`company` or `text`) with an
    /// optional `data-lookup-target`, `data-lookup-endpoint` and
    /// `data-lookup-min-length`; `data-counter-end`; `data-slide-offset` with
    /// `data-slide-direction`.
    pub fn enhance(&mut self) -> Result<EnhanceReport> {
        let mut report = EnhanceReport::default();

        for input in self.dom.query_selector_all("[data-selective-lookup]")? {
            let selector = self.dom.node_label(input);
            let mut options = self.lookup_options();
            if let Some(target) = self.dom.attr(input, "data-lookup-target") {
                options = options.target(&target);
            }
            if let Some(endpoint) = self.dom.attr(input, "data-lookup-endpoint") {
                options = options.endpoint(&endpoint);
            }
            if let Some(raw) = self.dom.attr(input, "data-lookup-min-length") {
                let min_length = raw.trim().parse::<usize>().map_err(|err| {
                    Error::Config(format!("{selector}: invalid data-lookup-min-length '{raw}': {err}"))
                })?;
                options = options.min_length(min_length);
            }
            let adapter: Box<dyn ResultAdapter> =
                match self.dom.attr(input, "data-selective-lookup").as_deref() {
                    Some("company") => Box::new(CompanyLookupAdapter::new()),
                    _ => Box::new(TextValueAdapter),
                };
            report
                .lookups
                .push(self.bind_lookup_node(&selector, input, options, adapter)?);
        }

        report.menu_toggle = self.install_menu_toggle()?;
        report.marketing_source = self.install_marketing_source()?;

        for element in self.dom.query_selector_all("[data-counter-end]")? {
            let raw = self.dom.attr(element, "data-counter-end").unwrap_or_default();
            let end = parse_number(&raw).ok_or_else(|| {
                Error::Config(format!(
                    "{}: invalid data-counter-end '{raw}'",
                    self.dom.node_label(element)
                ))
            })?;
            self.animate_counter_node(element, end)?;
            report.counters += 1;
        }

        for element in self.dom.query_selector_all("[data-slide-offset]")? {
            let raw = self.dom.attr(element, "data-slide-offset").unwrap_or_default();
            let offset = raw.trim().parse::<f64>().map_err(|err| {
                Error::Config(format!(
                    "{}: invalid data-slide-offset '{raw}': {err}",
                    self.dom.node_label(element)
                ))
            })?;
            let direction = self
                .dom
                .attr(element, "data-slide-direction")
                .as_deref()
                .unwrap_or("left")
                .parse::<SlideDirection>()?;
            self.slide_into_view_node(element, offset, direction)?;
            report.slides += 1;
        }

        report.utm_written = self.capture_utm()?;
        tracing::debug!(?report, "page enhanced");
        Ok(report)
    }
}

/// Accepts grouped numbers such as `1,234`.
fn parse_number(raw: &str) -> Option<u64> {
    let digits = raw.trim().replace(',', "");
    digits.parse::<u64>().ok()
}
