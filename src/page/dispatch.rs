use super::Page;
use crate::Result;
use crate::dom::NodeId;
use crate::events::{EventState, Handler, Listener};
use crate::lookup::LookupState;
use crate::trace::TraceCategory;

impl Page {
    pub(crate) fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<EventState> {
        self.dispatch_prepared(EventState::new(event_type, target))
    }

    /// Runs capture listeners root→target, then bubble listeners back up.
    pub(crate) fn dispatch_prepared(&mut self, mut event: EventState) -> Result<EventState> {
        let target = event.target;
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }
        path.reverse();

        // Capture phase.
        for node in &path[..path.len() - 1] {
            event.current_target = *node;
            self.invoke_listeners(*node, &mut event, true)?;
            if event.propagation_stopped {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        // Target phase: capture listeners first.
        event.current_target = target;
        self.invoke_listeners(target, &mut event, true)?;
        if event.propagation_stopped {
            self.trace_event_done(&event, "propagation_stopped");
            return Ok(event);
        }
        self.invoke_listeners(target, &mut event, false)?;
        if event.propagation_stopped {
            self.trace_event_done(&event, "propagation_stopped");
            return Ok(event);
        }

        // Bubble phase.
        for node in path[..path.len() - 1].iter().rev() {
            event.current_target = *node;
            self.invoke_listeners(*node, &mut event, false)?;
            if event.propagation_stopped {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        self.trace_event_done(&event, "completed");
        Ok(event)
    }

    fn invoke_listeners(&mut self, node_id: NodeId, event: &mut EventState, capture: bool) -> Result<()> {
        let listeners = self.listeners.get(node_id, &event.event_type, capture);
        for listener in listeners {
            if self.trace.wants(TraceCategory::Event) {
                let phase = if capture { "capture" } else { "bubble" };
                let target_label = self.dom.node_label(event.target);
                let current_label = self.dom.node_label(event.current_target);
                self.trace_event_line(format!(
                    "[event] {} target={} current={} phase={} handler={:?}",
                    event.event_type, target_label, current_label, phase, listener.handler
                ));
            }
            self.run_handler(listener.handler, event)?;
        }
        Ok(())
    }

    fn run_handler(&mut self, handler: Handler, event: &mut EventState) -> Result<()> {
        match handler {
            Handler::LookupInput(id) => {
                let idx = self.widget_index(id)?;
                let dispatch = self.widgets[idx].handle_input(&mut self.dom)?;
                self.abort_cancelled_lookup(id)?;
                if let Some(dispatch) = dispatch {
                    self.send_lookup(id, dispatch)?;
                }
            }
            Handler::LookupFocus(id) => {
                let idx = self.widget_index(id)?;
                self.widgets[idx].handle_focus();
            }
            Handler::LookupBlur(id) => {
                let idx = self.widget_index(id)?;
                self.widgets[idx].handle_blur(&mut self.dom)?;
            }
            Handler::LookupKeyDown(id) => {
                let idx = self.widget_index(id)?;
                let Some(key) = event.key.clone() else {
                    return Ok(());
                };
                if self.widgets[idx].handle_key(&mut self.dom, &key)? {
                    event.default_prevented = true;
                }
                self.abort_cancelled_lookup(id)?;
            }
            Handler::LookupDropdownClick(id) => {
                let idx = self.widget_index(id)?;
                if self.widgets[idx].handle_dropdown_click(&mut self.dom, event.target)? {
                    self.trace_lookup_line(format!("[lookup] select widget={}", id.0));
                }
                self.abort_cancelled_lookup(id)?;
            }
            Handler::OutsideClick => {
                let target = event.target;
                for idx in 0..self.widgets.len() {
                    let widget = &mut self.widgets[idx];
                    let engaged = widget.is_open() || widget.state() == LookupState::Querying;
                    if engaged && !widget.contains(&self.dom, target) {
                        widget.dismiss(&mut self.dom)?;
                        let id = widget.id();
                        self.abort_cancelled_lookup(id)?;
                    }
                }
            }
            Handler::WindowResize => {
                for widget in &self.widgets {
                    widget.position(&mut self.dom)?;
                }
            }
            Handler::MenuToggle(idx) => {
                if let Some(menu) = self.menus.get_mut(idx) {
                    menu.toggle(&mut self.dom)?;
                }
            }
            Handler::MarketingSourceChange => {
                if let Some(marketing) = &self.marketing {
                    marketing.update(&mut self.dom)?;
                }
            }
            Handler::VisibilityCheck(idx) => self.check_visibility(idx)?,
        }
        Ok(())
    }

    /// Fires a visibility trigger once its element is in view, then drops
    /// its scroll listener.
    pub(crate) fn check_visibility(&mut self, idx: usize) -> Result<()> {
        let margin = self.config.effects.visibility_margin;
        let Some(trigger) = self.triggers.get_mut(idx) else {
            return Ok(());
        };
        let rect = self.dom.rect(trigger.element);
        if !trigger.check(rect, self.viewport, margin) {
            return Ok(());
        }
        let animation = trigger.animation;
        self.listeners.remove(
            self.dom.root(),
            "scroll",
            Listener {
                capture: false,
                handler: Handler::VisibilityCheck(idx),
            },
        );
        self.start_animation(animation)
    }

    pub(crate) fn focus_node(&mut self, node: NodeId) -> Result<()> {
        if self.dom.disabled(node) {
            return Ok(());
        }
        if self.active_element == Some(node) {
            return Ok(());
        }
        if let Some(current) = self.active_element {
            self.blur_node(current)?;
        }

        self.active_element = Some(node);
        self.dispatch_event(node, "focusin")?;
        self.dispatch_event(node, "focus")?;
        Ok(())
    }

    pub(crate) fn blur_node(&mut self, node: NodeId) -> Result<()> {
        if self.active_element != Some(node) {
            return Ok(());
        }

        self.dispatch_event(node, "focusout")?;
        self.dispatch_event(node, "blur")?;
        self.active_element = None;
        Ok(())
    }

    fn trace_event_done(&mut self, event: &EventState, outcome: &str) {
        if !self.trace.wants(TraceCategory::Event) {
            return;
        }
        let target_label = self.dom.node_label(event.target);
        let current_label = self.dom.node_label(event.current_target);
        self.trace_event_line(format!(
            "[event] done {} target={} current={} outcome={} default_prevented={} propagation_stopped={}",
            event.event_type,
            target_label,
            current_label,
            outcome,
            event.default_prevented,
            event.propagation_stopped
        ));
    }
}
