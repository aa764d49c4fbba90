use super::Page;
use crate::dom::NodeId;
use crate::effects::Viewport;
use crate::events::{EventState, Key};
use crate::{Error, Result};

impl Page {
    /// Focuses the field, replaces its value and fires `input`.
    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) || self.dom.readonly(target) {
            return Ok(());
        }
        self.expect_text_field(selector, target)?;

        self.focus_node(target)?;
        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")?;
        Ok(())
    }

    /// Types `text` one character at a time, firing `input` per keystroke.
    pub fn type_chars(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) || self.dom.readonly(target) {
            return Ok(());
        }
        self.expect_text_field(selector, target)?;

        self.focus_node(target)?;
        let mut value = self.dom.value(target)?;
        for ch in text.chars() {
            value.push(ch);
            self.dom.set_value(target, &value)?;
            self.dispatch_event(target, "input")?;
        }
        Ok(())
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        self.dispatch_event(target, "click")?;
        Ok(())
    }

    pub fn focus(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.focus_node(target)
    }

    pub fn blur(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.blur_node(target)
    }

    /// Fires `keydown` with a DOM key name (`"Enter"`, `"ArrowDown"`, `"a"`).
    /// Returns whether a handler prevented the default action.
    pub fn press_key(&mut self, selector: &str, key: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        let event = EventState::new("keydown", target).with_key(Key::from_name(key));
        let outcome = self.dispatch_prepared(event)?;
        Ok(outcome.default_prevented)
    }

    pub fn select_option(&mut self, selector: &str, value: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        let tag = self.dom.tag_name(target).unwrap_or_default().to_string();
        if tag != "select" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "select".into(),
                actual: tag,
            });
        }

        self.dom.set_value(target, value)?;
        self.dispatch_event(target, "input")?;
        self.dispatch_event(target, "change")?;
        Ok(())
    }

    /// Scrolls the window to `scroll_y` and fires `scroll`.
    pub fn scroll_to(&mut self, scroll_y: f64) -> Result<()> {
        self.viewport.scroll_y = scroll_y.max(0.0);
        let root = self.dom.root();
        self.dispatch_event(root, "scroll")?;
        Ok(())
    }

    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        self.viewport = Viewport {
            width,
            height,
            ..self.viewport
        };
        let root = self.dom.root();
        self.dispatch_event(root, "resize")?;
        Ok(())
    }

    /// Fires a plain event at the first match. Use `"window"` to target the
    /// window.
    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = if selector == "window" || selector == "document" {
            self.dom.root()
        } else {
            self.select_one(selector)?
        };
        self.dispatch_event(target, event)?;
        Ok(())
    }

    fn expect_text_field(&self, selector: &str, target: NodeId) -> Result<()> {
        let tag = self
            .dom
            .tag_name(target)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: "non-element".into(),
            })?;
        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag.to_string(),
            });
        }
        Ok(())
    }
}
