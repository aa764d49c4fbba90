use crate::Result;
use crate::dom::{Dom, NodeId};

pub const MENU_TOGGLE_CLASS: &str = "js-header-nav-menu-toggle-button";
pub const MENU_SHOW_CLASS: &str = "js-header-nav-menu";
pub const MENU_HIDE_CLASS: &str = "js-header-nav-menu js-header-nav-menu-hide";

/// Header navigation menu shown and hidden by a toggle button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuToggle {
    pub(crate) button: NodeId,
    pub(crate) menu: NodeId,
    shown: bool,
}

impl MenuToggle {
    /// The menu starts shown only when its class attribute is exactly the
    /// show class.
    pub(crate) fn new(dom: &Dom, button: NodeId, menu: NodeId) -> Self {
        Self {
            button,
            menu,
            shown: dom.class_name(menu) == MENU_SHOW_CLASS,
        }
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Flips the menu. Returns whether it is now shown.
    pub(crate) fn toggle(&mut self, dom: &mut Dom) -> Result<bool> {
        self.shown = !self.shown;
        let class_name = if self.shown {
            MENU_SHOW_CLASS
        } else {
            MENU_HIDE_CLASS
        };
        dom.set_class_name(self.menu, class_name)?;
        Ok(self.shown)
    }
}
