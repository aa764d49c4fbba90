//! Page effects outside the lookup widget: scroll-triggered counter and
//! slide-in animations, the header menu toggle and the marketing-source
//! follow-up fields.

mod counter;
mod marketing;
mod menu;
mod slide;
mod visibility;

pub use counter::{CounterAnimation, format_grouped};
pub use marketing::{
    BANK_INPUT_ID, BANK_WRAPPER_ID, FORM_GROUP_HIDDEN, FORM_GROUP_VISIBLE, MarketingSource,
    OTHER_INPUT_ID, OTHER_WRAPPER_ID, SOURCE_SELECT_ID,
};
pub use menu::{MENU_HIDE_CLASS, MENU_SHOW_CLASS, MENU_TOGGLE_CLASS, MenuToggle};
pub use slide::{SlideAnimation, SlideDirection};
pub use visibility::{Viewport, is_in_view};

pub(crate) use visibility::VisibilityTrigger;
