use super::*;

mod lookup_widget;
mod page_effects;
