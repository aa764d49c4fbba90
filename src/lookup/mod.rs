//! Selective lookup: an autocomplete widget backed by a remote search.
//!
//! The [`RemoteLookupService`] owns the single in-flight request of a widget
//! and its last response; [`SelectiveLookup`] renders that response as a
//! dropdown and writes the chosen row back into the form through a
//! [`ResultAdapter`].

mod adapter;
mod service;
mod transport;
mod widget;

pub use adapter::{
    COMPANY_NUMBER_WIDTH, CompanyLookupAdapter, FieldSlot, FieldWrite, LookupItem, ResultAdapter,
    TextValueAdapter, normalize_query,
};
pub use service::{
    CancellationToken, LookupDispatch, LookupOutcome, LookupRequest, LookupResponse,
    RemoteLookupService,
};
pub use transport::{LookupTransport, MockTransport};
pub use widget::{
    ACTIVE_ROW_CLASS, DROPDOWN_CLASS, LookupOptions, LookupState, NO_RESULTS_CLASS,
    NO_RESULTS_TEXT, SelectiveLookup, WidgetId,
};
