//! Deterministic headless page runtime for the enrolment form enhancements.
//!
//! A [`Page`] loads the form's HTML, installs the client-side behaviours
//! (selective company lookup, UTM capture, menu toggle, marketing source
//! fields, scroll-triggered counters and slide-ins) and lets tests drive it
//! the way a user would: type, click, press keys, scroll, and advance a
//! virtual clock.
//!
//! ```no_run
//! use enrolment_ui::{Page, Result};
//!
//! fn run() -> Result<()> {
//!     let mut page = Page::from_html(
//!         r#"<form>
//!              <input id="id_company_name" type="text">
//!              <input id="id_company_number" type="hidden">
//!            </form>"#,
//!     )?;
//!     page.bind_company_lookup("#id_company_name", "#id_company_number")?;
//!     page.set_lookup_mock("acme", r#"[{"title":"Acme Ltd","company_number":"001"}]"#);
//!
//!     page.type_text("#id_company_name", "acme")?;
//!     page.flush()?;
//!     page.click(".SelectiveLookupDisplay li")?;
//!
//!     page.assert_value("#id_company_name", "Acme Ltd")?;
//!     page.assert_value("#id_company_number", "001")?;
//!     Ok(())
//! }
//! ```

mod dom;
mod events;
mod html;
mod page;
mod scheduler;
mod selector;
mod trace;

pub mod config;
pub mod effects;
pub mod lookup;
pub mod params;
pub mod utm;

pub use config::PageConfig;
pub use dom::{Dom, NodeId, Rect};
pub use effects::{SlideDirection, Viewport};
pub use events::Key;
pub use lookup::{
    CancellationToken, CompanyLookupAdapter, LookupItem, LookupOptions, LookupOutcome,
    LookupRequest, LookupResponse, LookupState, LookupTransport, MockTransport,
    RemoteLookupService, ResultAdapter, SelectiveLookup, TextValueAdapter, WidgetId,
};
pub use page::{EnhanceReport, Page};
pub use params::{Cookie, CookieJar};
pub use scheduler::{Animation, PendingTimer, StepOutcome};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("html parse error: {0}")]
    HtmlParse(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("selector not found: {0}")]
    SelectorNotFound(String),
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),
    #[error("type mismatch for {selector}: expected {expected}, actual {actual}")]
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    #[error(
        "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
    )]
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
    #[error("cookie {name} could not be decoded: {message}")]
    CookieDecode { name: String, message: String },
}

#[cfg(test)]
mod tests;
