//! Page configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```
//! use enrolment_ui::PageConfig;
//!
//! let config = PageConfig::from_json_str(
//!     r#"{ "utm": { "cookie_domain": ".great.gov.uk" }, "lookup": { "min_length": 3 } }"#,
//! ).unwrap();
//! assert_eq!(config.lookup.min_length, 3);
//! assert_eq!(config.utm.cookie_name, "ed_utm");
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::{Error, Result};

pub const DEFAULT_LOOKUP_ENDPOINT: &str = "/api/internal/companies-house-search/";
pub const DEFAULT_MIN_LENGTH: usize = 4;
pub const DEFAULT_UTM_COOKIE: &str = "ed_utm";
pub const DEFAULT_VISIBILITY_MARGIN: f64 = 40.0;
/// Browsers cap cookie lifetimes at 400 days.
pub const MAX_UTM_AGE_DAYS: i64 = 400;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    pub lookup: LookupConfig,
    pub utm: UtmConfig,
    pub effects: EffectsConfig,
    pub trace: TraceConfig,
    pub timer_step_limit: usize,
    /// Wall-clock instant the virtual clock starts at; cookie expiry dates
    /// are computed from it.
    pub clock_origin: DateTime<Utc>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            lookup: LookupConfig::default(),
            utm: UtmConfig::default(),
            effects: EffectsConfig::default(),
            trace: TraceConfig::default(),
            timer_step_limit: 10_000,
            clock_origin: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LookupConfig {
    pub endpoint: String,
    pub min_length: usize,
    /// Delay between sending a lookup and delivering its response.
    pub latency_ms: i64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LOOKUP_ENDPOINT.to_string(),
            min_length: DEFAULT_MIN_LENGTH,
            latency_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UtmConfig {
    pub cookie_name: String,
    pub cookie_domain: Option<String>,
    pub max_age_days: i64,
}

impl Default for UtmConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_UTM_COOKIE.to_string(),
            cookie_domain: None,
            max_age_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectsConfig {
    pub visibility_margin: f64,
    pub counter_interval_ms: i64,
    pub counter_frames: u64,
    pub slide_interval_ms: i64,
    pub slide_step_px: f64,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            visibility_margin: DEFAULT_VISIBILITY_MARGIN,
            counter_interval_ms: 20,
            counter_frames: 50,
            slide_interval_ms: 10,
            slide_step_px: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    pub enabled: bool,
    pub events: bool,
    pub timers: bool,
    pub lookups: bool,
    /// Mirror trace lines to `tracing` at debug level.
    pub emit: bool,
    pub log_limit: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            events: true,
            timers: true,
            lookups: true,
            emit: true,
            log_limit: 10_000,
        }
    }
}

impl PageConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timer_step_limit == 0 {
            return Err(Error::Config(
                "timer_step_limit requires at least 1 step".into(),
            ));
        }
        if self.trace.log_limit == 0 {
            return Err(Error::Config("trace.log_limit requires at least 1 entry".into()));
        }
        if self.lookup.endpoint.trim().is_empty() {
            return Err(Error::Config("lookup.endpoint must not be empty".into()));
        }
        if self.lookup.latency_ms < 0 {
            return Err(Error::Config("lookup.latency_ms must not be negative".into()));
        }
        if self.utm.cookie_name.trim().is_empty() {
            return Err(Error::Config("utm.cookie_name must not be empty".into()));
        }
        if !(1..=MAX_UTM_AGE_DAYS).contains(&self.utm.max_age_days) {
            return Err(Error::Config(format!(
                "utm.max_age_days must be between 1 and {MAX_UTM_AGE_DAYS}"
            )));
        }
        if self.effects.counter_interval_ms <= 0 || self.effects.slide_interval_ms <= 0 {
            return Err(Error::Config("effect intervals must be positive".into()));
        }
        if self.effects.counter_frames == 0 {
            return Err(Error::Config("effects.counter_frames must be positive".into()));
        }
        if self.effects.slide_step_px <= 0.0 {
            return Err(Error::Config("effects.slide_step_px must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = PageConfig::from_json_str(r#"{ "lookup": { "latency_ms": 150 } }"#)
            .expect("valid config");
        assert_eq!(config.lookup.latency_ms, 150);
        assert_eq!(config.lookup.min_length, DEFAULT_MIN_LENGTH);
        assert_eq!(config.lookup.endpoint, DEFAULT_LOOKUP_ENDPOINT);
        assert_eq!(config.utm.max_age_days, 7);
        assert_eq!(config.effects.visibility_margin, 40.0);
    }

    #[test]
    fn clock_origin_parses_rfc3339() {
        let config = PageConfig::from_json_str(r#"{ "clock_origin": "2026-10-16T09:30:00Z" }"#)
            .expect("valid config");
        assert_eq!(config.clock_origin.to_rfc3339(), "2026-10-16T09:30:00+00:00");
    }

    #[test]
    fn zero_limits_and_unknown_fields_are_rejected() {
        assert!(matches!(
            PageConfig::from_json_str(r#"{ "timer_step_limit": 0 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PageConfig::from_json_str(r#"{ "effects": { "counter_frames": 0 } }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PageConfig::from_json_str(r#"{ "lookups": {} }"#),
            Err(Error::Config(_))
        ));
    }
}
