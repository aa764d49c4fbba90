//! Campaign (`utm_*`) parameter capture into a first-visit cookie.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::UtmConfig;
use crate::params::{self, Cookie, CookieJar};
use crate::{Error, Result};

pub const UTM_KEYS: [&str; 5] = [
    "utm_campaign",
    "utm_content",
    "utm_medium",
    "utm_source",
    "utm_term",
];

/// Present, non-empty campaign parameters of a URL or search string.
///
/// Missing parameters simply produce an empty map.
pub fn collect_utm(search: &str) -> BTreeMap<String, String> {
    let mut found = BTreeMap::new();
    for (name, value) in params::query_parameters(search) {
        if value.is_empty() || !UTM_KEYS.contains(&name.as_str()) {
            continue;
        }
        found.entry(name).or_insert(value);
    }
    found
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Written(BTreeMap<String, String>),
    AlreadyCaptured,
    NothingToCapture,
}

/// Writes the campaign cookie unless it already holds a decodable capture.
///
/// A cookie that cannot be decoded counts as not captured and is
/// overwritten when this page load carries parameters.
pub fn capture(
    jar: &mut CookieJar,
    search: &str,
    config: &UtmConfig,
    now: DateTime<Utc>,
) -> Result<CaptureOutcome> {
    match params::read_json_cookie(jar, &config.cookie_name, now) {
        Ok(Some(_)) => return Ok(CaptureOutcome::AlreadyCaptured),
        Ok(None) => {}
        Err(err @ Error::CookieDecode { .. }) => {
            tracing::warn!(cookie = %config.cookie_name, error = %err, "ignoring unreadable campaign cookie");
        }
        Err(err) => return Err(err),
    }

    let found = collect_utm(search);
    if found.is_empty() {
        return Ok(CaptureOutcome::NothingToCapture);
    }

    let payload = serde_json::to_string(&found)
        .map_err(|err| Error::Runtime(format!("campaign cookie encoding failed: {err}")))?;
    let expires = TimeDelta::try_days(config.max_age_days)
        .and_then(|max_age| now.checked_add_signed(max_age))
        .ok_or_else(|| {
            Error::Config(format!(
                "utm.max_age_days {} puts the cookie expiry out of range",
                config.max_age_days
            ))
        })?;
    let cookie = Cookie::new(&config.cookie_name, &params::encode_cookie_value(&payload))
        .with_expires(expires)
        .with_domain(config.cookie_domain.as_deref())
        .with_path("/");
    jar.set(cookie, now);
    Ok(CaptureOutcome::Written(found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn collect_keeps_recognised_non_empty_keys_only() {
        let found = collect_utm("?utm_campaign=test1&utm_content=&utm_source=test4&utm_other=x&page=2");
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec![
                ("utm_campaign".to_string(), "test1".to_string()),
                ("utm_source".to_string(), "test4".to_string()),
            ]
        );
        assert!(collect_utm("").is_empty());
        assert!(collect_utm("https://example.com/").is_empty());
    }

    #[test]
    fn capture_only_writes_on_first_visit() -> Result<()> {
        let config = UtmConfig::default();
        let mut jar = CookieJar::new();

        let first = capture(&mut jar, "?utm_medium=email", &config, now())?;
        assert!(matches!(first, CaptureOutcome::Written(_)));

        let second = capture(&mut jar, "?utm_medium=social", &config, now())?;
        assert_eq!(second, CaptureOutcome::AlreadyCaptured);
        assert_eq!(
            jar.value("ed_utm", now())?.as_deref(),
            Some(r#"{"utm_medium":"email"}"#)
        );
        Ok(())
    }

    #[test]
    fn unreadable_cookie_is_replaced() -> Result<()> {
        let config = UtmConfig::default();
        let mut jar = CookieJar::new();
        jar.set(Cookie::new("ed_utm", "%7Bbroken"), now());

        let outcome = capture(&mut jar, "?utm_term=rust", &config, now())?;
        assert!(matches!(outcome, CaptureOutcome::Written(_)));
        assert_eq!(
            jar.value("ed_utm", now())?.as_deref(),
            Some(r#"{"utm_term":"rust"}"#)
        );
        Ok(())
    }

    #[test]
    fn out_of_range_lifetime_is_a_config_error() {
        let config = UtmConfig {
            max_age_days: i64::MAX,
            ..UtmConfig::default()
        };
        let mut jar = CookieJar::new();
        assert!(matches!(
            capture(&mut jar, "?utm_source=google", &config, now()),
            Err(Error::Config(_))
        ));
        assert!(jar.is_empty());
    }

    #[test]
    fn cookie_expires_after_configured_days() -> Result<()> {
        let config = UtmConfig {
            cookie_domain: Some(".great.gov.uk".into()),
            ..UtmConfig::default()
        };
        let mut jar = CookieJar::new();
        capture(&mut jar, "?utm_source=google", &config, now())?;

        let cookie = jar.get("ed_utm", now()).expect("cookie written");
        assert_eq!(cookie.domain.as_deref(), Some(".great.gov.uk"));
        assert_eq!(cookie.expires, Some(now() + Duration::days(7)));
        assert!(jar.get("ed_utm", now() + Duration::days(7)).is_none());
        Ok(())
    }
}
