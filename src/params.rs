//! Query-string parameters and the `document.cookie` jar.

use chrono::{DateTime, TimeDelta, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Characters `encodeURIComponent` leaves alone.
const COOKIE_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Decoded `(name, value)` pairs of a URL, a `?search` string or a bare query.
///
/// Order is preserved and repeated names are kept.
pub fn query_parameters(input: &str) -> Vec<(String, String)> {
    let query = match input.split_once('?') {
        Some((_, query)) => query,
        None if input.contains('=') => input,
        None => "",
    };
    let query = query.split('#').next().unwrap_or_default();
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

/// First value of `name`, if present.
pub fn query_parameter(input: &str, name: &str) -> Option<String> {
    query_parameters(input)
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

pub fn encode_cookie_value(raw: &str) -> String {
    utf8_percent_encode(raw, COOKIE_VALUE).to_string()
}

pub fn decode_cookie_value(name: &str, encoded: &str) -> Result<String> {
    percent_decode_str(encoded)
        .decode_utf8()
        .map(|value| value.into_owned())
        .map_err(|err| Error::CookieDecode {
            name: name.to_string(),
            message: err.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    /// Stored exactly as it appears in `document.cookie` (already encoded).
    pub value: String,
    pub expires: Option<DateTime<Utc>>,
    pub domain: Option<String>,
    pub path: String,
}

impl Cookie {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            expires: None,
            domain: None,
            path: "/".to_string(),
        }
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_domain(mut self, domain: Option<&str>) -> Self {
        self.domain = domain.filter(|d| !d.is_empty()).map(ToOwned::to_owned);
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    /// The string a script assigns to `document.cookie`.
    pub fn to_header_string(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(expires) = self.expires {
            out.push_str("; expires=");
            out.push_str(&expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        }
        if let Some(domain) = &self.domain {
            out.push_str("; domain=");
            out.push_str(domain);
        }
        out.push_str("; path=");
        out.push_str(&self.path);
        out
    }

    fn same_slot(&self, other: &Cookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `cookie`, replacing one with the same name, domain and path.
    /// A cookie that is already expired deletes the stored one instead.
    pub fn set(&mut self, cookie: Cookie, now: DateTime<Utc>) {
        let existing = self.cookies.iter().position(|c| c.same_slot(&cookie));
        match (existing, cookie.is_expired(now)) {
            (Some(idx), true) => {
                self.cookies.remove(idx);
            }
            (Some(idx), false) => self.cookies[idx] = cookie,
            (None, true) => {}
            (None, false) => self.cookies.push(cookie),
        }
    }

    pub fn get(&self, name: &str, now: DateTime<Utc>) -> Option<&Cookie> {
        self.cookies
            .iter()
            .find(|cookie| cookie.name == name && !cookie.is_expired(now))
    }

    /// Decoded value of a live cookie.
    pub fn value(&self, name: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        self.get(name, now)
            .map(|cookie| decode_cookie_value(name, &cookie.value))
            .transpose()
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.cookies.len();
        self.cookies.retain(|cookie| cookie.name != name);
        before != self.cookies.len()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// What a script reads from `document.cookie`.
    pub fn document_cookie(&self, now: DateTime<Utc>) -> String {
        self.cookies
            .iter()
            .filter(|cookie| !cookie.is_expired(now))
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Applies an assignment to `document.cookie`.
    pub fn set_cookie_string(&mut self, raw: &str, now: DateTime<Utc>) -> Result<()> {
        let mut parts = raw.split(';');
        let pair = parts.next().unwrap_or_default().trim();
        let Some((name, value)) = pair.split_once('=') else {
            return Err(Error::Runtime(format!(
                "cookie assignment without name=value: {raw}"
            )));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Runtime(format!("cookie assignment without name: {raw}")));
        }

        let mut cookie = Cookie::new(name, value.trim());
        let mut max_age = None;
        for attribute in parts {
            let (key, val) = attribute
                .split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .unwrap_or((attribute.trim(), ""));
            match key.to_ascii_lowercase().as_str() {
                "expires" => {
                    let expires = DateTime::parse_from_rfc2822(val).map_err(|err| {
                        Error::Runtime(format!("invalid cookie expires '{val}': {err}"))
                    })?;
                    cookie.expires = Some(expires.with_timezone(&Utc));
                }
                "max-age" => {
                    let seconds = val.parse::<i64>().map_err(|err| {
                        Error::Runtime(format!("invalid cookie max-age '{val}': {err}"))
                    })?;
                    max_age = Some(seconds);
                }
                "domain" => cookie.domain = Some(val.to_string()).filter(|d| !d.is_empty()),
                "path" => cookie.path = val.to_string(),
                _ => {}
            }
        }
        // max-age wins over expires
        if let Some(seconds) = max_age {
            let expires = TimeDelta::try_seconds(seconds)
                .and_then(|max_age| now.checked_add_signed(max_age))
                .ok_or_else(|| Error::Runtime(format!("cookie max-age out of range: {seconds}")))?;
            cookie.expires = Some(expires);
        }

        self.set(cookie, now);
        Ok(())
    }
}

/// Reads a cookie holding a percent-encoded JSON object.
///
/// `Ok(None)` when the cookie is absent; malformed content is an
/// [`Error::CookieDecode`].
pub fn read_json_cookie(
    jar: &CookieJar,
    name: &str,
    now: DateTime<Utc>,
) -> Result<Option<Map<String, Value>>> {
    let Some(raw) = jar.value(name, now)? else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(other) => Err(Error::CookieDecode {
            name: name.to_string(),
            message: format!("expected a JSON object, found {other}"),
        }),
        Err(err) => Err(Error::CookieDecode {
            name: name.to_string(),
            message: err.to_string(),
        }),
    }
}
