//! Cookie consent preferences.
//!
//! The visitor's choice is kept in the `cookie_consent` cookie as URL-encoded
//! JSON together with a format version. A cookie that fails to parse or
//! carries another version counts as "no consent given".

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cookies::cookie_value;

pub const CONSENT_COOKIE_NAME: &str = "cookie_consent";
pub const CONSENT_VERSION: &str = "1.0";
const CONSENT_MAX_AGE_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentPreferences {
    pub necessary: bool,
    pub analytics: bool,
    pub marketing: bool,
}

impl ConsentPreferences {
    pub fn accept_all() -> Self {
        ConsentPreferences {
            necessary: true,
            analytics: true,
            marketing: true,
        }
    }

    pub fn necessary_only() -> Self {
        ConsentPreferences {
            necessary: true,
            analytics: false,
            marketing: false,
        }
    }

    /// Necessary cookies cannot be refused.
    pub fn normalized(self) -> Self {
        ConsentPreferences {
            necessary: true,
            ..self
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConsentRecord {
    version: String,
    preferences: ConsentPreferences,
    // Written for the record; readers only look at version and preferences.
    #[serde(default, skip_deserializing)]
    timestamp: Option<DateTime<Utc>>,
}

/// Outcome of reading the consent cookie from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentCookie {
    Missing,
    Valid(ConsentPreferences),
    /// Present but unreadable; the caller should clear it.
    Invalid,
}

impl ConsentCookie {
    pub fn preferences(&self) -> Option<ConsentPreferences> {
        match self {
            ConsentCookie::Valid(p) => Some(*p),
            _ => None,
        }
    }

    pub fn has_consent(&self) -> bool {
        self.preferences().is_some()
    }

    pub fn has_analytics_consent(&self) -> bool {
        self.preferences().is_some_and(|p| p.analytics)
    }

    pub fn has_marketing_consent(&self) -> bool {
        self.preferences().is_some_and(|p| p.marketing)
    }
}

pub fn decode(raw: &str) -> Option<ConsentPreferences> {
    let json = urlencoding::decode(raw).ok()?;
    let record: ConsentRecord = serde_json::from_str(&json).ok()?;
    (record.version == CONSENT_VERSION).then_some(record.preferences)
}

pub fn encode(preferences: ConsentPreferences, now: DateTime<Utc>) -> anyhow::Result<String> {
    let record = ConsentRecord {
        version: CONSENT_VERSION.to_string(),
        preferences,
        timestamp: Some(now),
    };
    let json = serde_json::to_string(&record)?;
    Ok(urlencoding::encode(&json).into_owned())
}

pub fn read(headers: &HeaderMap) -> ConsentCookie {
    match cookie_value(headers, CONSENT_COOKIE_NAME) {
        None => ConsentCookie::Missing,
        Some(raw) => match decode(raw) {
            Some(preferences) => ConsentCookie::Valid(preferences),
            None => {
                tracing::debug!("Ignoring unreadable consent cookie");
                ConsentCookie::Invalid
            }
        },
    }
}

pub fn set_cookie(
    preferences: ConsentPreferences,
    now: DateTime<Utc>,
    secure: bool,
) -> anyhow::Result<String> {
    let value = encode(preferences.normalized(), now)?;
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax",
        CONSENT_COOKIE_NAME, value, CONSENT_MAX_AGE_SECS
    );
    if secure {
        cookie.push_str("; Secure");
    }
    Ok(cookie)
}

pub fn clear_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0; SameSite=Lax", CONSENT_COOKIE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_str(cookie).unwrap(),
        );
        headers
    }

    fn cookie_pair(set_cookie: &str) -> String {
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[test]
    fn test_missing_cookie() {
        let consent = read(&HeaderMap::new());
        assert_eq!(consent, ConsentCookie::Missing);
        assert!(!consent.has_consent());
    }

    #[test]
    fn test_set_then_read() {
        let set = set_cookie(ConsentPreferences::accept_all(), Utc::now(), false).unwrap();
        let consent = read(&headers(&format!("other=1; {}", cookie_pair(&set))));
        assert!(consent.has_consent());
        assert!(consent.has_analytics_consent());
        assert!(consent.has_marketing_consent());
    }

    #[test]
    fn test_necessary_is_forced() {
        let prefs = ConsentPreferences {
            necessary: false,
            analytics: true,
            marketing: false,
        };
        let set = set_cookie(prefs, Utc::now(), false).unwrap();
        let consent = read(&headers(&cookie_pair(&set)));
        assert_eq!(
            consent.preferences(),
            Some(ConsentPreferences {
                necessary: true,
                analytics: true,
                marketing: false,
            })
        );
    }

    #[test]
    fn test_cookie_attributes() {
        let set = set_cookie(ConsentPreferences::necessary_only(), Utc::now(), true).unwrap();
        assert!(set.starts_with("cookie_consent="));
        assert!(set.contains("Max-Age=31536000"));
        assert!(set.contains("SameSite=Lax"));
        assert!(set.ends_with("; Secure"));
        assert!(!set_cookie(ConsentPreferences::necessary_only(), Utc::now(), false)
            .unwrap()
            .contains("Secure"));
    }

    #[test]
    fn test_corrupt_cookie() {
        assert_eq!(read(&headers("cookie_consent=%7Bbroken")), ConsentCookie::Invalid);
    }

    #[test]
    fn test_wrong_version_or_shape() {
        let old = urlencoding::encode(
            r#"{"version":"0.9","preferences":{"necessary":true,"analytics":true,"marketing":true},"timestamp":"2025-01-01T00:00:00Z"}"#,
        )
        .into_owned();
        assert!(decode(&old).is_none());

        let bad_shape = urlencoding::encode(
            r#"{"version":"1.0","preferences":{"necessary":true,"analytics":"yes","marketing":true},"timestamp":"2025-01-01T00:00:00Z"}"#,
        )
        .into_owned();
        assert!(decode(&bad_shape).is_none());
    }

    #[test]
    fn test_timestamp_is_not_required() {
        let prefs = ConsentPreferences {
            necessary: true,
            analytics: true,
            marketing: false,
        };

        let without = urlencoding::encode(
            r#"{"version":"1.0","preferences":{"necessary":true,"analytics":true,"marketing":false}}"#,
        )
        .into_owned();
        assert_eq!(decode(&without), Some(prefs));

        let odd = urlencoding::encode(
            r#"{"version":"1.0","preferences":{"necessary":true,"analytics":true,"marketing":false},"timestamp":1735689600000}"#,
        )
        .into_owned();
        assert_eq!(decode(&odd), Some(prefs));
    }
}
