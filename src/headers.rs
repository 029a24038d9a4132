use anyhow::{Context, Result};
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONNECTION, COOKIE, HeaderMap, HeaderValue, USER_AGENT,
};
use tracing::debug;

use crate::config::CookieConfig;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Builds the request headers used for every page fetch, attaching a Cookie
/// header when the config supplies cookie material.
pub fn build_headers(cookies: &CookieConfig) -> Result<HeaderMap> {
    let mut h = HeaderMap::new();
    h.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    h.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    h.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    h.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    let cookie = build_cookie_header(cookies);
    if !cookie.is_empty() {
        debug!(cookie = %mask_cookie_header(&cookie), "attaching cookie header");
        h.insert(
            COOKIE,
            HeaderValue::from_str(&cookie).context("cookie header contains invalid characters")?,
        );
    }

    Ok(h)
}

/// A string config value is used as-is (trimmed); a mapping is joined as
/// `name=value` pairs, skipping empty values.
pub fn build_cookie_header(cookies: &CookieConfig) -> String {
    match cookies {
        CookieConfig::Header(s) => s.trim().to_string(),
        CookieConfig::Pairs(map) => map
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; "),
    }
}

/// Masks cookie values for log output so session material never lands in logs.
pub fn mask_cookie_header(header: &str) -> String {
    if header.is_empty() {
        return String::new();
    }
    header
        .split(';')
        .map(|pair| {
            let key = pair.split('=').next().unwrap_or("").trim();
            format!("{key}=***")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn string_cookies_pass_through_trimmed() {
        let c = CookieConfig::Header("  a=1; b=2  ".to_string());
        assert_eq!(build_cookie_header(&c), "a=1; b=2");
    }

    #[test]
    fn mapped_cookies_join_and_skip_empty_values() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), "1".to_string());
        map.insert("b".to_string(), String::new());
        map.insert("c".to_string(), "3".to_string());
        let c = CookieConfig::Pairs(map);
        assert_eq!(build_cookie_header(&c), "a=1; c=3");
    }

    #[test]
    fn empty_config_yields_no_cookie_header() {
        let h = build_headers(&CookieConfig::default()).unwrap();
        assert!(h.get(COOKIE).is_none());
        assert!(h.get(USER_AGENT).is_some());
    }

    #[test]
    fn cookie_values_are_masked_for_logs() {
        assert_eq!(mask_cookie_header("session=secret; user=bob"), "session=***; user=***");
        assert_eq!(mask_cookie_header(""), "");
    }
}
