//! Request signals feeding the decision context.

use axum::http::HeaderMap;

use crate::config::GeoConfig;
use crate::identity::cookie_value;

/// Everything the router reads from an incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSignals {
    /// Raw identity cookie value, not yet validated.
    pub identity_cookie: Option<String>,
    pub country: String,
    /// Best-effort client address; empty when unknown.
    pub ip: String,
}

impl RequestSignals {
    pub fn from_headers(headers: &HeaderMap, geo: &GeoConfig, cookie_name: &str) -> Self {
        let country = header_str(headers, &geo.country_header)
            .unwrap_or(&geo.default_country)
            .to_string();

        let ip = header_str(headers, &geo.real_ip_header)
            .or_else(|| header_str(headers, &geo.forwarded_for_header))
            .unwrap_or_default()
            .to_string();

        Self {
            identity_cookie: cookie_value(headers, cookie_name),
            country,
            ip,
        }
    }
}

/// Non-empty UTF-8 header value.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn signals(pairs: &[(&'static str, &str)]) -> RequestSignals {
        let mut headers = HeaderMap::new();
        for (k, v) in pairs {
            headers.append(*k, HeaderValue::from_str(v).unwrap());
        }
        RequestSignals::from_headers(&headers, &GeoConfig::default(), "uid")
    }

    #[test]
    fn test_defaults_when_headers_missing() {
        let s = signals(&[]);
        assert_eq!(s.country, "US");
        assert_eq!(s.ip, "");
        assert_eq!(s.identity_cookie, None);
    }

    #[test]
    fn test_country_verbatim() {
        assert_eq!(signals(&[("x-vercel-ip-country", "de")]).country, "de");
        assert_eq!(signals(&[("x-vercel-ip-country", "")]).country, "US");
    }

    #[test]
    fn test_ip_preference() {
        let both = signals(&[("x-real-ip", "10.0.0.1"), ("x-forwarded-for", "1.2.3.4, 5.6.7.8")]);
        assert_eq!(both.ip, "10.0.0.1");

        let forwarded = signals(&[("x-forwarded-for", "1.2.3.4, 5.6.7.8")]);
        assert_eq!(forwarded.ip, "1.2.3.4, 5.6.7.8");

        let junk = signals(&[("x-real-ip", "not-an-ip")]);
        assert_eq!(junk.ip, "not-an-ip");
    }

    #[test]
    fn test_non_utf8_header_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert("x-vercel-ip-country", HeaderValue::from_bytes(b"\xff\xfe").unwrap());
        let s = RequestSignals::from_headers(&headers, &GeoConfig::default(), "uid");
        assert_eq!(s.country, "US");
    }

    #[test]
    fn test_reads_identity_cookie() {
        let s = signals(&[("cookie", "uid=abc-123")]);
        assert_eq!(s.identity_cookie.as_deref(), Some("abc-123"));
    }
}
