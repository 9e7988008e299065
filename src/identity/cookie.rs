//! Identity cookie parsing and rendering.

use axum::http::header::{HeaderMap, COOKIE};
use axum::http::HeaderValue;

use crate::identity::VisitorId;

/// Read a cookie by name from every `Cookie` header on the request.
///
/// The first pair with a matching name wins. Non-UTF-8 headers are skipped.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
}

/// Renders `Set-Cookie` values for the identity cookie.
#[derive(Debug, Clone)]
pub struct IdentityCookie {
    name: String,
    max_age_secs: u64,
}

impl IdentityCookie {
    pub fn new(name: impl Into<String>, max_age_secs: u64) -> Self {
        Self {
            name: name.into(),
            max_age_secs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie assigning `id` for the configured lifetime.
    pub fn assign(&self, id: &VisitorId) -> Option<HeaderValue> {
        let value = format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Lax",
            self.name, id, self.max_age_secs
        );
        HeaderValue::from_str(&value).ok()
    }

    /// Cookie that removes the identity from the client.
    pub fn expire(&self) -> HeaderValue {
        let value = format!("{}=; Path=/; Max-Age=0; SameSite=Lax", self.name);
        // Name is validated as a cookie token at config load.
        HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("uid=; Path=/; Max-Age=0"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for v in values {
            map.append(COOKIE, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn test_cookie_value_lookup() {
        let map = headers(&["theme=dark; uid=abc-123; other=1"]);
        assert_eq!(cookie_value(&map, "uid").as_deref(), Some("abc-123"));
        assert_eq!(cookie_value(&map, "theme").as_deref(), Some("dark"));
        assert_eq!(cookie_value(&map, "missing"), None);
    }

    #[test]
    fn test_cookie_value_across_headers() {
        let map = headers(&["a=1", "uid=\"ff00\""]);
        assert_eq!(cookie_value(&map, "uid").as_deref(), Some("ff00"));
    }

    #[test]
    fn test_cookie_name_is_exact() {
        let map = headers(&["xuid=1; uid2=2"]);
        assert_eq!(cookie_value(&map, "uid"), None);
    }

    #[test]
    fn test_empty_value_is_returned_empty() {
        let map = headers(&["uid="]);
        assert_eq!(cookie_value(&map, "uid").as_deref(), Some(""));
    }

    #[test]
    fn test_assign_and_expire() {
        let cookie = IdentityCookie::new("uid", 86_400);
        let id = VisitorId::from_trusted("abcd-ef").unwrap();
        assert_eq!(
            cookie.assign(&id).unwrap(),
            "uid=abcd-ef; Path=/; Max-Age=86400; SameSite=Lax"
        );
        assert_eq!(cookie.expire(), "uid=; Path=/; Max-Age=0; SameSite=Lax");
    }
}
