//! Routing outcomes and how they become responses.

use std::str::FromStr;

use axum::{
    body::Body,
    http::{header, uri::PathAndQuery, HeaderValue, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tower::ServiceExt;
use url::Url;

use crate::decision::Assignment;
use crate::identity::{IdentityCookie, ResolvedIdentity, VisitorId};

/// Where the request goes next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAction {
    /// Client-visible 302 to the target.
    Redirect(Uri),
    /// Internal dispatch to the target; the client URL does not change.
    Rewrite(Uri),
}

impl RouteAction {
    pub fn target(&self) -> &Uri {
        match self {
            RouteAction::Redirect(uri) | RouteAction::Rewrite(uri) => uri,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RouteAction::Redirect(_) => "redirect",
            RouteAction::Rewrite(_) => "rewrite",
        }
    }
}

/// Result of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingOutcome {
    pub action: RouteAction,
    pub bucket: String,
    /// Set when the identity was minted for this request.
    pub new_identity: Option<VisitorId>,
}

/// Copy of `uri` whose path is `/<bucket>`; query, scheme and authority kept.
///
/// The bucket is percent-encoded as a single path segment. Returns `None`
/// when the bucket cannot form a single clean path.
pub fn target_uri(uri: &Uri, bucket: &str) -> Option<Uri> {
    let segment = bucket.trim_start_matches('/');
    if segment.is_empty() || segment.contains(['?', '#']) {
        return None;
    }

    let mut scratch = Url::parse("http://localhost/").ok()?;
    scratch.path_segments_mut().ok()?.clear().push(segment);
    let path = scratch.path();

    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::from_str(&path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}

/// Combine an assignment and identity into an outcome.
///
/// Gate on redirects, gate off rewrites. A bucket that cannot form a path is
/// replaced by `fallback_bucket`.
pub fn decide(uri: &Uri, assignment: &Assignment, identity: ResolvedIdentity, fallback_bucket: &str) -> RoutingOutcome {
    let (bucket, target) = match target_uri(uri, &assignment.bucket) {
        Some(target) => (assignment.bucket.trim_start_matches('/').to_string(), target),
        None => {
            tracing::warn!(bucket = %assignment.bucket, "Bucket is not a usable path, using fallback bucket");
            let target = target_uri(uri, fallback_bucket).unwrap_or_else(|| Uri::from_static("/"));
            (fallback_bucket.to_string(), target)
        }
    };

    let action = if assignment.gate {
        RouteAction::Redirect(target)
    } else {
        RouteAction::Rewrite(target)
    };

    RoutingOutcome {
        action,
        bucket,
        new_identity: identity.minted.then_some(identity.id),
    }
}

impl RoutingOutcome {
    /// Turn the outcome into the client response.
    ///
    /// Rewrites dispatch `request` (with its URI replaced) into `pages`.
    pub async fn into_response(self, mut request: Request<Body>, pages: Router, cookie: &IdentityCookie) -> Response {
        let mut response = match self.action {
            RouteAction::Redirect(target) => {
                match HeaderValue::from_str(&target.to_string()) {
                    Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
                    Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Invalid redirect target").into_response(),
                }
            }
            RouteAction::Rewrite(target) => {
                *request.uri_mut() = target;
                match pages.oneshot(request).await {
                    Ok(response) => response,
                    Err(never) => match never {},
                }
            }
        };

        if let Some(id) = &self.new_identity {
            if let Some(value) = cookie.assign(id) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("private, no-store"));

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(bucket: &str, gate: bool) -> Assignment {
        Assignment {
            bucket: bucket.to_string(),
            gate,
            degraded: false,
        }
    }

    fn returning() -> ResolvedIdentity {
        ResolvedIdentity {
            id: VisitorId::from_trusted("abc-123").unwrap(),
            minted: false,
        }
    }

    #[test]
    fn test_target_replaces_only_path() {
        let uri: Uri = "https://shop.example.com/?utm=1&b=2".parse().unwrap();
        let target = target_uri(&uri, "groupA").unwrap();
        assert_eq!(target.to_string(), "https://shop.example.com/groupA?utm=1&b=2");

        let relative: Uri = "/".parse().unwrap();
        assert_eq!(target_uri(&relative, "groupA").unwrap().to_string(), "/groupA");
    }

    #[test]
    fn test_target_has_no_double_slash() {
        let uri: Uri = "/?x=1".parse().unwrap();
        assert_eq!(target_uri(&uri, "/groupA").unwrap().to_string(), "/groupA?x=1");
        assert_eq!(target_uri(&uri, "//groupA").unwrap().to_string(), "/groupA?x=1");
    }

    #[test]
    fn test_target_rejects_unusable_buckets() {
        let uri: Uri = "/".parse().unwrap();
        assert!(target_uri(&uri, "").is_none());
        assert!(target_uri(&uri, "/").is_none());
        assert!(target_uri(&uri, "a?b").is_none());
        assert!(target_uri(&uri, "a#b").is_none());
    }

    #[test]
    fn test_target_percent_encodes_bucket() {
        let uri: Uri = "/?q=1".parse().unwrap();
        assert_eq!(target_uri(&uri, "grüppe").unwrap().to_string(), "/gr%C3%BCppe?q=1");
        assert_eq!(target_uri(&uri, "a b").unwrap().to_string(), "/a%20b?q=1");
        assert_eq!(target_uri(&uri, "a/b").unwrap().to_string(), "/a%2Fb?q=1");
    }

    #[tokio::test]
    async fn test_redirect_location_is_ascii() {
        let uri: Uri = "/".parse().unwrap();
        let outcome = decide(&uri, &assignment("grüppe", true), returning(), "default");
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let cookie = IdentityCookie::new("uid", 86400);

        let response = outcome.into_response(request, Router::new(), &cookie).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/gr%C3%BCppe");
    }

    #[test]
    fn test_gate_selects_action() {
        let uri: Uri = "/?q=1".parse().unwrap();

        let on = decide(&uri, &assignment("groupB", true), returning(), "default");
        assert_eq!(on.action, RouteAction::Redirect("/groupB?q=1".parse().unwrap()));

        let off = decide(&uri, &assignment("groupB", false), returning(), "default");
        assert_eq!(off.action, RouteAction::Rewrite("/groupB?q=1".parse().unwrap()));
        assert_eq!(on.action.target(), off.action.target());
    }

    #[test]
    fn test_identity_only_attached_when_minted() {
        let uri: Uri = "/".parse().unwrap();
        let kept = decide(&uri, &assignment("groupA", false), returning(), "default");
        assert!(kept.new_identity.is_none());

        let fresh = crate::identity::resolve(None);
        let id = fresh.id.clone();
        let minted = decide(&uri, &assignment("groupA", false), fresh, "default");
        assert_eq!(minted.new_identity, Some(id));
    }

    #[test]
    fn test_unusable_bucket_falls_back() {
        let uri: Uri = "/".parse().unwrap();
        let outcome = decide(&uri, &assignment("a?b", true), returning(), "default");
        assert_eq!(outcome.bucket, "default");
        assert_eq!(outcome.action, RouteAction::Redirect("/default".parse().unwrap()));
    }
}
