//! Visitor identity.
//!
//! # Data Flow
//! ```text
//! Cookie header
//!     → cookie.rs (extract named value)
//!     → is_trusted_token (shape check)
//!     → ResolvedIdentity { id, minted }
//!     → minted ids go back out as Set-Cookie
//! ```
//!
//! # Design Decisions
//! - Shape check is a char scan, not a regex, and can never fail
//! - Any value that does not pass is treated as absent
//! - Fresh ids are UUID v4, hyphenated lowercase

pub mod cookie;

use std::fmt;

use uuid::Uuid;

pub use cookie::{cookie_value, IdentityCookie};

/// Stable identifier for a visitor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VisitorId(String);

impl VisitorId {
    /// Mint a new random id.
    pub fn mint() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Wrap a cookie value if it passes the shape check.
    pub fn from_trusted(value: &str) -> Option<Self> {
        is_trusted_token(value).then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of resolving the identity cookie for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub id: VisitorId,
    /// True when `id` was generated for this request and must be set.
    pub minted: bool,
}

/// Accepts non-empty strings made only of hex digits and hyphens.
///
/// Length and hyphen placement are not checked.
pub fn is_trusted_token(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

/// Reuse the cookie value when it is trusted, otherwise mint a new id.
pub fn resolve(cookie: Option<&str>) -> ResolvedIdentity {
    match cookie.and_then(VisitorId::from_trusted) {
        Some(id) => ResolvedIdentity { id, minted: false },
        None => ResolvedIdentity {
            id: VisitorId::mint(),
            minted: true,
        },
    }
}
