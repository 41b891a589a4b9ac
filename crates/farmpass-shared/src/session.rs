//! Authentication sessions for the two persisted role domains.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{CUSTOMER_SESSION_KEY, RESTAURANT_SESSION_KEY};

/// An independently authenticated role domain.
///
/// The farmer role is not listed: its credential lives only in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionDomain {
    Customer,
    Restaurant,
}

impl SessionDomain {
    pub const ALL: [SessionDomain; 2] = [SessionDomain::Customer, SessionDomain::Restaurant];

    /// Storage key owned exclusively by this domain.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Customer => CUSTOMER_SESSION_KEY,
            Self::Restaurant => RESTAURANT_SESSION_KEY,
        }
    }
}

impl std::fmt::Display for SessionDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Restaurant => write!(f, "restaurant"),
        }
    }
}

/// The authenticated user as returned by the backend.
///
/// Unknown fields (restaurant name, postcode, ...) are kept verbatim so a
/// restored session serializes back to the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Principal {
    fn extra_text(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Best human-readable label for this principal.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or_else(|| self.extra_text("name"))
            .or_else(|| self.extra_text("restaurantName"))
            .unwrap_or(&self.email)
    }

    /// Restaurant name attached to a restaurant account.
    pub fn restaurant_name(&self) -> Option<&str> {
        self.extra_text("restaurantName")
            .or_else(|| self.extra_text("restaurant_name"))
            .or(self.display_name.as_deref())
    }
}

/// A complete session: both the principal and the bearer token are present.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub domain: SessionDomain,
    pub principal: Principal,
    pub token: String,
}

/// Persisted and wire shape: `{ "user": {...}, "token": "..." }`.
///
/// Both halves are optional here so that a half-written record parses and
/// can then be rejected as absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    #[serde(default)]
    user: Option<Principal>,
    #[serde(default)]
    token: Option<String>,
}

impl Session {
    /// Build a session from a `{user, token}` value (login/registration
    /// response or a stored record). Anything partial is `None`.
    pub fn from_value(domain: SessionDomain, value: Value) -> Option<Self> {
        let record: SessionRecord = serde_json::from_value(value).ok()?;
        let principal = record.user?;
        let token = record.token.filter(|t| !t.trim().is_empty())?;
        Some(Self {
            domain,
            principal,
            token,
        })
    }

    /// Parse a stored record.
    pub fn from_record(domain: SessionDomain, raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        Self::from_value(domain, value)
    }

    /// Serialize to the stored record.
    pub fn to_record(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&SessionRecord {
            user: Some(self.principal.clone()),
            token: Some(self.token.clone()),
        })
    }
}
