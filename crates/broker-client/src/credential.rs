//! Principal credentials and authentication methods

use serde::{Deserialize, Serialize};
use std::fmt;

/// How inbound requests authenticate, and therefore which credentials the
/// backend client has to present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthnMethod {
    /// Anonymous access; the base configuration is used as-is
    #[default]
    None,
    /// HTTP Basic credentials forwarded as SASL/SCRAM
    HttpBasic,
}

impl AuthnMethod {
    /// Whether this method injects the caller's credentials into the client
    pub fn requires_credentials(&self) -> bool {
        matches!(self, AuthnMethod::HttpBasic)
    }
}

impl fmt::Display for AuthnMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthnMethod::None => write!(f, "none"),
            AuthnMethod::HttpBasic => write!(f, "http_basic"),
        }
    }
}

/// A caller identity: the user name keys the cache, the password is the
/// secret presented to the broker
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub name: String,
    pub pass: String,
}

impl Credential {
    pub fn new(name: impl Into<String>, pass: impl Into<String>) -> Self {
        Credential {
            name: name.into(),
            pass: pass.into(),
        }
    }

    /// Credential for anonymous requests
    pub fn anonymous(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("pass", &"<redacted>")
            .finish()
    }
}
