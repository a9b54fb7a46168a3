//! Device address normalization.
//!
//! Users type whatever they see on the rower's display ("192.168.4.1",
//! "rower.local", "http://rower.local:8080"). Every device call resolves
//! against the canonical form produced here.

use std::fmt;

use url::Url;

use crate::error::ConfigError;

/// Canonicalize a raw device locator.
///
/// Prepends `http://` when no scheme is present and appends a trailing `/`
/// unless one is already there or the input carries a query component.
/// Applying it twice yields the same string.
pub fn normalize(raw: &str) -> String {
    let mut normalized = raw.trim().to_string();

    if !normalized.starts_with("http://") && !normalized.starts_with("https://") {
        normalized = format!("http://{normalized}");
    }

    if !normalized.ends_with('/') && !normalized.contains('?') {
        normalized.push('/');
    }

    normalized
}

/// A normalized, parseable device base address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress {
    normalized: String,
    base: Url,
}

impl DeviceAddress {
    /// Normalize and validate a user-supplied locator.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidAddress {
            address: raw.to_string(),
            message,
        };

        if raw.trim().is_empty() {
            return Err(invalid("address is empty".into()));
        }

        let normalized = normalize(raw);
        let base = Url::parse(&normalized).map_err(|e| invalid(e.to_string()))?;
        if base.host_str().map_or(true, str::is_empty) {
            return Err(invalid("address has no host".into()));
        }

        Ok(Self { normalized, base })
    }

    /// Canonical string form.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Resolve an endpoint path (e.g. `api/sessions`) against this address.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl std::str::FromStr for DeviceAddress {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
