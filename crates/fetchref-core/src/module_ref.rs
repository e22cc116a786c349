//! Module coordinates of the form `remote/owner/repository[:reference]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RefError;

/// A remotely addressable schema module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleCoordinate {
    /// Registry host (e.g., "buf.build")
    pub remote: String,
    pub owner: String,
    pub repository: String,
    /// Branch, tag, commit or draft name
    pub reference: Option<String>,
}

impl ModuleCoordinate {
    pub fn new(
        remote: impl Into<String>,
        owner: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            remote: remote.into(),
            owner: owner.into(),
            repository: repository.into(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Parse a module coordinate.
    ///
    /// Supports formats:
    /// - `buf.build/acme/weather`
    /// - `buf.build/acme/weather:v1.2.0`
    pub fn parse(value: &str) -> Result<Self, RefError> {
        let invalid = |reason: &str| RefError::InvalidModuleReference {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        // The reference separator only counts after the last path segment
        // starts, so a colon can never split the remote.
        let last_slash = value.rfind('/').unwrap_or(0);
        let (name, reference) = match value[last_slash..].find(':') {
            Some(idx) => {
                let idx = last_slash + idx;
                (&value[..idx], Some(&value[idx + 1..]))
            }
            None => (value, None),
        };

        let parts: Vec<&str> = name.split('/').collect();
        let [remote, owner, repository] = parts.as_slice() else {
            return Err(invalid("expected remote/owner/repository"));
        };

        if !is_valid_remote(remote) {
            return Err(invalid("remote must be a hostname with an optional :port"));
        }
        if !is_valid_name(owner) {
            return Err(invalid("owner must contain only letters, digits, '-' or '_'"));
        }
        if !is_valid_name(repository) {
            return Err(invalid(
                "repository must contain only letters, digits, '-' or '_'",
            ));
        }

        let reference = match reference {
            Some("") => return Err(invalid("reference after ':' is empty")),
            Some(reference) if reference.chars().any(char::is_whitespace) => {
                return Err(invalid("reference contains whitespace"));
            }
            Some(reference) => Some(reference.to_string()),
            None => None,
        };

        Ok(Self {
            remote: remote.to_string(),
            owner: owner.to_string(),
            repository: repository.to_string(),
            reference,
        })
    }
}

impl fmt::Display for ModuleCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.remote, self.owner, self.repository)?;
        if let Some(reference) = &self.reference {
            write!(f, ":{reference}")?;
        }
        Ok(())
    }
}

impl FromStr for ModuleCoordinate {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_valid_remote(remote: &str) -> bool {
    let (host, port) = match remote.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (remote, None),
    };
    let valid_port = port.is_none_or(|port| port.parse::<u16>().is_ok_and(|p| p > 0));
    valid_port
        && host.starts_with(|c: char| c.is_ascii_alphanumeric())
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
