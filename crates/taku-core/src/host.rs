//! Host identity provider.
//!
//! Install facts are keyed by the machine's network name.  The lookup sits
//! behind [`HostIdentity`] so tests can pin the host without touching the
//! real system.

use crate::error::{Result, TakuError};

/// Something that can name the machine we are running on.
pub trait HostIdentity {
    /// Return the identifier used to key per-host metadata.
    fn current_host(&self) -> Result<String>;
}

/// Reads the host name from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl HostIdentity for SystemHost {
    fn current_host(&self) -> Result<String> {
        let name = hostname::get().map_err(|e| TakuError::HostUnavailable(e.to_string()))?;
        let name = name.to_string_lossy().trim().to_owned();
        if name.is_empty() {
            return Err(TakuError::HostUnavailable("empty host name".into()));
        }
        Ok(name)
    }
}

/// A host identity that always returns the same name.
#[derive(Debug, Clone)]
pub struct FixedHost(pub String);

impl FixedHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl HostIdentity for FixedHost {
    fn current_host(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
