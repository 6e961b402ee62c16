//! Metadata store -- the per-script `meta.toml` document.
//!
//! A metadata document mixes two kinds of top-level entries:
//!
//! - **Free-form fields** (`description = "..."`, `author = "..."`) that taku
//!   never interprets and preserves verbatim.
//! - **Host tables** keyed by host name, each holding the [`HostFacts`] of
//!   the install on that machine.
//!
//! The document is kept as a generic ordered TOML table so unknown keys
//! survive every rewrite; [`Metadata`] layers typed accessors for the host
//! tables on top.  Writing facts for one host never touches any other key.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TakuError};

/// Name of the metadata file inside a script directory.
pub const META_FILE: &str = "meta.toml";

/// Where a script is installed on one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostFacts {
    /// File name of the launcher in `target_dir`.
    pub install_name: String,
    /// Absolute directory the launcher was written to.
    pub target_dir: String,
}

impl HostFacts {
    pub fn new(install_name: impl Into<String>, target_dir: impl Into<String>) -> Self {
        Self {
            install_name: install_name.into(),
            target_dir: target_dir.into(),
        }
    }

    /// Full path of the installed launcher.
    pub fn installed_path(&self) -> PathBuf {
        Path::new(&self.target_dir).join(&self.install_name)
    }

    fn to_value(&self) -> toml::Value {
        let mut table = toml::Table::new();
        table.insert(
            "install_name".into(),
            toml::Value::String(self.install_name.clone()),
        );
        table.insert(
            "target_dir".into(),
            toml::Value::String(self.target_dir.clone()),
        );
        toml::Value::Table(table)
    }

    fn from_value(value: &toml::Value) -> Option<Self> {
        match value {
            toml::Value::Table(_) => value.clone().try_into().ok(),
            _ => None,
        }
    }
}

/// An ordered metadata document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    table: toml::Table,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: toml::Table) -> Self {
        Self { table }
    }

    /// The raw document.
    pub fn as_table(&self) -> &toml::Table {
        &self.table
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Raw access to any top-level key.
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.table.get(key)
    }

    /// Set a free-form field, replacing any previous value for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<toml::Value>) {
        self.table.insert(key.into(), value.into());
    }

    /// Install facts recorded for `host`, if any.
    pub fn host_facts(&self, host: &str) -> Option<HostFacts> {
        self.table.get(host).and_then(HostFacts::from_value)
    }

    /// Record `facts` for `host`, replacing only that host's entry.
    pub fn set_host_facts(&mut self, host: &str, facts: &HostFacts) {
        self.table.insert(host.to_owned(), facts.to_value());
    }

    /// Drop the install facts for `host`.  Returns whether there were any;
    /// a free-form field that happens to share the name is left alone.
    pub fn remove_host(&mut self, host: &str) -> bool {
        if self.host_facts(host).is_none() {
            return false;
        }
        self.table.remove(host).is_some()
    }

    /// Every host with recorded install facts, in document order.
    pub fn hosts(&self) -> Vec<(&str, HostFacts)> {
        self.table
            .iter()
            .filter_map(|(k, v)| HostFacts::from_value(v).map(|f| (k.as_str(), f)))
            .collect()
    }

    /// Every entry that is not a host table, in document order.
    pub fn free_fields(&self) -> Vec<(&str, &toml::Value)> {
        self.table
            .iter()
            .filter(|(_, v)| HostFacts::from_value(v).is_none())
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }
}

/// Reads and writes `meta.toml` files under a scripts root.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    root: PathBuf,
}

impl MetadataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the metadata file for script `name`.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name).join(META_FILE)
    }

    /// Load the document for `name`.  A missing file is an empty document;
    /// an unparsable one is [`TakuError::MetadataCorrupt`].
    pub fn load(&self, name: &str) -> Result<Metadata> {
        let path = self.path(name);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Metadata::new());
            }
            Err(e) => return Err(e.into()),
        };

        let table: toml::Table = content
            .parse()
            .map_err(|source| TakuError::MetadataCorrupt {
                path: path.clone(),
                source,
            })?;

        Ok(Metadata::from_table(table))
    }

    /// Overwrite the document for `name` atomically (temp file + rename).
    ///
    /// The file keeps the permissions it had before; a new one gets 0644.
    pub fn save(&self, name: &str, metadata: &Metadata) -> Result<()> {
        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Err(TakuError::ScriptNotFound(name.to_owned()));
        }

        let body = toml::to_string_pretty(metadata.as_table())?;
        let path = self.path(name);

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.as_file().set_permissions(permissions_for(&path, tmp.as_file())?)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(script = %name, keys = metadata.as_table().len(), "metadata saved");
        Ok(())
    }

    /// Facts recorded for `host` on script `name`.
    pub fn host_facts(&self, name: &str, host: &str) -> Result<Option<HostFacts>> {
        Ok(self.load(name)?.host_facts(host))
    }

    /// Set `host`'s facts on script `name`, leaving every other key as it was.
    pub fn merge_host_facts(&self, name: &str, host: &str, facts: &HostFacts) -> Result<()> {
        let mut metadata = self.load(name)?;
        metadata.set_host_facts(host, facts);
        self.save(name, &metadata)?;

        info!(script = %name, host = %host, install_name = %facts.install_name, "recorded install facts");
        Ok(())
    }

    /// Remove `host`'s facts from script `name`.  Returns `false` without
    /// writing anything when the host has no entry.
    pub fn remove_host_facts(&self, name: &str, host: &str) -> Result<bool> {
        let mut metadata = self.load(name)?;
        if !metadata.remove_host(host) {
            return Ok(false);
        }
        self.save(name, &metadata)?;

        info!(script = %name, host = %host, "cleared install facts");
        Ok(true)
    }
}

/// Permissions a rewrite of `path` should carry.
fn permissions_for(path: &Path, tmp: &std::fs::File) -> std::io::Result<std::fs::Permissions> {
    match std::fs::metadata(path) {
        Ok(existing) => Ok(existing.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => default_permissions(tmp),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn default_permissions(_tmp: &std::fs::File) -> std::io::Result<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Ok(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions(tmp: &std::fs::File) -> std::io::Result<std::fs::Permissions> {
    Ok(tmp.metadata()?.permissions())
}
