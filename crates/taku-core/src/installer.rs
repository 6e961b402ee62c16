//! Installer -- put scripts on the executable search path.
//!
//! Installing writes a small launcher into a target directory.  The launcher
//! exports the scripts root and `exec`s `taku run <name>`, so edits to the
//! source script take effect without reinstalling.  Where the launcher went
//! is recorded in the script's metadata under the current host's name, which
//! is what [`Installer::uninstall`] later relies on.
//!
//! Per script and host:
//!
//! ```text
//! absent --install--> installed --uninstall--> absent
//! installed --install (file exists)--> installed (skipped)
//! ```

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::SCRIPTS_ENV_VAR;
use crate::error::{Result, TakuError};
use crate::host::HostIdentity;
use crate::metadata::HostFacts;
use crate::registry::{ScriptRegistry, make_executable, validate_name};

/// Pseudo-name that selects every script.
pub const ALL: &str = "all";

/// What to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallTarget {
    /// Every script in the registry, each under its own name.
    All,
    /// A single named script.
    Script(String),
}

impl InstallTarget {
    pub fn parse(name: &str) -> Self {
        if name == ALL {
            Self::All
        } else {
            Self::Script(name.to_owned())
        }
    }
}

/// Result of installing one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// A launcher was written and the install recorded.
    Installed { script: String, path: PathBuf },
    /// Something already occupies the target path; nothing was touched.
    Skipped { script: String, path: PathBuf },
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed { script, path } => {
                write!(f, "Installed {script} to {}", path.display())
            }
            Self::Skipped { script, path } => {
                write!(f, "{} already exists. Skipping {script}", path.display())
            }
        }
    }
}

/// Result of uninstalling one script from the current host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    /// The launcher was deleted and the host's facts cleared.
    Uninstalled { script: String, path: PathBuf },
    /// The launcher was already gone; the host's facts were cleared anyway.
    AlreadyRemoved { script: String, path: PathBuf },
    /// Nothing is recorded for this host.
    NotInstalled { script: String, host: String },
}

impl fmt::Display for UninstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninstalled { script, path } => {
                write!(f, "Uninstalled {script} from {}", path.display())
            }
            Self::AlreadyRemoved { script, path } => write!(
                f,
                "Warning: {} was already removed; cleared metadata for {script}",
                path.display()
            ),
            Self::NotInstalled { script, host } => write!(
                f,
                "No installation metadata found for {script} on host {host}"
            ),
        }
    }
}

/// Installs and uninstalls scripts for the current host.
pub struct Installer<'a> {
    registry: &'a ScriptRegistry,
    host: &'a dyn HostIdentity,
    default_target: PathBuf,
    launcher: String,
}

impl<'a> Installer<'a> {
    /// Create an installer that writes to `default_target` unless told
    /// otherwise and whose launchers exec `taku`.
    pub fn new(
        registry: &'a ScriptRegistry,
        host: &'a dyn HostIdentity,
        default_target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            host,
            default_target: default_target.into(),
            launcher: "taku".into(),
        }
    }

    /// Set the program launchers `exec` into.
    pub fn with_launcher(mut self, launcher: impl Into<String>) -> Self {
        self.launcher = launcher.into();
        self
    }

    /// Install `target` into `target_dir` (or the default directory).
    ///
    /// `install_name` renames the launcher of a single script; it is ignored
    /// for [`InstallTarget::All`].
    pub fn install(
        &self,
        target: &InstallTarget,
        install_name: Option<&str>,
        target_dir: Option<&Path>,
    ) -> Result<Vec<InstallOutcome>> {
        let host = self.host.current_host()?;
        let target_dir = target_dir.unwrap_or(self.default_target.as_path());
        let target_dir = std::path::absolute(target_dir)?;

        match target {
            InstallTarget::Script(name) => {
                let outcome = self.install_one(&host, name, install_name, &target_dir)?;
                Ok(vec![outcome])
            }
            InstallTarget::All => {
                if install_name.is_some() {
                    warn!("custom install name is ignored when installing all scripts");
                }
                let mut names = Vec::new();
                for name in self.registry.list()? {
                    if !self.registry.exists(&name) {
                        warn!(script = %name, "directory has no executable, skipping");
                        continue;
                    }
                    names.push(name);
                }

                // Every document must load before any launcher is written.
                for name in &names {
                    self.registry.store().load(name)?;
                }

                names
                    .iter()
                    .map(|name| self.install_one(&host, name, None, &target_dir))
                    .collect()
            }
        }
    }

    fn install_one(
        &self,
        host: &str,
        name: &str,
        install_name: Option<&str>,
        target_dir: &Path,
    ) -> Result<InstallOutcome> {
        self.registry.require(name)?;
        let effective = install_name.unwrap_or(name);
        validate_name(effective)?;

        // Refuse early on corrupt metadata so nothing is left behind.
        self.registry.store().load(name)?;

        let path = target_dir.join(effective);
        if path.exists() || path.is_symlink() {
            info!(script = %name, path = %path.display(), "install target exists, skipping");
            return Ok(InstallOutcome::Skipped {
                script: name.to_owned(),
                path,
            });
        }

        std::fs::create_dir_all(target_dir)?;
        let body = self.launcher_script(name)?;

        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Ok(InstallOutcome::Skipped {
                    script: name.to_owned(),
                    path,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let facts = HostFacts::new(effective, target_dir.to_string_lossy());
        let recorded = file
            .write_all(body.as_bytes())
            .and_then(|()| make_executable(&path))
            .map_err(TakuError::from)
            .and_then(|()| self.registry.store().merge_host_facts(name, host, &facts));

        if let Err(e) = recorded {
            let _ = std::fs::remove_file(&path);
            return Err(e);
        }

        info!(script = %name, host = %host, path = %path.display(), "installed");
        Ok(InstallOutcome::Installed {
            script: name.to_owned(),
            path,
        })
    }

    /// Remove this host's install of `name`.
    ///
    /// Only the recorded launcher is deleted; without recorded facts nothing
    /// is guessed or removed.
    pub fn uninstall(&self, name: &str) -> Result<UninstallOutcome> {
        validate_name(name)?;
        let host = self.host.current_host()?;
        let store = self.registry.store();

        let Some(facts) = store.host_facts(name, &host)? else {
            info!(script = %name, host = %host, "no install recorded for host");
            return Ok(UninstallOutcome::NotInstalled {
                script: name.to_owned(),
                host,
            });
        };

        let path = facts.installed_path();
        let removed = match std::fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        store.remove_host_facts(name, &host)?;

        if removed {
            info!(script = %name, host = %host, path = %path.display(), "uninstalled");
            Ok(UninstallOutcome::Uninstalled {
                script: name.to_owned(),
                path,
            })
        } else {
            warn!(script = %name, path = %path.display(), "installed file was already gone");
            Ok(UninstallOutcome::AlreadyRemoved {
                script: name.to_owned(),
                path,
            })
        }
    }

    /// Body of the launcher installed for `name`.
    pub fn launcher_script(&self, name: &str) -> Result<String> {
        let root = std::path::absolute(self.registry.root())?;
        Ok(format!(
            "#!/usr/bin/env bash\nexport {SCRIPTS_ENV_VAR}=\"{}\"\nexec {} run \"{name}\" -- \"$@\"\n",
            root.display(),
            self.launcher,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
