//! Script registry -- the on-disk layout of script entries.
//!
//! Each script lives in its own directory under the scripts root:
//!
//! ```text
//! <root>/
//!   .templates/<template>      reserved, never listed
//!   <name>/<name>              the executable
//!   <name>/meta.toml           optional metadata
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, TakuError};
use crate::installer::{Installer, UninstallOutcome};
use crate::metadata::{Metadata, MetadataStore};
use crate::process::ProcessRunner;
use crate::template;

/// Directive prepended to content that has none.
pub const DEFAULT_SHEBANG: &str = "#!/usr/bin/env bash";

/// Where the initial bytes of a new script come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationSource {
    /// Built-in body that greets with the script's name.
    Default,
    /// Render the named template from `.templates`.
    Template(String),
    /// Use these bytes as-is (a directive is added if missing).
    Literal(Vec<u8>),
}

impl CreationSource {
    /// Build a source from the two optional command-line inputs.
    ///
    /// Empty strings count as absent.
    ///
    /// # Panics
    ///
    /// Panics when both `template` and `content` are non-empty; callers must
    /// reject that combination before getting here.
    pub fn from_options(template: Option<String>, content: Option<String>) -> Self {
        let template = template.filter(|t| !t.is_empty());
        let content = content.filter(|c| !c.is_empty());
        assert!(
            !(template.is_some() && content.is_some()),
            "a script is created from a template or from literal content, not both"
        );

        match (template, content) {
            (Some(t), _) => Self::Template(t),
            (_, Some(c)) => Self::Literal(c.into_bytes()),
            _ => Self::Default,
        }
    }
}

/// A script read back from the registry.
#[derive(Debug, Clone)]
pub struct Script {
    pub name: String,
    /// Path of the executable file.
    pub path: PathBuf,
    pub content: Vec<u8>,
    /// `None` when the script has no metadata file yet.
    pub metadata: Option<Metadata>,
}

/// Reject names that cannot be a script directory.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.starts_with('.') {
        "name starts with `.`"
    } else if name.contains('/') || name.contains('\\') {
        "name contains a path separator"
    } else {
        return Ok(());
    };

    Err(TakuError::InvalidScriptName {
        name: name.to_owned(),
        reason,
    })
}

/// Owns the scripts root.
#[derive(Debug, Clone)]
pub struct ScriptRegistry {
    root: PathBuf,
    store: MetadataStore,
}

impl ScriptRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            store: MetadataStore::new(&root),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The metadata store for this root.
    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    pub fn script_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Path of the executable file for `name` (which may not exist).
    pub fn script_path(&self, name: &str) -> PathBuf {
        self.root.join(name).join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.script_path(name).is_file()
    }

    /// Absolute path of an existing script, or [`TakuError::ScriptNotFound`].
    pub fn require(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let path = self.script_path(name);
        if !path.is_file() {
            return Err(TakuError::ScriptNotFound(name.to_owned()));
        }
        Ok(std::path::absolute(&path)?)
    }

    /// Create a new script entry.  No metadata file is written.
    pub fn create(&self, name: &str, source: &CreationSource) -> Result<PathBuf> {
        validate_name(name)?;

        let dir = self.script_dir(name);
        if dir.exists() {
            return Err(TakuError::ScriptAlreadyExists(name.to_owned()));
        }

        let body = match source {
            CreationSource::Template(t) => template::render(&self.root, t, name)?,
            CreationSource::Literal(bytes) => bytes.clone(),
            CreationSource::Default => default_body(name),
        };
        let body = with_directive(body);

        std::fs::create_dir_all(&dir)?;
        let path = self.script_path(name);
        let written = std::fs::write(&path, &body).and_then(|()| make_executable(&path));
        if let Err(e) = written {
            let _ = std::fs::remove_dir_all(&dir);
            return Err(e.into());
        }

        info!(script = %name, path = %path.display(), "script created");
        Ok(path)
    }

    /// Read a script and its metadata.
    pub fn read(&self, name: &str) -> Result<Script> {
        let path = self.require(name)?;
        let content = std::fs::read(&path)?;

        let metadata = if self.store.path(name).exists() {
            Some(self.store.load(name)?)
        } else {
            None
        };

        Ok(Script {
            name: name.to_owned(),
            path,
            content,
            metadata,
        })
    }

    /// Remove a script directory, first uninstalling it from this host.
    ///
    /// The uninstall is best-effort: its failure is logged and deletion
    /// proceeds.  Returns the uninstall outcome when one was produced.
    pub fn delete(&self, name: &str, installer: &Installer<'_>) -> Result<Option<UninstallOutcome>> {
        validate_name(name)?;
        let dir = self.script_dir(name);
        if !self.script_path(name).is_file() {
            return Err(TakuError::ScriptNotFound(name.to_owned()));
        }

        let outcome = match installer.uninstall(name) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(script = %name, error = %e, "uninstall before delete failed");
                None
            }
        };

        std::fs::remove_dir_all(&dir)?;
        info!(script = %name, "script removed");
        Ok(outcome)
    }

    /// Names of all scripts, sorted.  Dot-directories (`.templates`, `.git`)
    /// are never scripts.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            debug!(path = %self.root.display(), "scripts root does not exist");
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }

    /// Open a script in the editor, then restore its executable bit.
    ///
    /// A non-zero editor exit is logged, not returned.
    pub fn edit(&self, name: &str, editor: &[String], runner: &dyn ProcessRunner) -> Result<()> {
        let path = self.require(name)?;
        if editor.is_empty() {
            return Err(TakuError::CommandFailed {
                program: "<editor>".into(),
                code: 127,
            });
        }

        let mut argv = editor.to_vec();
        argv.push(path.to_string_lossy().into_owned());
        let code = runner.run(&argv)?;
        if code != 0 {
            warn!(script = %name, editor = %argv[0], code, "editor exited with non-zero status");
        }

        if path.is_file() {
            make_executable(&path)?;
        }
        Ok(())
    }

    /// Run a script with `args`, returning its exit code unchanged.
    pub fn run(&self, name: &str, args: &[String], runner: &dyn ProcessRunner) -> Result<i32> {
        let path = self.require(name)?;

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(path.to_string_lossy().into_owned());
        argv.extend_from_slice(args);

        debug!(script = %name, args = ?args, "running script");
        runner.run(&argv)
    }
}

fn default_body(name: &str) -> Vec<u8> {
    format!("{DEFAULT_SHEBANG}\n\necho \"hello from {name}\"\n").into_bytes()
}

/// Prepend [`DEFAULT_SHEBANG`] unless `body` already starts with `#!`.
fn with_directive(body: Vec<u8>) -> Vec<u8> {
    if body.starts_with(b"#!") {
        return body;
    }
    let mut out = Vec::with_capacity(DEFAULT_SHEBANG.len() + 1 + body.len());
    out.extend_from_slice(DEFAULT_SHEBANG.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(&body);
    out
}

/// Mark `path` as `rwxr-xr-x`.
pub(crate) fn make_executable(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
