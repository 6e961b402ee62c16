//! Configuration for taku.
//!
//! [`TakuConfig`] is resolved from an explicit [`Environment`] snapshot rather
//! than from ambient lookups, so every path the library touches is an input.
//! Precedence, lowest to highest:
//!
//! 1. Built-in defaults (`~/scripts`, `~/.local/bin`, `vi`, `taku`).
//! 2. `<config_dir>/taku/config.toml`.
//! 3. `TAKU_SCRIPTS` and `EDITOR` from the environment snapshot.
//! 4. Explicit overrides from the command line.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, TakuError};

/// Environment variable naming the scripts root.  Also exported by launchers.
pub const SCRIPTS_ENV_VAR: &str = "TAKU_SCRIPTS";

/// Environment variable naming the user's editor.
pub const EDITOR_ENV_VAR: &str = "EDITOR";

/// Snapshot of the process environment that configuration depends on.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// The user's home directory.
    pub home: PathBuf,
    /// The per-user configuration directory (e.g. `~/.config`).
    pub config_dir: PathBuf,
    /// Selected environment variables.
    pub vars: BTreeMap<String, String>,
}

impl Environment {
    /// Build an environment rooted at `home`, with `home/.config` as the
    /// configuration directory and no variables set.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            config_dir: home.join(".config"),
            home,
            vars: BTreeMap::new(),
        }
    }

    /// Set a variable on the snapshot.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Look up a non-empty variable.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Expand a leading `~` or `~/` against the home directory.
    pub fn expand(&self, path: &Path) -> PathBuf {
        match path.strip_prefix("~") {
            Ok(rest) => self.home.join(rest),
            Err(_) => path.to_path_buf(),
        }
    }

    /// Location of the optional configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("taku").join("config.toml")
    }
}

/// On-disk shape of `config.toml`.  Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    scripts_dir: Option<PathBuf>,
    target_dir: Option<PathBuf>,
    editor: Option<String>,
    launcher: Option<String>,
    push_on_remove: Option<bool>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakuConfig {
    /// Root directory holding one subdirectory per script.
    pub scripts_dir: PathBuf,
    /// Default directory launchers are installed into.
    pub target_dir: PathBuf,
    /// Editor command line; split on whitespace before the script path is
    /// appended.
    pub editor: String,
    /// Program the installed launchers `exec` into.
    pub launcher: String,
    /// Push to the sync remote after removing a script.
    pub push_on_remove: bool,
}

impl TakuConfig {
    /// Built-in defaults for the given environment.
    pub fn defaults(env: &Environment) -> Self {
        Self {
            scripts_dir: env.home.join("scripts"),
            target_dir: env.home.join(".local").join("bin"),
            editor: "vi".into(),
            launcher: "taku".into(),
            push_on_remove: false,
        }
    }

    /// Resolve configuration from defaults, the config file and the
    /// environment snapshot.  `scripts_override` wins over everything.
    pub fn resolve(env: &Environment, scripts_override: Option<&Path>) -> Result<Self> {
        let mut config = Self::defaults(env);

        let path = env.config_file();
        if path.is_file() {
            let file = load_file(&path)?;
            debug!(path = %path.display(), "loaded configuration file");
            config.apply(env, file);
        }

        if let Some(dir) = env.var(SCRIPTS_ENV_VAR) {
            config.scripts_dir = env.expand(Path::new(dir));
        }
        if let Some(editor) = env.var(EDITOR_ENV_VAR) {
            config.editor = editor.to_owned();
        }
        if let Some(dir) = scripts_override {
            config.scripts_dir = env.expand(dir);
        }

        Ok(config)
    }

    fn apply(&mut self, env: &Environment, file: FileConfig) {
        if let Some(dir) = file.scripts_dir {
            self.scripts_dir = env.expand(&dir);
        }
        if let Some(dir) = file.target_dir {
            self.target_dir = env.expand(&dir);
        }
        if let Some(editor) = file.editor {
            self.editor = editor;
        }
        if let Some(launcher) = file.launcher {
            self.launcher = launcher;
        }
        if let Some(push) = file.push_on_remove {
            self.push_on_remove = push;
        }
    }

    /// The editor command line as an argv prefix.
    pub fn editor_argv(&self) -> Vec<String> {
        self.editor.split_whitespace().map(str::to_owned).collect()
    }
}

fn load_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| TakuError::InvalidConfig {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
