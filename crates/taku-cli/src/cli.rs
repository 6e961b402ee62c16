//! CLI argument definitions for taku.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

/// taku -- keep your scripts in one place and put them on your PATH.
#[derive(Parser)]
#[command(
    name = "taku",
    version,
    about = "taku -- a personal script manager",
    long_about = "Create, edit, run and install small scripts kept under a single \
                  directory, and keep that directory in sync across machines."
)]
pub struct Cli {
    /// Scripts root (overrides TAKU_SCRIPTS and the config file).
    #[arg(long, short, global = true, value_name = "DIR")]
    pub scripts: Option<PathBuf>,

    /// Show debug logs on stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new script.
    New {
        /// Name of the script.
        name: String,
        /// Template from `<scripts>/.templates` to start from.
        #[arg(long, short, conflicts_with = "content")]
        template: Option<String>,
        /// Literal script content.
        #[arg(long, short)]
        content: Option<String>,
    },

    /// Show a script and its metadata.
    Get {
        name: String,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Remove a script (uninstalling it from this host first).
    Rm { name: String },

    /// List available scripts.
    Ls {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Open a script in $EDITOR.
    Edit { name: String },

    /// Run a script, forwarding any extra arguments.
    ///
    /// Arguments after `--` reach the script untouched, including ones that
    /// look like taku's own flags.
    #[command(disable_help_flag = true)]
    Run {
        name: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Install a script (or `all`) onto the PATH.
    Install {
        /// Script name, or `all`.
        #[arg(default_value = "all")]
        name: String,
        /// File name to install under.
        #[arg(long = "as", value_name = "NAME")]
        install_as: Option<String>,
        /// Directory to install into (default: ~/.local/bin).
        #[arg(long, value_name = "DIR")]
        target_dir: Option<PathBuf>,
    },

    /// Remove a script's launcher from this host (`all` for every script).
    Uninstall { name: String },

    /// Push and/or pull the scripts root with git (both when no flag given).
    Sync {
        #[arg(long)]
        push: bool,
        #[arg(long)]
        pull: bool,
    },

    /// Manage the systemd user timer that pulls scripts periodically.
    #[command(group(ArgGroup::new("action").required(true).args(["install", "remove"])))]
    Service {
        #[arg(long)]
        install: bool,
        #[arg(long)]
        remove: bool,
    },
}
