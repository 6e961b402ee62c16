//! Core of taku, a personal script manager.
//!
//! Scripts live under a root directory, one subdirectory per script.  This
//! crate provides:
//!
//! - **Script registry** -- create scripts from a template, literal content
//!   or a default body; read, list, delete, edit and run them.
//!
//! - **Template resolver** -- render `.templates/<name>` with the script's
//!   name substituted for `${script_name}`.
//!
//! - **Metadata store** -- the per-script `meta.toml`, preserving free-form
//!   fields across every rewrite.
//!
//! - **Installer** -- write launchers onto the executable search path and
//!   record, per host, where they went.
//!
//! - **Sync and service** -- git push/pull of the root and the systemd user
//!   units that pull it periodically.
//!
//! Host name, child processes and user directories are injected through
//! [`HostIdentity`], [`ProcessRunner`] and [`Environment`].
//!
//! # Example
//!
//! ```rust,no_run
//! use taku_core::{CreationSource, FixedHost, InstallTarget, Installer, ScriptRegistry};
//!
//! let registry = ScriptRegistry::new("/home/me/scripts");
//! registry.create("deploy", &CreationSource::Literal(b"echo deploy".to_vec())).unwrap();
//!
//! let host = FixedHost::new("ci-1");
//! let installer = Installer::new(&registry, &host, "/home/me/.local/bin");
//! for outcome in installer.install(&InstallTarget::parse("deploy"), Some("deploy-prod"), None).unwrap() {
//!     println!("{outcome}");
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod host;
pub mod installer;
pub mod metadata;
pub mod process;
pub mod registry;
pub mod service;
pub mod sync;
pub mod template;

pub use catalog::{ScriptDetails, describe, render_list};
pub use config::{Environment, TakuConfig};
pub use error::{Result, TakuError};
pub use host::{FixedHost, HostIdentity, SystemHost};
pub use installer::{InstallOutcome, InstallTarget, Installer, UninstallOutcome};
pub use metadata::{HostFacts, Metadata, MetadataStore};
pub use process::{ProcessRunner, SystemRunner};
pub use registry::{CreationSource, Script, ScriptRegistry};
pub use service::SyncService;
