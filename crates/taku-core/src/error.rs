//! Error types for taku.
//!
//! Every fallible operation in this crate returns [`TakuError`] via the
//! [`Result`] alias.  Soft conditions (an install target that already exists,
//! an uninstall with nothing recorded) are not errors; they are reported
//! through the outcome types in [`crate::installer`].

use std::path::PathBuf;

/// Errors surfaced by the script registry, metadata store and installer.
#[derive(Debug, thiserror::Error)]
pub enum TakuError {
    #[error("the script `{0}` already exists")]
    ScriptAlreadyExists(String),

    #[error("script `{0}` not found")]
    ScriptNotFound(String),

    #[error("template `{0}` does not exist")]
    TemplateNotFound(String),

    /// The metadata file exists but is not valid TOML.  Never overwritten.
    #[error("corrupt metadata in `{path}`: {source}")]
    MetadataCorrupt {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to encode metadata: {0}")]
    MetadataEncode(#[from] toml::ser::Error),

    #[error("invalid script name `{name}`: {reason}")]
    InvalidScriptName { name: String, reason: &'static str },

    #[error("invalid configuration in `{path}`: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("`{program}` exited with status {code}")]
    CommandFailed { program: String, code: i32 },

    #[error("could not determine host name: {0}")]
    HostUnavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TakuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_exists_display() {
        let err = TakuError::ScriptAlreadyExists("test".into());
        assert_eq!(err.to_string(), "the script `test` already exists");
    }

    #[test]
    fn template_not_found_display() {
        let err = TakuError::TemplateNotFound("python".into());
        assert_eq!(err.to_string(), "template `python` does not exist");
    }

    #[test]
    fn command_failed_display() {
        let err = TakuError::CommandFailed {
            program: "git".into(),
            code: 128,
        };
        assert_eq!(err.to_string(), "`git` exited with status 128");
    }

    #[test]
    fn metadata_corrupt_keeps_path() {
        let source = "= broken".parse::<toml::Table>().unwrap_err();
        let err = TakuError::MetadataCorrupt {
            path: PathBuf::from("/scripts/test/meta.toml"),
            source,
        };
        assert!(err.to_string().contains("/scripts/test/meta.toml"));
    }

    #[test]
    fn io_error_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file gone");
        let err = TakuError::from(io_err);
        assert!(err.to_string().contains("file gone"));
    }
}
