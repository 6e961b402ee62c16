//! Template resolver.
//!
//! Templates live in the reserved `.templates` directory of the scripts root
//! and are plain files.  Rendering replaces every occurrence of
//! [`PLACEHOLDER`] with the new script's name; all other bytes pass through.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TakuError};

/// Reserved directory holding templates.  Never listed as a script.
pub const TEMPLATES_DIR: &str = ".templates";

/// Token substituted with the script name.
pub const PLACEHOLDER: &str = "${script_name}";

/// Path of the template `name` under `root`.
pub fn template_path(root: &Path, name: &str) -> PathBuf {
    root.join(TEMPLATES_DIR).join(name)
}

/// Render the template `template` for a script called `script_name`.
///
/// Reads only; nothing is written.
pub fn render(root: &Path, template: &str, script_name: &str) -> Result<Vec<u8>> {
    let path = template_path(root, template);
    if template.is_empty() || !path.is_file() {
        return Err(TakuError::TemplateNotFound(template.to_owned()));
    }

    let bytes = std::fs::read(&path)?;
    debug!(template = %template, path = %path.display(), "rendering template");
    Ok(substitute(&bytes, PLACEHOLDER.as_bytes(), script_name.as_bytes()))
}

/// Byte-level literal replacement of `needle` with `replacement`.
fn substitute(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;

    while let Some(pos) = rest.windows(needle.len()).position(|w| w == needle) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(replacement);
        rest = &rest[pos + needle.len()..];
    }
    out.extend_from_slice(rest);
    out
}
