//! Catalog -- listing and detail views over the registry.

use std::fmt;

use crate::error::Result;
use crate::metadata::HostFacts;
use crate::registry::ScriptRegistry;

/// Everything `taku get` shows about one script.
#[derive(Debug, Clone)]
pub struct ScriptDetails {
    pub name: String,
    pub path: String,
    pub content: String,
    /// Free-form metadata fields in document order.
    pub fields: Vec<(String, toml::Value)>,
    /// Recorded installs by host, in document order.
    pub installs: Vec<(String, HostFacts)>,
}

impl ScriptDetails {
    /// Render as a JSON object.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| Ok((k.clone(), serde_json::to_value(v)?)))
            .collect::<Result<_>>()?;
        let installs: serde_json::Map<String, serde_json::Value> = self
            .installs
            .iter()
            .map(|(host, facts)| Ok((host.clone(), serde_json::to_value(facts)?)))
            .collect::<Result<_>>()?;

        Ok(serde_json::json!({
            "name": self.name,
            "path": self.path,
            "content": self.content,
            "metadata": fields,
            "installs": installs,
        }))
    }
}

impl fmt::Display for ScriptDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---")?;
        writeln!(f, "name : {}", self.name)?;
        writeln!(f, "content : {}", self.content)?;
        for (key, value) in &self.fields {
            writeln!(f, "{key} : {}", scalar(value))?;
        }
        for (host, facts) in &self.installs {
            writeln!(f, "installed[{host}] : {}", facts.installed_path().display())?;
        }
        write!(f, "---")
    }
}

/// Strings print bare; everything else in TOML syntax.
fn scalar(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Gather the detail view for `name`.
pub fn describe(registry: &ScriptRegistry, name: &str) -> Result<ScriptDetails> {
    let script = registry.read(name)?;
    let metadata = script.metadata.unwrap_or_default();

    Ok(ScriptDetails {
        name: script.name,
        path: script.path.to_string_lossy().into_owned(),
        content: String::from_utf8_lossy(&script.content).into_owned(),
        fields: metadata
            .free_fields()
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.clone()))
            .collect(),
        installs: metadata
            .hosts()
            .into_iter()
            .map(|(h, facts)| (h.to_owned(), facts))
            .collect(),
    })
}

/// The `taku ls` listing.
pub fn render_list(names: &[String]) -> String {
    let mut out = String::from("Available scripts:");
    for name in names {
        out.push_str("\n- ");
        out.push_str(name);
    }
    out
}
