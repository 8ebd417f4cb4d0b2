//! Generator configuration files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::template::Value;
use crate::error::{Error, Result};

/// Top-level generator file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TemplateConfig {
    /// Shared values: strings, string lists or nested maps of those.
    #[serde(default)]
    pub variables: BTreeMap<String, serde_yaml::Value>,
    /// Email templates by name.
    #[serde(default)]
    pub templates: BTreeMap<String, EmailTemplate>,
    /// Generation rules by name.
    #[serde(default)]
    pub rules: BTreeMap<String, GenerationRule>,
    /// What to generate.
    #[serde(default)]
    pub generate: Vec<GenerateEntry>,
}

/// Template for one email; every field is itself a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EmailTemplate {
    /// Subject.
    pub subject: String,
    /// From.
    pub from: String,
    /// To.
    #[serde(default)]
    pub to: Option<String>,
    /// Cc.
    #[serde(default)]
    pub cc: Option<String>,
    /// Bcc.
    #[serde(default)]
    pub bcc: Option<String>,
    /// Reply-To.
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Body.
    pub body: String,
}

/// A template plus the variations cycled through while generating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerationRule {
    /// Template name.
    pub template: String,
    /// Extra context values; email `i` uses variation `i % len`.
    #[serde(default)]
    pub variations: Vec<BTreeMap<String, String>>,
}

/// `count` emails from `rule`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerateEntry {
    /// Rule name.
    pub rule: String,
    /// Number of emails.
    pub count: u32,
    /// File the entry's emails are written to.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl TemplateConfig {
    /// Parses and validates a generator file.
    ///
    /// # Errors
    ///
    /// Returns a YAML error for malformed input, otherwise as
    /// [`TemplateConfig::validate`].
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a generator file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, otherwise as
    /// [`TemplateConfig::from_yaml`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_yaml(&std::fs::read_to_string(path.as_ref())?)
    }

    /// Checks variable types and cross references.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        self.variables()?;
        if self.templates.is_empty() {
            return Err(invalid("no templates defined"));
        }
        if self.rules.is_empty() {
            return Err(invalid("no rules defined"));
        }
        if self.generate.is_empty() {
            return Err(invalid("no generate section defined"));
        }
        for (name, rule) in &self.rules {
            if !self.templates.contains_key(&rule.template) {
                return Err(invalid(&format!(
                    "rule '{name}' refers to undefined template '{}'",
                    rule.template
                )));
            }
            if rule.variations.is_empty() {
                return Err(invalid(&format!("rule '{name}' has no variations")));
            }
            for (i, variation) in rule.variations.iter().enumerate() {
                if let Some((key, _)) = variation.iter().find(|(_, v)| v.is_empty()) {
                    return Err(invalid(&format!(
                        "rule '{name}' variation {i} has empty value for key '{key}'"
                    )));
                }
            }
        }
        for (i, entry) in self.generate.iter().enumerate() {
            if !self.rules.contains_key(&entry.rule) {
                return Err(invalid(&format!(
                    "generate entry {i} refers to undefined rule '{}'",
                    entry.rule
                )));
            }
            if entry.count == 0 {
                return Err(invalid(&format!("generate entry {i} has invalid count 0")));
            }
        }
        Ok(())
    }

    /// Variables as template values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] naming the first value that is not a
    /// string, string list or map.
    pub fn variables(&self) -> Result<BTreeMap<String, Value>> {
        self.variables
            .iter()
            .map(|(key, value)| Ok((key.clone(), convert(value, key)?)))
            .collect()
    }
}

fn invalid(message: &str) -> Error {
    Error::Template(format!("invalid configuration: {message}"))
}

fn convert(value: &serde_yaml::Value, path: &str) -> Result<Value> {
    use serde_yaml::Value as Yaml;
    match value {
        Yaml::String(s) => Ok(Value::Text(s.clone())),
        Yaml::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Yaml::String(s) => Ok(s.clone()),
                _ => Err(invalid(&format!(
                    "variable at path '{path}[{i}]' must be a string"
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        Yaml::Mapping(map) => map
            .iter()
            .map(|(k, v)| {
                let key = k.as_str().ok_or_else(|| {
                    invalid(&format!("variable keys under '{path}' must be strings"))
                })?;
                Ok((key.to_string(), convert(v, &format!("{path}.{key}"))?))
            })
            .collect::<Result<BTreeMap<_, _>>>()
            .map(Value::Map),
        _ => Err(invalid(&format!(
            "variable at path '{path}' must be a string, string list, or map"
        ))),
    }
}
