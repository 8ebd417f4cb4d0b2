//! Synthetic test email generation from YAML templates.

pub mod config;
pub mod template;

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

pub use config::{EmailTemplate, GenerateEntry, GenerationRule, TemplateConfig};
pub use template::{Context, Value, render, render_plain};

/// One generated email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedEmail {
    /// Subject.
    pub subject: String,
    /// From.
    pub from: String,
    /// To.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Cc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    /// Bcc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<String>,
    /// Reply-To.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Body.
    pub body: String,
}

impl GeneratedEmail {
    /// Headers, a blank line and the body.
    #[must_use]
    pub fn to_message_text(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "Subject: {}", self.subject);
        let _ = writeln!(text, "From: {}", self.from);
        for (name, value) in [
            ("To", &self.to),
            ("Cc", &self.cc),
            ("Bcc", &self.bcc),
            ("Reply-To", &self.reply_to),
        ] {
            if let Some(value) = value {
                let _ = writeln!(text, "{name}: {value}");
            }
        }
        text.push('\n');
        text.push_str(&self.body);
        text
    }
}

/// Emails produced by one `generate` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Rule name.
    pub rule: String,
    /// The entry's `output` file, if any.
    pub output: Option<PathBuf>,
    /// Generated emails in index order.
    pub emails: Vec<GeneratedEmail>,
}

/// Serialization of generated emails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataFormat {
    /// Pretty JSON array.
    #[default]
    Json,
    /// YAML sequence.
    Yaml,
}

impl DataFormat {
    /// Serializes `emails`.
    ///
    /// # Errors
    ///
    /// Returns a serialization error.
    pub fn encode(self, emails: &[GeneratedEmail]) -> Result<String> {
        Ok(match self {
            Self::Json => serde_json::to_string_pretty(emails)? + "\n",
            Self::Yaml => serde_yaml::to_string(emails)?,
        })
    }
}

/// Renders the emails a [`TemplateConfig`] describes.
#[derive(Debug)]
pub struct MailGenerator<'a> {
    config: &'a TemplateConfig,
    variables: BTreeMap<String, Value>,
}

impl<'a> MailGenerator<'a> {
    /// Validates `config` and prepares its variables.
    ///
    /// # Errors
    ///
    /// As [`TemplateConfig::validate`].
    pub fn new(config: &'a TemplateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            variables: config.variables()?,
        })
    }

    /// Generates every `generate` entry in order.
    ///
    /// Email `i` of an entry uses variation `i % variations`; variation
    /// values are rendered first and then exposed at the context root next
    /// to `variables`, `index` and `rule`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] naming the rule and index that failed.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Batch>> {
        self.config
            .generate
            .iter()
            .map(|entry| {
                let emails = (0..entry.count)
                    .map(|i| self.one(&entry.rule, i, &mut *rng))
                    .collect::<Result<Vec<_>>>()?;
                debug!(rule = %entry.rule, count = emails.len(), "generated emails");
                Ok(Batch {
                    rule: entry.rule.clone(),
                    output: entry.output.clone(),
                    emails,
                })
            })
            .collect()
    }

    fn one<R: Rng + ?Sized>(&self, rule_name: &str, index: u32, rng: &mut R) -> Result<GeneratedEmail> {
        let at = |e: Error| match e {
            Error::Template(m) => Error::Template(format!("rule '{rule_name}', index {index}: {m}")),
            other => other,
        };
        let rule = self
            .config
            .rules
            .get(rule_name)
            .ok_or_else(|| Error::Template(format!("undefined rule '{rule_name}'")))?;
        let template = self
            .config
            .templates
            .get(&rule.template)
            .ok_or_else(|| Error::Template(format!("undefined template '{}'", rule.template)))?;
        let variation = usize::try_from(index)
            .ok()
            .and_then(|i| rule.variations.get(i % rule.variations.len().max(1)))
            .ok_or_else(|| Error::Template(format!("rule '{rule_name}' has no variations")))?;

        let mut context = Context::new();
        context.insert("variables", Value::Map(self.variables.clone()));
        context.insert("index", index.to_string());
        context.insert("rule", rule_name);

        let mut rendered = Vec::with_capacity(variation.len());
        for (key, value) in variation {
            rendered.push((key.clone(), render(value, &context, &mut *rng).map_err(at)?));
        }
        for (key, value) in rendered {
            context.insert(key, value);
        }

        let mut field = |text: &str| render(text, &context, &mut *rng).map_err(at);
        let subject = field(&template.subject)?;
        let from = field(&template.from)?;
        let to = template.to.as_deref().map(&mut field).transpose()?;
        let cc = template.cc.as_deref().map(&mut field).transpose()?;
        let bcc = template.bcc.as_deref().map(&mut field).transpose()?;
        let reply_to = template.reply_to.as_deref().map(&mut field).transpose()?;
        let body = field(&template.body)?;
        Ok(GeneratedEmail {
            subject,
            from,
            to,
            cc,
            bcc,
            reply_to,
            body,
        })
    }
}

/// Writes `emails` as `email_{i}.txt` files under `dir`.
///
/// # Errors
///
/// Returns an I/O error if the directory or a file cannot be written.
pub fn write_message_files(emails: &[GeneratedEmail], dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    emails
        .iter()
        .enumerate()
        .map(|(i, email)| {
            let path = dir.join(format!("email_{i}.txt"));
            std::fs::write(&path, email.to_message_text())?;
            Ok(path)
        })
        .collect()
}
