//! Post-match actions.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

/// `actions:` block of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Flags to add and remove.
    pub flags: Option<FlagActions>,
    /// Mailbox to move matches to.
    pub move_to: Option<String>,
    /// Mailbox to copy matches to.
    pub copy_to: Option<String>,
    /// Deletion mode; `delete: false` leaves this unset.
    #[serde(deserialize_with = "deserialize_delete")]
    pub delete: Option<DeleteConfig>,
    /// Raw message export.
    pub export: Option<ExportConfig>,
}

impl ActionConfig {
    /// True if no action is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.as_ref().is_none_or(FlagActions::is_empty)
            && self.move_to.is_none()
            && self.copy_to.is_none()
            && self.delete.is_none()
            && self.export.is_none()
    }
}

/// `flags: {add: [...], remove: [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlagActions {
    /// Flags to set.
    pub add: Vec<String>,
    /// Flags to clear.
    pub remove: Vec<String>,
}

impl FlagActions {
    /// True if neither list has entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// How `delete` removes messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteConfig {
    /// Mark `\Deleted` and expunge.
    Permanent,
    /// `{trash: true}` moves to `Trash`; `{trash: false}` is permanent.
    MoveToTrash(bool),
}

impl DeleteConfig {
    /// True when messages go to the trash mailbox instead of being expunged.
    #[must_use]
    pub const fn uses_trash(self) -> bool {
        matches!(self, Self::MoveToTrash(true))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDelete {
    Flag(bool),
    Trash { trash: bool },
}

fn deserialize_delete<'de, D>(deserializer: D) -> Result<Option<DeleteConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawDelete>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(RawDelete::Flag(false)) => None,
        Some(RawDelete::Flag(true)) => Some(DeleteConfig::Permanent),
        Some(RawDelete::Trash { trash }) => Some(DeleteConfig::MoveToTrash(trash)),
    })
}

/// Export file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One RFC 5322 message per file.
    #[default]
    Eml,
    /// One message per file with an mbox `From ` separator.
    Mbox,
}

impl ExportFormat {
    /// File extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Eml => "eml",
            Self::Mbox => "mbox",
        }
    }
}

/// `export: {format, directory, filename_template}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File format.
    pub format: ExportFormat,
    /// Target directory.
    pub directory: PathBuf,
    /// File name template over `subject`, `uid`, `seq`, `date` and `from`.
    pub filename_template: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            directory: PathBuf::from("."),
            filename_template: None,
        }
    }
}
