//! Output projection: format, pagination and the fields to render.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Rendering format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One block per message.
    #[default]
    Text,
    /// Pretty JSON array.
    Json,
    /// YAML sequence.
    Yaml,
    /// Aligned columns.
    Table,
    /// Comma-separated values.
    Csv,
}

/// `output:` block of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Rendering format.
    pub format: OutputFormat,
    /// Maximum number of messages; 0 means no limit.
    pub limit: u32,
    /// Number of most recent matches to skip.
    pub offset: u32,
    /// Only UIDs strictly greater than this.
    pub after_uid: Option<u32>,
    /// Only UIDs strictly less than this.
    pub before_uid: Option<u32>,
    /// Fields to render, in order.
    pub fields: Vec<OutputField>,
}

impl OutputConfig {
    /// Pagination derived from this block. A zero UID bound counts as unset.
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination {
            limit: self.limit,
            offset: self.offset,
            after_uid: self.after_uid.filter(|&u| u > 0),
            before_uid: self.before_uid.filter(|&u| u > 0),
        }
    }
}

/// Limit, offset and UID bounds applied to a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Maximum window size; 0 means unbounded.
    pub limit: u32,
    /// Matches skipped from the most recent end.
    pub offset: u32,
    /// Exclusive lower UID bound.
    pub after_uid: Option<u32>,
    /// Exclusive upper UID bound.
    pub before_uid: Option<u32>,
}

/// Which parts a `mime_parts` field selects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    /// Only the first `text/plain` part.
    TextOnly,
    /// Every leaf part.
    #[default]
    Full,
    /// Parts matching the `types` list.
    Filter,
}

/// Settings of a `body` or `mime_parts` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentField {
    /// Media type a `body` field renders (`text/plain` by default).
    pub media_type: String,
    /// Selection mode.
    pub mode: ContentMode,
    /// Type list for [`ContentMode::Filter`]; `x/*` matches any subtype.
    pub types: Vec<String>,
    /// Render part content.
    pub show_content: bool,
    /// Render part media types.
    pub show_types: bool,
    /// Truncate content to this many characters.
    pub max_length: Option<usize>,
    /// Drop content shorter than this many characters.
    pub min_length: Option<usize>,
}

impl ContentField {
    /// Whether a part of `media_type` passes this field's mode.
    #[must_use]
    pub fn includes(&self, media_type: &str) -> bool {
        let media_type = media_type.to_ascii_lowercase();
        match self.mode {
            ContentMode::TextOnly => media_type.starts_with("text/plain"),
            ContentMode::Full => true,
            ContentMode::Filter => {
                self.types.is_empty()
                    || self.types.iter().any(|t| type_matches(t, &media_type))
            }
        }
    }

    /// Applies the length bounds to rendered content.
    ///
    /// Returns `None` when the content is shorter than `min_length`.
    #[must_use]
    pub fn clip<'a>(&self, content: &'a str) -> Option<&'a str> {
        let chars = content.chars().count();
        if self.min_length.is_some_and(|min| chars < min) {
            return None;
        }
        match self.max_length {
            Some(max) if chars > max => {
                let end = content
                    .char_indices()
                    .nth(max)
                    .map_or(content.len(), |(i, _)| i);
                Some(&content[..end])
            }
            _ => Some(content),
        }
    }
}

fn type_matches(pattern: &str, media_type: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    match pattern.strip_suffix("/*") {
        Some(major) => media_type
            .split_once('/')
            .is_some_and(|(m, _)| m == major),
        None => pattern == media_type,
    }
}

/// A requested output field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawField")]
pub enum OutputField {
    /// Message UID.
    Uid,
    /// Sequence number.
    Seq,
    /// Decoded subject.
    Subject,
    /// From addresses.
    From,
    /// To addresses.
    To,
    /// Cc addresses.
    Cc,
    /// Bcc addresses.
    Bcc,
    /// Envelope date.
    Date,
    /// Flags.
    Flags,
    /// RFC822 size in bytes.
    Size,
    /// Number of matches before pagination.
    TotalCount,
    /// Content of the first part of the configured type.
    Body(ContentField),
    /// Selected MIME parts.
    MimeParts(ContentField),
}

impl OutputField {
    /// Column or key name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Uid => "uid",
            Self::Seq => "seq",
            Self::Subject => "subject",
            Self::From => "from",
            Self::To => "to",
            Self::Cc => "cc",
            Self::Bcc => "bcc",
            Self::Date => "date",
            Self::Flags => "flags",
            Self::Size => "size",
            Self::TotalCount => "total_count",
            Self::Body(_) => "body",
            Self::MimeParts(_) => "mime_parts",
        }
    }

    /// Indices of the parts this field selects, given part media types in
    /// tree order.
    pub fn select_parts<'a, I>(&self, media_types: I) -> Vec<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut types = media_types.into_iter().enumerate();
        match self {
            Self::Body(field) => types
                .find(|(_, t)| t.eq_ignore_ascii_case(&field.media_type))
                .map(|(i, _)| i)
                .into_iter()
                .collect(),
            Self::MimeParts(field) if field.mode == ContentMode::TextOnly => types
                .find(|(_, t)| field.includes(t))
                .map(|(i, _)| i)
                .into_iter()
                .collect(),
            Self::MimeParts(field) => types
                .filter(|(_, t)| field.includes(t))
                .map(|(i, _)| i)
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for OutputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Name(String),
    Content(BTreeMap<String, RawContent>),
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct RawContent {
    #[serde(rename = "type")]
    media_type: Option<String>,
    mode: Option<ContentMode>,
    types: Vec<String>,
    show_content: Option<bool>,
    show_types: Option<bool>,
    max_length: Option<usize>,
    min_length: Option<usize>,
}

impl RawContent {
    fn into_field(self, show_content: bool) -> ContentField {
        ContentField {
            media_type: self
                .media_type
                .map_or_else(|| "text/plain".to_string(), |t| t.to_ascii_lowercase()),
            mode: self.mode.unwrap_or_default(),
            types: self.types,
            show_content: self.show_content.unwrap_or(show_content),
            show_types: self.show_types.unwrap_or(true),
            max_length: self.max_length,
            min_length: self.min_length,
        }
    }
}

impl TryFrom<RawField> for OutputField {
    type Error = String;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        match raw {
            RawField::Name(name) => match name.as_str() {
                "uid" => Ok(Self::Uid),
                "seq" => Ok(Self::Seq),
                "subject" => Ok(Self::Subject),
                "from" => Ok(Self::From),
                "to" => Ok(Self::To),
                "cc" => Ok(Self::Cc),
                "bcc" => Ok(Self::Bcc),
                "date" => Ok(Self::Date),
                "flags" => Ok(Self::Flags),
                "size" => Ok(Self::Size),
                "total_count" => Ok(Self::TotalCount),
                "body" => Ok(Self::Body(RawContent::default().into_field(true))),
                "mime_parts" => Ok(Self::MimeParts(RawContent::default().into_field(false))),
                other => Err(format!("unknown output field: {other}")),
            },
            RawField::Content(map) => {
                let mut entries = map.into_iter();
                let (Some((key, content)), None) = (entries.next(), entries.next()) else {
                    return Err("a content field must have exactly one key".to_string());
                };
                match key.as_str() {
                    "body" => Ok(Self::Body(content.into_field(true))),
                    "mime_parts" => Ok(Self::MimeParts(content.into_field(false))),
                    other => Err(format!("unknown content field: {other}")),
                }
            }
        }
    }
}
