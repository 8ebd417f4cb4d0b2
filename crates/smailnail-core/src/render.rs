//! Rendering messages in the configured output format.

use std::io::Write;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::message::{DomainMessage, MimePart};
use crate::rule::{ContentField, OutputConfig, OutputField, OutputFormat};

/// Writes `messages` projected onto `output.fields`.
///
/// # Errors
///
/// Returns an error if writing or serialization fails.
pub fn render<W: Write>(messages: &[DomainMessage], output: &OutputConfig, out: &mut W) -> Result<()> {
    if messages.is_empty() {
        warn!("no messages matched");
        return Ok(());
    }
    let rows: Vec<Row<'_>> = messages
        .iter()
        .map(|m| Row::project(m, &output.fields))
        .collect();
    match output.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &rows)?;
            writeln!(out)?;
        }
        OutputFormat::Yaml => serde_yaml::to_writer(&mut *out, &rows)?,
        OutputFormat::Csv => write_csv(&rows, out)?,
        OutputFormat::Table => write_table(&rows, out)?,
        OutputFormat::Text => write_text(&rows, out)?,
    }
    Ok(())
}

/// One rendered value.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Value<'a> {
    Number(u64),
    Text(&'a str),
    List(&'a [String]),
    Parts(Vec<PartView<'a>>),
    Missing,
}

impl Value<'_> {
    fn scalar(&self) -> Option<String> {
        match self {
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) => Some((*s).to_string()),
            Self::List(items) => Some(items.join(", ")),
            Self::Missing => Some(String::new()),
            Self::Parts(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct PartView<'a> {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    media_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    charset: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<&'a str>,
}

/// Requested fields of one message, in order.
#[derive(Debug)]
struct Row<'a>(Vec<(&'static str, Value<'a>)>);

impl<'a> Row<'a> {
    fn project(message: &'a DomainMessage, fields: &[OutputField]) -> Self {
        Self(
            fields
                .iter()
                .map(|field| (field.name(), value(message, field)))
                .collect(),
        )
    }

    fn scalars(&self) -> impl Iterator<Item = (&'static str, String)> + '_ {
        self.0
            .iter()
            .filter_map(|(name, value)| value.scalar().map(|v| (*name, v)))
    }
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

fn value<'a>(message: &'a DomainMessage, field: &OutputField) -> Value<'a> {
    match field {
        OutputField::Uid => message.uid.map_or(Value::Missing, |u| Value::Number(u.into())),
        OutputField::Seq => Value::Number(message.seq.into()),
        OutputField::Subject => Value::Text(&message.subject),
        OutputField::From => Value::List(&message.from),
        OutputField::To => Value::List(&message.to),
        OutputField::Cc => Value::List(&message.cc),
        OutputField::Bcc => Value::List(&message.bcc),
        OutputField::Date => message.date.as_deref().map_or(Value::Missing, Value::Text),
        OutputField::Flags => Value::List(&message.flags),
        OutputField::Size => Value::Number(message.size.into()),
        OutputField::TotalCount => Value::Number(message.total_count.into()),
        OutputField::Body(content) => selected(message, field)
            .next()
            .and_then(|part| content.clip(&part.content))
            .map_or(Value::Missing, Value::Text),
        OutputField::MimeParts(content) => Value::Parts(
            selected(message, field)
                .filter_map(|part| part_view(part, content))
                .collect(),
        ),
    }
}

fn selected<'a>(
    message: &'a DomainMessage,
    field: &OutputField,
) -> impl Iterator<Item = &'a MimePart> {
    field
        .select_parts(message.parts.iter().map(|p| p.media_type.as_str()))
        .into_iter()
        .filter_map(|i| message.parts.get(i))
}

fn part_view<'a>(part: &'a MimePart, field: &ContentField) -> Option<PartView<'a>> {
    let content = field.clip(&part.content)?;
    Some(PartView {
        media_type: field.show_types.then_some(part.media_type.as_str()),
        content: field.show_content.then_some(content),
        size: part.size,
        charset: part.charset.as_deref(),
        filename: part.filename.as_deref(),
    })
}

fn write_csv<W: Write>(rows: &[Row<'_>], out: &mut W) -> std::io::Result<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let header: Vec<String> = first.scalars().map(|(name, _)| csv_escape(name)).collect();
    writeln!(out, "{}", header.join(","))?;
    for row in rows {
        let cells: Vec<String> = row.scalars().map(|(_, v)| csv_escape(&v)).collect();
        writeln!(out, "{}", cells.join(","))?;
    }
    Ok(())
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_table<W: Write>(rows: &[Row<'_>], out: &mut W) -> std::io::Result<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let header: Vec<String> = first.scalars().map(|(name, _)| name.to_uppercase()).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.scalars().map(|(_, v)| v.replace(['\n', '\r'], " ")).collect())
        .collect();
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_table_line(out, &header, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_table_line(out, &rule, &widths)?;
    for row in &cells {
        write_table_line(out, row, &widths)?;
    }
    Ok(())
}

fn write_table_line<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> std::io::Result<()> {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    writeln!(out, "{}", padded.join("  ").trim_end())
}

fn write_text<W: Write>(rows: &[Row<'_>], out: &mut W) -> std::io::Result<()> {
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            writeln!(out, "---")?;
        }
        for (name, value) in &row.0 {
            match value {
                Value::Parts(parts) => {
                    writeln!(out, "{name}:")?;
                    for part in parts {
                        match part.media_type {
                            Some(t) => write!(out, "  - {t}, {} bytes", part.size)?,
                            None => write!(out, "  - {} bytes", part.size)?,
                        }
                        match part.filename {
                            Some(f) => writeln!(out, ", {f}")?,
                            None => writeln!(out)?,
                        }
                        if let Some(content) = part.content {
                            for l in content.lines() {
                                writeln!(out, "    {l}")?;
                            }
                        }
                    }
                }
                Value::Text(text) if text.contains('\n') => {
                    writeln!(out, "{name}:")?;
                    for l in text.lines() {
                        writeln!(out, "  {l}")?;
                    }
                }
                other => writeln!(out, "{name}: {}", other.scalar().unwrap_or_default())?,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rule::{ContentMode, OutputFormat};

    fn message() -> DomainMessage {
        DomainMessage {
            seq: 3,
            uid: Some(103),
            subject: "Quarterly, final".into(),
            from: vec!["Ann <ann@example.com>".into()],
            to: vec!["bob@example.com".into(), "cy@example.com".into()],
            flags: vec!["\\Seen".into()],
            size: 900,
            total_count: 7,
            parts: vec![
                MimePart {
                    path: "1".into(),
                    media_type: "text/plain".into(),
                    content: "hello world".into(),
                    size: 11,
                    charset: Some("utf-8".into()),
                    ..MimePart::default()
                },
                MimePart {
                    path: "2".into(),
                    media_type: "application/pdf".into(),
                    size: 5000,
                    filename: Some("q3.pdf".into()),
                    ..MimePart::default()
                },
            ],
            ..DomainMessage::default()
        }
    }

    fn content(mode: ContentMode, show_content: bool) -> ContentField {
        ContentField {
            media_type: "text/plain".into(),
            mode,
            types: Vec::new(),
            show_content,
            show_types: true,
            max_length: None,
            min_length: None,
        }
    }

    fn config(format: OutputFormat, fields: Vec<OutputField>) -> OutputConfig {
        OutputConfig {
            format,
            fields,
            ..OutputConfig::default()
        }
    }

    fn rendered(messages: &[DomainMessage], output: &OutputConfig) -> String {
        let mut out = Vec::new();
        render(messages, output, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn json_keeps_field_order() {
        let mut body = content(ContentMode::Full, true);
        body.max_length = Some(5);
        let out = rendered(
            &[message()],
            &config(
                OutputFormat::Json,
                vec![OutputField::Uid, OutputField::Subject, OutputField::Body(body)],
            ),
        );
        let uid = out.find("\"uid\"").unwrap();
        let subject = out.find("\"subject\"").unwrap();
        assert!(uid < subject);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["uid"], 103);
        assert_eq!(value[0]["body"], "hello");
    }

    #[test]
    fn mime_parts_respect_visibility() {
        let out = rendered(
            &[message()],
            &config(
                OutputFormat::Json,
                vec![OutputField::MimeParts(content(ContentMode::Full, false))],
            ),
        );
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let parts = value[0]["mime_parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text/plain");
        assert!(parts[0].get("content").is_none());
        assert_eq!(parts[1]["filename"], "q3.pdf");
    }

    #[test]
    fn min_length_drops_short_parts() {
        let mut field = content(ContentMode::Full, true);
        field.min_length = Some(1);
        let out = rendered(
            &[message()],
            &config(OutputFormat::Json, vec![OutputField::MimeParts(field)]),
        );
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["mime_parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn yaml_output() {
        let out = rendered(
            &[message()],
            &config(OutputFormat::Yaml, vec![OutputField::Seq, OutputField::To]),
        );
        assert!(out.contains("seq: 3"));
        assert!(out.contains("- bob@example.com"));
    }

    #[test]
    fn csv_quotes_and_skips_content() {
        let out = rendered(
            &[message()],
            &config(
                OutputFormat::Csv,
                vec![
                    OutputField::Uid,
                    OutputField::Subject,
                    OutputField::To,
                    OutputField::MimeParts(content(ContentMode::Full, true)),
                ],
            ),
        );
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("uid,subject,to"));
        assert_eq!(
            lines.next(),
            Some("103,\"Quarterly, final\",\"bob@example.com, cy@example.com\"")
        );
    }

    #[test]
    fn table_aligns_columns() {
        let mut second = message();
        second.uid = Some(7);
        second.subject = "Hi".into();
        let out = rendered(
            &[message(), second],
            &config(OutputFormat::Table, vec![OutputField::Uid, OutputField::Subject]),
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "UID  SUBJECT");
        assert_eq!(lines[1], "---  ----------------");
        assert_eq!(lines[2], "103  Quarterly, final");
        assert_eq!(lines[3], "7    Hi");
    }

    #[test]
    fn text_blocks() {
        let mut second = message();
        second.uid = None;
        let out = rendered(
            &[message(), second],
            &config(
                OutputFormat::Text,
                vec![
                    OutputField::Uid,
                    OutputField::From,
                    OutputField::MimeParts(content(ContentMode::TextOnly, true)),
                ],
            ),
        );
        assert!(out.starts_with("uid: 103\nfrom: Ann <ann@example.com>\nmime_parts:\n  - text/plain, 11 bytes\n    hello world\n---\nuid: \n"));
    }

    #[test]
    fn nothing_rendered_for_no_messages() {
        let out = rendered(&[], &config(OutputFormat::Json, vec![OutputField::Uid]));
        assert!(out.is_empty());
    }
}
