//! Which parts of a message the output projection needs.

use std::collections::BTreeSet;

use smailnail_imap::{BodyPart, BodyStructure};

use crate::rule::OutputField;

/// A part to fetch for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRequirement {
    /// Section path.
    pub path: String,
    /// `type/subtype`.
    pub media_type: String,
    /// Declared charset.
    pub charset: Option<String>,
    /// Attachment file name.
    pub filename: Option<String>,
    /// Content-Transfer-Encoding.
    pub encoding: String,
}

impl PartRequirement {
    fn new(path: String, part: &BodyPart) -> Self {
        Self {
            path,
            media_type: part.mime_type(),
            charset: part.charset().map(str::to_string),
            filename: part.filename(),
            encoding: part.encoding.clone(),
        }
    }
}

/// Parts of `structure` selected by any content field, in tree order and
/// without duplicates.
#[must_use]
pub fn required_parts(structure: &BodyStructure, fields: &[OutputField]) -> Vec<PartRequirement> {
    let leaves = structure.leaves();
    let types: Vec<String> = leaves.iter().map(|(_, part)| part.mime_type()).collect();
    let wanted: BTreeSet<usize> = fields
        .iter()
        .flat_map(|field| field.select_parts(types.iter().map(String::as_str)))
        .collect();
    leaves
        .into_iter()
        .enumerate()
        .filter(|(i, _)| wanted.contains(i))
        .map(|(_, (path, part))| PartRequirement::new(path, part))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::rule::{ContentField, ContentMode};

    pub(crate) fn leaf(media_type: &str, subtype: &str) -> BodyStructure {
        BodyStructure::Single(Box::new(BodyPart {
            media_type: media_type.into(),
            subtype: subtype.into(),
            params: vec![("charset".into(), "utf-8".into())],
            encoding: "7bit".into(),
            size: 10,
            ..BodyPart::default()
        }))
    }

    pub(crate) fn multipart(subtype: &str, parts: Vec<BodyStructure>) -> BodyStructure {
        BodyStructure::Multipart {
            subtype: subtype.into(),
            parts,
            params: Vec::new(),
        }
    }

    fn content(mode: ContentMode, types: &[&str]) -> ContentField {
        ContentField {
            media_type: "text/plain".into(),
            mode,
            types: types.iter().map(ToString::to_string).collect(),
            show_content: true,
            show_types: true,
            max_length: None,
            min_length: None,
        }
    }

    /// mixed( alternative(text/plain, text/html), image/png )
    fn sample() -> BodyStructure {
        multipart(
            "mixed",
            vec![
                multipart(
                    "alternative",
                    vec![leaf("text", "plain"), leaf("text", "html")],
                ),
                leaf("image", "png"),
            ],
        )
    }

    fn paths(fields: &[OutputField]) -> Vec<String> {
        required_parts(&sample(), fields)
            .into_iter()
            .map(|r| r.path)
            .collect()
    }

    #[test]
    fn no_content_fields_need_nothing() {
        assert!(paths(&[OutputField::Subject, OutputField::Uid]).is_empty());
    }

    #[test]
    fn text_only_takes_first_plain() {
        let field = OutputField::MimeParts(content(ContentMode::TextOnly, &[]));
        assert_eq!(paths(&[field]), vec!["1.1"]);
    }

    #[test]
    fn full_takes_every_leaf() {
        let field = OutputField::MimeParts(content(ContentMode::Full, &[]));
        assert_eq!(paths(&[field]), vec!["1.1", "1.2", "2"]);
    }

    #[test]
    fn filter_with_wildcard() {
        let field = OutputField::MimeParts(content(ContentMode::Filter, &["image/*"]));
        assert_eq!(paths(&[field]), vec!["2"]);
    }

    #[test]
    fn fields_union_in_tree_order() {
        let mut html = content(ContentMode::Full, &[]);
        html.media_type = "text/html".into();
        let fields = [
            OutputField::MimeParts(content(ContentMode::Filter, &["image/png"])),
            OutputField::Body(html),
            OutputField::Body(content(ContentMode::Full, &[])),
        ];
        assert_eq!(paths(&fields), vec!["1.1", "1.2", "2"]);
    }

    #[test]
    fn single_part_message_is_part_one() {
        let field = OutputField::Body(content(ContentMode::Full, &[]));
        let reqs = required_parts(&leaf("text", "plain"), &[field]);
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].path, "1");
        assert_eq!(reqs[0].charset.as_deref(), Some("utf-8"));
        assert_eq!(reqs[0].encoding, "7bit");
    }
}
