//! Labels Field Codec
//!
//! The labels of an asset live in a single field appended to the record's
//! userData line:
//!
//! ```text
//! fileFormatVersion: 2
//! guid: 0c1f...
//! TextureImporter:
//!   userData: hello labels={tree|rock}
//! ```
//!
//! Identifiers are separated by `|` with no spaces and no trailing separator.
//! An empty label set is written by removing the field, never as `labels={}`.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::error::{MetadataError, Result};

/// Prefix identifying the userData line of a record.
pub const USER_DATA_PREFIX: &str = "  userData:";

const FIELD_SEPARATOR: char = '|';

static LABELS_FIELD_REGEX: Lazy<std::result::Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"labels=\{([^}]*)\}"));

fn labels_regex() -> Result<&'static Regex> {
    LABELS_FIELD_REGEX.as_ref().map_err(|err| {
        MetadataError::Regex(format!("Labels field regex failed to compile: {}", err))
    })
}

/// Index of the first userData line, if any.
pub fn user_data_line<S: AsRef<str>>(lines: &[S]) -> Option<usize> {
    lines
        .iter()
        .position(|line| line.as_ref().starts_with(USER_DATA_PREFIX))
}

/// Byte span of the labels field and of its identifier list within `line`.
///
/// Only the part after the userData prefix is searched.
fn field_spans(line: &str) -> Result<Option<(std::ops::Range<usize>, std::ops::Range<usize>)>> {
    let regex = labels_regex()?;
    Ok(regex
        .captures_at(line, USER_DATA_PREFIX.len())
        .and_then(|caps| {
            let field = caps.get(0)?;
            let ids = caps.get(1)?;
            Some((field.range(), ids.range()))
        }))
}

/// Read the label identifiers stored in a record.
///
/// A userData line without a labels field yields an empty list. Empty
/// segments (`labels={a||b}`) are skipped.
pub fn read_labels<S: AsRef<str>>(lines: &[S]) -> Result<Vec<String>> {
    let position = user_data_line(lines).ok_or(MetadataError::MissingUserData)?;
    let line = lines[position].as_ref();

    let ids = match field_spans(line)? {
        Some((_, ids)) => line[ids]
            .split(FIELD_SEPARATOR)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };
    trace!(line = position, count = ids.len(), "Read labels field");
    Ok(ids)
}

/// Check that an identifier survives a write/read round trip.
pub fn validate_identifier(id: &str) -> Result<()> {
    let unencodable = id.is_empty()
        || id
            .chars()
            .any(|c| c == FIELD_SEPARATOR || c == '}' || c == '\r' || c == '\n');
    if unencodable {
        return Err(MetadataError::UnencodableIdentifier { id: id.to_string() });
    }
    Ok(())
}

/// Render the labels field for `ids`, e.g. `labels={a|b}`.
pub fn format_field<S: AsRef<str>>(ids: &[S]) -> String {
    let joined = ids
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("|");
    format!("labels={{{}}}", joined)
}

/// Rewrite the labels field of a record, returning the new lines.
///
/// - An existing field has exactly its span replaced
/// - A missing field is appended to the userData line after one space
/// - Empty `ids` removes the field together with the single space written in
///   front of it
///
/// Every other byte of the record is copied unchanged. On error the input is
/// not modified and nothing is returned.
pub fn write_labels<S: AsRef<str>, I: AsRef<str>>(lines: &[S], ids: &[I]) -> Result<Vec<String>> {
    for id in ids {
        validate_identifier(id.as_ref())?;
    }
    let position = user_data_line(lines).ok_or(MetadataError::MissingUserData)?;
    let line = lines[position].as_ref();

    let rewritten = match (field_spans(line)?, ids.is_empty()) {
        (Some((field, _)), false) => {
            format!("{}{}{}", &line[..field.start], format_field(ids), &line[field.end..])
        }
        (Some((field, _)), true) => {
            let start = if field.start > USER_DATA_PREFIX.len()
                && line.as_bytes()[field.start - 1] == b' '
            {
                field.start - 1
            } else {
                field.start
            };
            format!("{}{}", &line[..start], &line[field.end..])
        }
        (None, false) => format!("{} {}", line, format_field(ids)),
        (None, true) => line.to_string(),
    };
    trace!(line = position, count = ids.len(), "Wrote labels field");

    Ok(lines
        .iter()
        .enumerate()
        .map(|(i, l)| {
            if i == position {
                rewritten.clone()
            } else {
                l.as_ref().to_string()
            }
        })
        .collect())
}

/// Lines of one asset's side-car record
///
/// Wraps the free codec functions and reports a missing userData line as
/// [`MetadataError::MalformedRecord`] naming the asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    asset_path: String,
    lines: Vec<String>,
}

impl MetadataRecord {
    pub fn new(asset_path: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            asset_path: asset_path.into(),
            lines,
        }
    }

    pub fn asset_path(&self) -> &str {
        &self.asset_path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn has_user_data(&self) -> bool {
        user_data_line(&self.lines).is_some()
    }

    pub fn read_labels(&self) -> Result<Vec<String>> {
        read_labels(&self.lines).map_err(|err| err.for_asset(&self.asset_path))
    }

    /// Replace the labels field. The record is left untouched on error.
    pub fn write_labels<I: AsRef<str>>(&mut self, ids: &[I]) -> Result<()> {
        self.lines = write_labels(&self.lines, ids).map_err(|err| err.for_asset(&self.asset_path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    const NO_IDS: [&str; 0] = [];

    #[test]
    fn test_read_without_field_is_empty() {
        let lines = record(&["fileFormatVersion: 2", "  userData: "]);
        assert!(read_labels(&lines).unwrap().is_empty());
    }

    #[test]
    fn test_read_skips_empty_segments() {
        let lines = record(&["  userData: labels={a||b|}"]);
        assert_eq!(read_labels(&lines).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_read_uses_first_user_data_line() {
        let lines = record(&["  userData: labels={first}", "  userData: labels={second}"]);
        assert_eq!(read_labels(&lines).unwrap(), vec!["first"]);
    }

    #[test]
    fn test_field_stops_at_first_brace() {
        let lines = record(&["  userData: labels={a|b} extra={x}"]);
        assert_eq!(read_labels(&lines).unwrap(), vec!["a", "b"]);

        let written = write_labels(&lines, &["c"]).unwrap();
        assert_eq!(written[0], "  userData: labels={c} extra={x}");
    }

    #[test]
    fn test_indented_user_data_is_not_matched() {
        // deeper indentation belongs to a nested mapping
        let lines = record(&["    userData: labels={a}"]);
        assert!(matches!(read_labels(&lines), Err(MetadataError::MissingUserData)));
    }

    #[test]
    fn test_append_then_remove_restores_line() {
        for original in ["  userData: ", "  userData:", "  userData: hello", "  userData: {json: 1}"] {
            let lines = record(&[original]);
            let labeled = write_labels(&lines, &["a", "b"]).unwrap();
            assert!(labeled[0].ends_with(" labels={a|b}"));
            let cleared = write_labels(&labeled, &NO_IDS).unwrap();
            assert_eq!(cleared, lines, "not restored for {:?}", original);
        }
    }

    #[test]
    fn test_replace_keeps_surrounding_text() {
        let lines = record(&["  userData: pre labels={old} post"]);
        let written = write_labels(&lines, &["new", "other"]).unwrap();
        assert_eq!(written[0], "  userData: pre labels={new|other} post");

        let cleared = write_labels(&lines, &NO_IDS).unwrap();
        assert_eq!(cleared[0], "  userData: pre post");
    }

    #[test]
    fn test_field_directly_after_prefix() {
        let lines = record(&["  userData:labels={a}"]);
        let cleared = write_labels(&lines, &NO_IDS).unwrap();
        assert_eq!(cleared[0], "  userData:");
    }

    #[test]
    fn test_empty_write_without_field_is_noop() {
        let lines = record(&["a", "  userData: hello", "b"]);
        assert_eq!(write_labels(&lines, &NO_IDS).unwrap(), lines);
    }

    #[test]
    fn test_unencodable_identifiers_rejected() {
        let lines = record(&["  userData: "]);
        for bad in ["", "a|b", "a}b", "a\rb", "a\nb"] {
            assert!(
                matches!(
                    write_labels(&lines, &[bad]),
                    Err(MetadataError::UnencodableIdentifier { .. })
                ),
                "{:?} accepted",
                bad
            );
        }
        assert!(validate_identifier("a{b").is_ok());
    }

    #[test]
    fn test_format_field() {
        assert_eq!(format_field(&["a", "b"]), "labels={a|b}");
        assert_eq!(format_field(&["solo"]), "labels={solo}");
    }

    #[test]
    fn test_record_attaches_path_to_errors() {
        let mut rec = MetadataRecord::new("Assets/a.png", record(&["fileFormatVersion: 2"]));
        assert!(!rec.has_user_data());
        match rec.read_labels() {
            Err(MetadataError::MalformedRecord { path }) => assert_eq!(path, "Assets/a.png"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            rec.write_labels(&["x"]),
            Err(MetadataError::MalformedRecord { .. })
        ));
        assert_eq!(rec.lines(), ["fileFormatVersion: 2"]);
    }
}
