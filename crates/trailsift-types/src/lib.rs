//! Shared types for trailsift
//!
//! This crate contains the record and collection types passed between the
//! log compiler, the record filter and the command-line front end.

use serde::ser::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

// ============================================================================
// Field Names
// ============================================================================

/// Field injected by the compiler with the path of the originating file
pub const SOURCE_FILE_FIELD: &str = "sourceFile";

/// Field naming the kind of audit event
pub const EVENT_TYPE_FIELD: &str = "eventType";

/// Field present only on failed calls
pub const ERROR_CODE_FIELD: &str = "errorCode";

/// `eventType` value of an ordinary API call
pub const API_CALL_EVENT_TYPE: &str = "AwsApiCall";

/// Indent width of the canonical formatted text
pub const DEFAULT_INDENT: usize = 4;

// ============================================================================
// Record Types
// ============================================================================

/// A single audit event: field name to arbitrary JSON value.
///
/// Field names vary across event types, so records stay dynamic maps rather
/// than fixed structs.
pub type Record = serde_json::Map<String, Value>;

/// Accessors shared by the compiler and the filter
pub trait RecordExt {
    /// Text form of a top-level field, if present.
    ///
    /// Strings yield their raw content; any other value yields its compact
    /// JSON text, so booleans read as `true` / `false`.
    fn field_text(&self, field: &str) -> Option<Cow<'_, str>>;

    /// The record pretty-printed with the default indent
    fn canonical_text(&self) -> String;

    /// `true` for an `AwsApiCall` event carrying no `errorCode`
    fn is_successful_api_call(&self) -> bool;

    /// Path of the file this record was compiled from
    fn source_file(&self) -> Option<&str>;

    /// Record the file this record was just read from, replacing any
    /// earlier value
    fn tag_source(&mut self, path: &str);
}

impl RecordExt for Record {
    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        self.get(field).map(value_text)
    }

    fn canonical_text(&self) -> String {
        to_indented_string(self, DEFAULT_INDENT).unwrap_or_default()
    }

    fn is_successful_api_call(&self) -> bool {
        !self.contains_key(ERROR_CODE_FIELD)
            && self.get(EVENT_TYPE_FIELD).and_then(Value::as_str) == Some(API_CALL_EVENT_TYPE)
    }

    fn source_file(&self) -> Option<&str> {
        self.get(SOURCE_FILE_FIELD).and_then(Value::as_str)
    }

    fn tag_source(&mut self, path: &str) {
        self.insert(
            SOURCE_FILE_FIELD.to_string(),
            Value::String(path.to_string()),
        );
    }
}

/// Coerce a JSON value to the text that substring filters run against
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

// ============================================================================
// Collection
// ============================================================================

/// Ordered records in the `{"Records": [...]}` envelope.
///
/// The same shape is read from log files and written as output, so the tool's
/// output can be fed back in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(rename = "Records")]
    records: Vec<Record>,
}

impl Collection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Append every record of `other`, keeping its order
    pub fn append(&mut self, other: Collection) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the envelope as pretty JSON with `indent` spaces per level
    pub fn to_pretty_string(&self, indent: usize) -> serde_json::Result<String> {
        to_indented_string(self, indent)
    }
}

impl FromIterator<Record> for Collection {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Collection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Pretty-print any serializable value with `indent` spaces per level
pub fn to_indented_string<T>(value: &T, indent: usize) -> serde_json::Result<String>
where
    T: Serialize + ?Sized,
{
    let indent = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(serde_json::Error::custom)
}
