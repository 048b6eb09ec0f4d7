//! The note entity and its persisted record format.
//!
//! A note is encoded as a JSON object with the fields `id`, `title`, `content`,
//! `colorValue` and `updatedAt`. Decoding validates each field explicitly and reports
//! the first violation as a [`MalformedRecordError`].

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};
use serde_json::{Map, Value};
use std::fmt;

pub mod draft;

pub use draft::NoteDraft;

const FIELD_ID: &str = "id";
const FIELD_TITLE: &str = "title";
const FIELD_CONTENT: &str = "content";
const FIELD_COLOR: &str = "colorValue";
const FIELD_UPDATED_AT: &str = "updatedAt";

/// Offset-less ISO-8601 date-time, as written by clients that store local time.
const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A 32-bit ARGB display color. The repository never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorValue(pub u32);

impl ColorValue {
    /// Fully opaque white, used when a record carries no color.
    pub const DEFAULT: ColorValue = ColorValue(0xFFFF_FFFF);

    /// Returns the raw ARGB value.
    pub fn argb(self) -> u32 {
        self.0
    }
}

impl Default for ColorValue {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for ColorValue {
    fn from(value: u32) -> Self {
        ColorValue(value)
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

/// A persisted record could not be decoded into a [`Note`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedRecordError {
    /// The record is not a JSON object.
    #[error("Note record is not an object")]
    NotAnObject,
    /// A required field is absent.
    #[error("Note record is missing field `{0}`")]
    MissingField(&'static str),
    /// A field is present with the wrong type.
    #[error("Note record field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    /// `updatedAt` is not a parseable timestamp.
    #[error("Note record has invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}

/// A single user note.
///
/// `updated_at` is stamped with the current time whenever a note is created or revised,
/// and is otherwise only restored from a persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    id: String,
    title: String,
    content: String,
    color: ColorValue,
    updated_at: DateTime<Utc>,
}

impl Note {
    /// Creates a note with a freshly generated unique id.
    pub fn new<T, C>(title: T, content: C, color: ColorValue) -> Self
    where
        T: Into<String>,
        C: Into<String>,
    {
        Self::with_id(uuid::Uuid::new_v4().to_string(), title, content, color)
    }

    /// Creates a note with a caller-chosen id.
    pub fn with_id<I, T, C>(id: I, title: T, content: C, color: ColorValue) -> Self
    where
        I: Into<String>,
        T: Into<String>,
        C: Into<String>,
    {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            color,
            updated_at: now(),
        }
    }

    /// Returns an edited copy of this note that keeps its id.
    pub fn revise<T, C>(&self, title: T, content: C, color: ColorValue) -> Self
    where
        T: Into<String>,
        C: Into<String>,
    {
        Self::with_id(self.id.clone(), title, content, color)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn color(&self) -> ColorValue {
        self.color
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the title or content contains `needle`, which must already be lowercase.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.content.to_lowercase().contains(needle)
    }

    /// Encodes this note as a persisted record.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert(FIELD_ID.to_string(), Value::from(self.id.as_str()));
        record.insert(FIELD_TITLE.to_string(), Value::from(self.title.as_str()));
        record.insert(
            FIELD_CONTENT.to_string(),
            Value::from(self.content.as_str()),
        );
        record.insert(FIELD_COLOR.to_string(), Value::from(self.color.0));
        record.insert(
            FIELD_UPDATED_AT.to_string(),
            Value::from(encode_timestamp(&self.updated_at)),
        );
        record
    }

    /// Decodes a persisted record.
    ///
    /// `colorValue` may be absent or `null`, in which case [`ColorValue::DEFAULT`] is used.
    /// Every other field is required.
    pub fn from_record(value: &Value) -> Result<Self, MalformedRecordError> {
        let record = value.as_object().ok_or(MalformedRecordError::NotAnObject)?;
        let id = required_str(record, FIELD_ID)?;
        let title = required_str(record, FIELD_TITLE)?;
        let content = required_str(record, FIELD_CONTENT)?;
        let color = match record.get(FIELD_COLOR) {
            None | Some(Value::Null) => ColorValue::DEFAULT,
            Some(value) => value
                .as_u64()
                .and_then(|value| u32::try_from(value).ok())
                .map(ColorValue)
                .ok_or(MalformedRecordError::WrongType {
                    field: FIELD_COLOR,
                    expected: "a 32-bit unsigned integer",
                })?,
        };
        let updated_at = parse_timestamp(required_str(record, FIELD_UPDATED_AT)?)?;

        Ok(Self {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            color,
            updated_at,
        })
    }
}

fn required_str<'a>(
    record: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, MalformedRecordError> {
    match record.get(field) {
        None => Err(MalformedRecordError::MissingField(field)),
        Some(value) => value.as_str().ok_or(MalformedRecordError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

/// Current time at the precision the record encoding preserves.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, MalformedRecordError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    let invalid = |reason: String| MalformedRecordError::InvalidTimestamp {
        value: value.to_string(),
        reason,
    };
    let naive = NaiveDateTime::parse_from_str(value, LOCAL_TIMESTAMP_FORMAT)
        .map_err(|e| invalid(e.to_string()))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .ok_or_else(|| invalid("local time does not exist".to_string()))
}
