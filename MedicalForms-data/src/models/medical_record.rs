use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use mongodb::bson::oid::ObjectId;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Name of the single temporal field every record carries
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Fields scanned by the free-text search, in the order they are combined
pub const SEARCHABLE_FIELDS: [&str; 12] = [
    "firstName",
    "lastName",
    "email",
    "phoneNumber",
    "dob",
    "gender",
    "disease",
    "height",
    "weight",
    "bmi",
    "fileUrl",
    CREATED_AT_FIELD,
];

/// A single client-supplied value.
///
/// Records are schemaless, but values are restricted to these scalar kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Free-form text
    Text(String),

    /// Any JSON number, integral values are kept integral
    Number(serde_json::Number),

    /// UTC date-time
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    /// Text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::Number(number) => number.serialize(serializer),
            FieldValue::DateTime(dt) => serializer.serialize_str(&format_datetime(dt)),
        }
    }
}

/// Client fields keyed by name, in insertion order
pub type RecordFields = IndexMap<String, FieldValue>;

/// Format a date-time the way it is returned to clients (`2023-11-14T22:13:20Z`)
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Textual form of `createdAt` that search patterns are matched against.
///
/// Mirrors MongoDB's `$dateToString` output for `%Y-%m-%dT%H:%M:%S.%LZ`.
pub fn created_at_search_text(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Storage model for a medical intake record
#[derive(Debug, Clone, PartialEq)]
pub struct MedicalRecord {
    /// Store-assigned identifier
    pub id: ObjectId,

    /// Client-supplied fields (never contains `id` or `createdAt`)
    pub fields: RecordFields,

    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl Serialize for MedicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 2))?;
        map.serialize_entry("id", &self.id.to_hex())?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(CREATED_AT_FIELD, &format_datetime(&self.created_at))?;
        map.end()
    }
}

/// A record ready to be inserted; the store assigns the identifier
#[derive(Debug, Clone, PartialEq)]
pub struct NewMedicalRecord {
    /// Client-supplied fields
    pub fields: RecordFields,

    /// Resolved creation time
    pub created_at: DateTime<Utc>,
}

impl NewMedicalRecord {
    /// Attach a store-assigned identifier
    pub fn with_id(self, id: ObjectId) -> MedicalRecord {
        MedicalRecord {
            id,
            fields: self.fields,
            created_at: self.created_at,
        }
    }
}

/// Field-level overwrite applied by an update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedicalRecordPatch {
    /// Fields to set; fields not listed are left untouched
    pub fields: RecordFields,

    /// Replacement creation time, if the update resolved one
    pub created_at: Option<DateTime<Utc>>,
}

impl MedicalRecordPatch {
    /// True when applying the patch would change nothing
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.created_at.is_none()
    }

    /// Merge the patch into an existing record
    pub fn apply_to(&self, record: &mut MedicalRecord) {
        for (name, value) in &self.fields {
            record.fields.insert(name.clone(), value.clone());
        }
        if let Some(created_at) = self.created_at {
            record.created_at = created_at;
        }
    }
}
