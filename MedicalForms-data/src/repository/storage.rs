use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime as BsonDateTime, Document};
use tracing::debug;

use crate::models::medical_record::{
    FieldValue, MedicalRecord, MedicalRecordPatch, NewMedicalRecord, RecordFields, CREATED_AT_FIELD,
    SEARCHABLE_FIELDS,
};
use super::errors::RepositoryError;

/// Key of the store-assigned identifier in a stored document
const ID_FIELD: &str = "_id";

/// `$dateToString` format producing the same text as `created_at_search_text`
const CREATED_AT_TEXT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%LZ";

/// Encoding between records and the BSON documents kept in MongoDB
pub struct DocumentStorage;

impl DocumentStorage {
    /// Encode a new record under a pre-assigned identifier
    pub fn encode_new(id: ObjectId, record: &NewMedicalRecord) -> Document {
        let mut document = Document::new();
        document.insert(ID_FIELD, id);
        for (name, value) in &record.fields {
            document.insert(name.clone(), Self::encode_value(value));
        }
        document.insert(CREATED_AT_FIELD, BsonDateTime::from_chrono(record.created_at));
        document
    }

    /// Build the `$set` update for a patch
    pub fn encode_patch(patch: &MedicalRecordPatch) -> Document {
        let mut set = Document::new();
        for (name, value) in &patch.fields {
            set.insert(name.clone(), Self::encode_value(value));
        }
        if let Some(created_at) = patch.created_at {
            set.insert(CREATED_AT_FIELD, BsonDateTime::from_chrono(created_at));
        }
        doc! { "$set": set }
    }

    /// Decode a stored document
    pub fn decode(document: Document) -> Result<MedicalRecord, RepositoryError> {
        let mut id = None;
        let mut created_at = None;
        let mut fields = RecordFields::new();

        for (name, value) in document {
            match value {
                Bson::ObjectId(oid) if name == ID_FIELD => id = Some(oid),
                Bson::DateTime(dt) if name == CREATED_AT_FIELD => created_at = Some(dt.to_chrono()),
                value => match Self::decode_value(value) {
                    Some(decoded) => {
                        fields.insert(name, decoded);
                    }
                    None => debug!("Skipping unsupported value in stored field '{}'", name),
                },
            }
        }

        let id = id.ok_or_else(|| RepositoryError::Decode("document has no ObjectId '_id'".to_string()))?;
        let created_at = created_at.ok_or_else(|| {
            RepositoryError::Decode(format!("document {} has no date-time '{}'", id, CREATED_AT_FIELD))
        })?;

        Ok(MedicalRecord { id, fields, created_at })
    }

    /// Filter matching a single identifier
    pub fn id_filter(id: ObjectId) -> Document {
        doc! { "_id": id }
    }

    /// Case-insensitive literal substring match over every searchable field
    pub fn search_filter(query: &str) -> Document {
        let pattern = regex::escape(query);

        let clauses: Vec<Document> = SEARCHABLE_FIELDS
            .iter()
            .map(|&field| {
                if field == CREATED_AT_FIELD {
                    // Dates are not strings in the store, match against their text form
                    doc! {
                        "$expr": {
                            "$regexMatch": {
                                "input": {
                                    "$dateToString": {
                                        "date": format!("${}", CREATED_AT_FIELD),
                                        "format": CREATED_AT_TEXT_FORMAT,
                                    }
                                },
                                "regex": pattern.as_str(),
                                "options": "i",
                            }
                        }
                    }
                } else {
                    let mut clause = Document::new();
                    clause.insert(field, doc! { "$regex": pattern.as_str(), "$options": "i" });
                    clause
                }
            })
            .collect();

        doc! { "$or": clauses }
    }

    fn encode_value(value: &FieldValue) -> Bson {
        match value {
            FieldValue::Text(text) => Bson::String(text.clone()),
            FieldValue::Number(number) => number
                .as_i64()
                .map(Bson::Int64)
                .or_else(|| number.as_f64().map(Bson::Double))
                .unwrap_or(Bson::Null),
            FieldValue::DateTime(dt) => Bson::DateTime(BsonDateTime::from_chrono(*dt)),
        }
    }

    fn decode_value(value: Bson) -> Option<FieldValue> {
        match value {
            Bson::String(text) => Some(FieldValue::Text(text)),
            Bson::Int32(n) => Some(FieldValue::Number(i64::from(n).into())),
            Bson::Int64(n) => Some(FieldValue::Number(n.into())),
            Bson::Double(n) => serde_json::Number::from_f64(n).map(FieldValue::Number),
            Bson::DateTime(dt) => Some(FieldValue::DateTime(dt.to_chrono())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_encoded_document_decodes_to_same_record() {
        let mut fields = RecordFields::new();
        fields.insert("lastName".to_string(), FieldValue::Text("Smith".to_string()));
        fields.insert("weight".to_string(), FieldValue::Number(serde_json::Number::from_f64(61.5).unwrap()));
        fields.insert("height".to_string(), FieldValue::Number(170.into()));
        let new_record = NewMedicalRecord {
            fields,
            created_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        };
        let id = ObjectId::new();

        let document = DocumentStorage::encode_new(id, &new_record);
        assert!(matches!(document.get("height"), Some(Bson::Int64(170))));
        assert!(matches!(document.get(CREATED_AT_FIELD), Some(Bson::DateTime(_))));

        let decoded = DocumentStorage::decode(document).unwrap();
        assert_eq!(decoded, new_record.with_id(id));
    }

    #[test]
    fn test_decode_skips_unsupported_values_and_requires_created_at() {
        let id = ObjectId::new();
        let document = doc! {
            "_id": id,
            "firstName": "Ann",
            "disease": ["Asthma", "Cancer"],
            "verified": true,
            "createdAt": BsonDateTime::from_millis(1_700_000_000_000),
        };

        let record = DocumentStorage::decode(document).unwrap();
        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.fields.get("firstName").and_then(FieldValue::as_text), Some("Ann"));

        let missing = doc! { "_id": id, "firstName": "Ann" };
        assert!(matches!(DocumentStorage::decode(missing), Err(RepositoryError::Decode(_))));
    }

    #[test]
    fn test_search_filter_escapes_query_and_covers_every_field() {
        let filter = DocumentStorage::search_filter("a.c+");
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), SEARCHABLE_FIELDS.len());

        let first = clauses[0].as_document().unwrap();
        let condition = first.get_document("firstName").unwrap();
        assert_eq!(condition.get_str("$regex").unwrap(), r"a\.c\+");
        assert_eq!(condition.get_str("$options").unwrap(), "i");

        let last = clauses[SEARCHABLE_FIELDS.len() - 1].as_document().unwrap();
        assert!(last.contains_key("$expr"));
    }

    #[test]
    fn test_patch_becomes_set_update() {
        let mut patch = MedicalRecordPatch::default();
        patch.fields.insert("disease".to_string(), FieldValue::Text("X".to_string()));

        let update = DocumentStorage::encode_patch(&patch);
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("disease").unwrap(), "X");
        assert!(!set.contains_key(CREATED_AT_FIELD));
    }
}
