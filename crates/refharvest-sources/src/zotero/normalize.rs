use serde_json::Value;
use tracing::debug;

use refharvest_core::{CanonicalRecord, LibraryDetails, RecordDates};

use crate::fields;
use crate::page::RawRecord;

/// Author names: a display `name` when present, otherwise `firstName lastName`.
pub fn normalize_creators(creators: &[Value]) -> Vec<String> {
    creators
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|creator| {
            if let Some(name) = fields::string(creator, "name") {
                return Some(name);
            }
            let first = fields::string(creator, "firstName").unwrap_or_default();
            let last = fields::string(creator, "lastName").unwrap_or_default();
            let full = format!("{first} {last}").trim().to_string();
            (!full.is_empty()).then_some(full)
        })
        .collect()
}

pub fn normalize_tags(tags: &[Value]) -> Vec<String> {
    tags.iter()
        .filter_map(Value::as_object)
        .filter_map(|tag| match tag.get("tag") {
            Some(Value::String(s)) => Some(s.trim().to_string()),
            _ => None,
        })
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Map one library listing element to a [`CanonicalRecord`].
///
/// Items whose type is in `skip_types`, and items without a key or title,
/// are dropped.
pub fn normalize_item(raw: &RawRecord, skip_types: &[String]) -> Option<CanonicalRecord> {
    let empty = serde_json::Map::new();
    let data = fields::object(raw, "data").unwrap_or(&empty);

    let item_type = fields::string(data, "itemType").unwrap_or_default();
    if skip_types.iter().any(|skip| *skip == item_type) {
        debug!(item_type = %item_type, "skipping non-bibliographic item");
        return None;
    }

    let Some(key) = fields::string(raw, "key") else {
        debug!("skipping item without key");
        return None;
    };

    let record = CanonicalRecord {
        id: key,
        source_url: fields::string(data, "url"),
        title: fields::string(data, "title").unwrap_or_default(),
        authors: normalize_creators(fields::array(data, "creators")),
        abstract_text: fields::string(data, "abstractNote").unwrap_or_default(),
        dates: RecordDates {
            date: fields::string(data, "date"),
            ..RecordDates::default()
        },
        categories: vec![item_type],
        tags: normalize_tags(fields::array(data, "tags")),
        preprint: None,
        library: Some(LibraryDetails {
            version: fields::unsigned(raw, "version"),
            venue: fields::string(data, "publicationTitle"),
            publisher: fields::string(data, "publisher"),
            doi: fields::string(data, "DOI"),
            language: fields::string(data, "language"),
            extra: fields::string(data, "extra"),
        }),
    };

    let normalized = record.normalized();
    if normalized.is_none() {
        debug!("skipping untitled item");
    }
    normalized
}
