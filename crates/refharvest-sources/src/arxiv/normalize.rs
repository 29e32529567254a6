use chrono::{DateTime, Utc};
use tracing::debug;

use refharvest_core::{CanonicalRecord, PreprintDetails, RecordDates};

use crate::fields;
use crate::page::RawRecord;

/// Last path segment of an entry URL, version suffix included.
///
/// `http://arxiv.org/abs/2610.01234v2` → `2610.01234v2`.
pub fn arxiv_id(entry_url: &str) -> String {
    entry_url
        .trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn timestamp(raw: &RawRecord, key: &str) -> Option<DateTime<Utc>> {
    let value = fields::string(raw, key)?;
    DateTime::parse_from_rfc3339(&value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Publish timestamp of a raw entry, if present and well formed.
pub fn published_at(raw: &RawRecord) -> Option<DateTime<Utc>> {
    timestamp(raw, "published")
}

/// Map one decoded Atom entry to a [`CanonicalRecord`].
///
/// Entries without a usable id or title are dropped.
pub fn normalize_entry(raw: &RawRecord) -> Option<CanonicalRecord> {
    let Some(url) = fields::string(raw, "id") else {
        debug!("skipping arXiv entry without id");
        return None;
    };
    let id = arxiv_id(&url);
    let title = fields::string(raw, "title").unwrap_or_default();

    let authors = fields::array(raw, "authors")
        .iter()
        .filter_map(|author| match author {
            serde_json::Value::Object(map) => fields::string(map, "name"),
            other => fields::trimmed(Some(other)),
        })
        .collect();
    let categories = fields::strings(raw, "categories");
    let primary_category =
        fields::string(raw, "primary_category").or_else(|| categories.first().cloned());

    let record = CanonicalRecord {
        id,
        source_url: Some(url.clone()),
        title,
        authors,
        abstract_text: fields::string(raw, "summary").unwrap_or_default(),
        dates: RecordDates {
            published: published_at(raw),
            updated: timestamp(raw, "updated"),
            date: None,
        },
        categories,
        tags: Vec::new(),
        preprint: Some(PreprintDetails {
            primary_category,
            doi: fields::string(raw, "doi"),
            journal_ref: fields::string(raw, "journal_ref"),
            comment: fields::string(raw, "comment"),
        }),
        library: None,
    };

    let normalized = record.normalized();
    if normalized.is_none() {
        debug!(entry = %url, "skipping arXiv entry without title");
    }
    normalized
}
