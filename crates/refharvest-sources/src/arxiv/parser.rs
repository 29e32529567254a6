use quick_xml::de::from_str;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{HarvestError, Result};
use crate::page::{RawPage, RawRecord};

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "opensearch:totalResults", alias = "totalResults", default)]
    total_results: Option<String>,
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AtomEntry {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    #[serde(rename = "author")]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "category")]
    categories: Vec<AtomCategory>,
    #[serde(rename = "arxiv:primary_category", alias = "primary_category")]
    primary_category: Option<AtomCategory>,
    #[serde(rename = "arxiv:comment", alias = "comment")]
    comment: Option<String>,
    #[serde(rename = "arxiv:journal_ref", alias = "journal_ref")]
    journal_ref: Option<String>,
    #[serde(rename = "arxiv:doi", alias = "doi")]
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term", default)]
    term: Option<String>,
}

/// Decode one Atom response into raw entry maps plus the declared total.
///
/// Entries are kept as loose maps; cleanup and acceptance happen in
/// [`super::normalize`].
pub fn parse_feed(xml: &str) -> Result<RawPage> {
    let feed: AtomFeed =
        from_str(xml).map_err(|e| HarvestError::Parse(format!("invalid atom xml: {e}")))?;

    let total_results = feed
        .total_results
        .and_then(|value| value.trim().parse::<usize>().ok());

    Ok(RawPage {
        records: feed.entries.into_iter().map(entry_record).collect(),
        total_results,
    })
}

fn entry_record(entry: AtomEntry) -> RawRecord {
    let mut record = RawRecord::new();
    let text_fields = [
        ("id", entry.id),
        ("title", entry.title),
        ("summary", entry.summary),
        ("published", entry.published),
        ("updated", entry.updated),
        ("comment", entry.comment),
        ("journal_ref", entry.journal_ref),
        ("doi", entry.doi),
        (
            "primary_category",
            entry.primary_category.and_then(|category| category.term),
        ),
    ];
    for (key, value) in text_fields {
        if let Some(value) = value {
            record.insert(key.to_string(), Value::String(value));
        }
    }

    let authors: Vec<Value> = entry
        .authors
        .into_iter()
        .filter_map(|author| author.name)
        .map(|name| json!({ "name": name }))
        .collect();
    record.insert("authors".to_string(), Value::Array(authors));

    let categories: Vec<Value> = entry
        .categories
        .into_iter()
        .filter_map(|category| category.term)
        .map(Value::String)
        .collect();
    record.insert("categories".to_string(), Value::Array(categories));

    record
}
