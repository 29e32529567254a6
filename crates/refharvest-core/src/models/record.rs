use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text::{clean_optional, clean_text};

/// The normalized, source-independent representation of one upstream item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Stable upstream identifier, unique within a snapshot.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub dates: RecordDates,
    /// arXiv categories, or the single item type of a library entry.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprint: Option<PreprintDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordDates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    /// Free-form date string as entered in a reference manager.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprintDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Journal, proceedings or other publication title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl CanonicalRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_url: None,
            title: title.into(),
            authors: Vec::new(),
            abstract_text: String::new(),
            dates: RecordDates::default(),
            categories: Vec::new(),
            tags: Vec::new(),
            preprint: None,
            library: None,
        }
    }

    /// Apply the canonical cleanup rules, rejecting records without an id or title.
    ///
    /// Applying this to an already normalized record returns it unchanged.
    pub fn normalized(self) -> Option<Self> {
        let id = self.id.trim().to_string();
        let title = clean_text(&self.title);
        if id.is_empty() || title.is_empty() {
            return None;
        }

        Some(Self {
            id,
            source_url: clean_optional(self.source_url),
            title,
            authors: clean_list(self.authors),
            abstract_text: clean_text(&self.abstract_text),
            dates: RecordDates {
                date: clean_optional(self.dates.date),
                ..self.dates
            },
            categories: clean_list(self.categories),
            tags: trim_list(self.tags),
            preprint: self.preprint.map(|p| PreprintDetails {
                primary_category: clean_optional(p.primary_category),
                doi: clean_optional(p.doi),
                journal_ref: clean_optional(p.journal_ref),
                comment: clean_optional(p.comment),
            }),
            library: self.library.map(|l| LibraryDetails {
                version: l.version,
                venue: clean_optional(l.venue),
                publisher: clean_optional(l.publisher),
                doi: clean_optional(l.doi),
                language: clean_optional(l.language),
                extra: l.extra.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
            }),
        })
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.dates.published
    }

    pub fn venue(&self) -> Option<&str> {
        self.library.as_ref().and_then(|l| l.venue.as_deref())
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .iter()
        .map(|v| clean_text(v))
        .filter(|v| !v.is_empty())
        .collect()
}

/// Tags are labels: trimmed, never rewritten inside.
fn trim_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
