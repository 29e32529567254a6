//! Frequency tables and the Markdown summary report.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{
    ArxivParameters, CanonicalRecord, HarvestParameters, Snapshot, ZoteroParameters,
};

/// Number of titles listed in the "Sample Titles" section.
pub const SAMPLE_TITLES: usize = 30;

const TOP_ITEM_TYPES: usize = 15;
const TOP_VENUES: usize = 15;
const TOP_TAGS: usize = 25;

/// Label → occurrence count, remembering first-encountered order for ties.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    counts: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&slot) => self.counts[slot].1 += 1,
            None => {
                self.index.insert(label.to_string(), self.counts.len());
                self.counts.push((label.to_string(), 1));
            }
        }
    }

    pub fn count(&self, label: &str) -> usize {
        self.index.get(label).map(|&slot| self.counts[slot].1).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// All labels, descending by count; ties keep first-encountered order.
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn top(&self, n: usize) -> Vec<(&str, usize)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }
}

impl<'a> FromIterator<&'a str> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut table = Self::new();
        for label in iter {
            table.add(label);
        }
        table
    }
}

/// Render the summary report for whichever source produced the snapshot.
pub fn render_report(snapshot: &Snapshot) -> String {
    match &snapshot.parameters {
        HarvestParameters::Arxiv(params) => render_arxiv_report(snapshot, params),
        HarvestParameters::Zotero(params) => render_zotero_report(snapshot, params),
    }
}

fn render_arxiv_report(snapshot: &Snapshot, params: &ArxivParameters) -> String {
    let categories: FrequencyTable = snapshot
        .items
        .iter()
        .flat_map(|item| item.categories.iter().map(String::as_str))
        .collect();

    let mut lines = vec![
        format!("# arXiv {} Last {} Days", params.label, params.lookback_days),
        String::new(),
        format!("- Generated (UTC): {}", timestamp(&snapshot.generated_at_utc)),
        format!("- Lookback days: {}", params.lookback_days),
        format!("- Cutoff (UTC): {}", timestamp(&params.cutoff_utc)),
        format!("- Entries scanned: {}", snapshot.stats.total_scanned),
        format!(
            "- Recent {} entries: {}",
            params.label, snapshot.stats.total_retained
        ),
        String::new(),
        "## Category Counts".to_string(),
    ];
    push_counts(&mut lines, categories.ranked());
    lines.push(String::new());
    lines.push("## Sample Titles".to_string());
    for item in sample(&snapshot.items) {
        lines.push(format!("- [{}] {}", item.id, item.title));
    }
    lines.join("\n")
}

fn render_zotero_report(snapshot: &Snapshot, params: &ZoteroParameters) -> String {
    let items = &snapshot.items;
    let item_types: FrequencyTable = items
        .iter()
        .map(|item| item.categories.first().map(String::as_str).unwrap_or("unknown"))
        .collect();
    let venues: FrequencyTable = items.iter().filter_map(CanonicalRecord::venue).collect();
    let tags: FrequencyTable = items
        .iter()
        .flat_map(|item| item.tags.iter().map(String::as_str))
        .collect();

    let mut lines = vec![
        "# Zotero Library Snapshot".to_string(),
        String::new(),
        format!("- Generated (UTC): {}", timestamp(&snapshot.generated_at_utc)),
        format!("- User ID: {}", params.user_id),
        format!("- Readable items: {}", snapshot.stats.total_retained),
        String::new(),
        "## Top Item Types".to_string(),
    ];
    push_counts(&mut lines, item_types.top(TOP_ITEM_TYPES));
    lines.push(String::new());
    lines.push("## Top Venues".to_string());
    push_counts(&mut lines, venues.top(TOP_VENUES));
    lines.push(String::new());
    lines.push("## Top Tags".to_string());
    push_counts(&mut lines, tags.top(TOP_TAGS));
    lines.push(String::new());
    lines.push("## Sample Titles".to_string());
    for item in sample(items) {
        lines.push(format!("- {}", item.title));
    }
    lines.join("\n")
}

fn push_counts(lines: &mut Vec<String>, ranked: Vec<(&str, usize)>) {
    lines.extend(
        ranked
            .into_iter()
            .map(|(label, count)| format!("- {label}: {count}")),
    );
}

fn sample(items: &[CanonicalRecord]) -> &[CanonicalRecord] {
    &items[..items.len().min(SAMPLE_TITLES)]
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}
