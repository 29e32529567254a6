use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::models::record::CanonicalRecord;

/// The persisted artifact of one harvest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generated_at_utc: DateTime<Utc>,
    #[serde(flatten)]
    pub parameters: HarvestParameters,
    #[serde(flatten)]
    pub stats: ScanStats,
    pub items: Vec<CanonicalRecord>,
}

/// Parameters the harvest ran with, tagged by source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum HarvestParameters {
    Arxiv(ArxivParameters),
    Zotero(ZoteroParameters),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArxivParameters {
    pub label: String,
    pub lookback_days: u32,
    pub cutoff_utc: DateTime<Utc>,
    pub categories: Vec<String>,
    pub query: String,
    pub batch_size: usize,
    pub max_scan: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoteroParameters {
    pub user_id: u64,
    pub page_size: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_scanned: usize,
    pub total_retained: usize,
}

impl Snapshot {
    /// Build a snapshot stamped with the current time (second precision).
    pub fn new(
        parameters: HarvestParameters,
        total_scanned: usize,
        items: Vec<CanonicalRecord>,
    ) -> Self {
        Self::at(Utc::now(), parameters, total_scanned, items)
    }

    pub fn at(
        generated_at: DateTime<Utc>,
        parameters: HarvestParameters,
        total_scanned: usize,
        items: Vec<CanonicalRecord>,
    ) -> Self {
        Self {
            generated_at_utc: generated_at.trunc_subsecs(0),
            parameters,
            stats: ScanStats {
                total_scanned,
                total_retained: items.len(),
            },
            items,
        }
    }
}
