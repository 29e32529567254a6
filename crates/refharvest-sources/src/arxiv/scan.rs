use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use refharvest_core::{CanonicalRecord, RecordSet};

use crate::arxiv::normalize::{normalize_entry, published_at};
use crate::error::Result;
use crate::page::PageSource;

/// Why a windowed scan stopped fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Upstream returned an empty page.
    Exhausted,
    /// A whole page fell before the cutoff.
    CutoffReached,
    /// The next offset would reach the total declared on the first page.
    ReachedTotal,
    /// `max_scan` entries have been requested.
    ScanLimit,
}

#[derive(Debug, Clone)]
pub struct WindowedOutcome {
    /// Retained records, newest first.
    pub records: Vec<CanonicalRecord>,
    pub scanned: usize,
    pub total_results: Option<usize>,
    pub pages: usize,
    pub stop: StopReason,
}

/// Newest-first scan that keeps records published at or after `cutoff`.
#[derive(Debug, Clone)]
pub struct WindowedScan {
    pub cutoff: DateTime<Utc>,
    pub batch_size: usize,
    pub max_scan: usize,
}

impl WindowedScan {
    pub fn new(cutoff: DateTime<Utc>, batch_size: usize, max_scan: usize) -> Self {
        Self {
            cutoff,
            batch_size: batch_size.max(1),
            max_scan,
        }
    }

    pub async fn run<S: PageSource + ?Sized>(&self, source: &S) -> Result<WindowedOutcome> {
        let mut start = 0usize;
        let mut total_results: Option<usize> = None;
        let mut scanned = 0usize;
        let mut pages = 0usize;
        let mut retained = RecordSet::new();

        let stop = loop {
            if start >= self.max_scan {
                break StopReason::ScanLimit;
            }

            let page = source.fetch_page(start, self.batch_size).await?;
            pages += 1;
            if pages == 1 {
                total_results = page.total_results;
            }
            if page.is_empty() {
                break StopReason::Exhausted;
            }

            let page_len = page.len();
            let mut all_outside = true;
            let mut kept = 0usize;
            for raw in &page.records {
                scanned += 1;
                let Some(published) = published_at(raw) else {
                    debug!("entry without publish date ignored");
                    continue;
                };
                if published < self.cutoff {
                    continue;
                }
                all_outside = false;
                if let Some(record) = normalize_entry(raw) {
                    retained.insert(record);
                    kept += 1;
                }
            }
            info!(start, page_len, kept, scanned, "scanned arXiv page");

            // Relies on upstream returning strictly newest-first; an out-of-order
            // in-window entry behind this page would be missed.
            if all_outside {
                break StopReason::CutoffReached;
            }
            start += page_len;
            if total_results.is_some_and(|total| start >= total) {
                break StopReason::ReachedTotal;
            }
        };

        let mut records = retained.into_vec();
        records.sort_by(|a, b| {
            Reverse(a.published())
                .cmp(&Reverse(b.published()))
                .then_with(|| a.id.cmp(&b.id))
        });

        info!(
            scanned,
            retained = records.len(),
            pages,
            ?stop,
            "windowed scan finished"
        );
        Ok(WindowedOutcome {
            records,
            scanned,
            total_results,
            pages,
            stop,
        })
    }
}
