use tracing::info;

use crate::error::Result;
use crate::page::{PageSource, RawRecord};

#[derive(Debug, Clone, Default)]
pub struct ExhaustiveOutcome {
    pub records: Vec<RawRecord>,
    pub pages: usize,
}

/// Walk a listing from offset 0 until a short or empty page.
#[derive(Debug, Clone, Copy)]
pub struct ExhaustiveScan {
    pub page_size: usize,
}

impl ExhaustiveScan {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub async fn run<S: PageSource + ?Sized>(&self, source: &S) -> Result<ExhaustiveOutcome> {
        let mut outcome = ExhaustiveOutcome::default();
        let mut start = 0usize;

        loop {
            let page = source.fetch_page(start, self.page_size).await?;
            outcome.pages += 1;
            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            outcome.records.extend(page.records);
            start += page_len;
            info!(start, page_len, "fetched library page");

            if page_len < self.page_size {
                break;
            }
        }

        info!(
            collected = outcome.records.len(),
            pages = outcome.pages,
            "exhaustive scan finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::RawPage;
    use crate::page::testing::{FakePages, record};
    use serde_json::json;

    fn page(len: usize, offset: usize) -> RawPage {
        RawPage::new(
            (0..len)
                .map(|i| record(json!({"key": format!("K{}", offset + i)})))
                .collect(),
        )
    }

    #[tokio::test]
    async fn short_page_ends_the_scan() {
        let source = FakePages::new(vec![page(100, 0), page(100, 100), page(37, 200)]);

        let outcome = ExhaustiveScan::new(100).run(&source).await.unwrap();

        assert_eq!(source.requests(), vec![(0, 100), (100, 100), (200, 100)]);
        assert_eq!(outcome.pages, 3);
        assert_eq!(outcome.records.len(), 237);
        assert_eq!(outcome.records[236]["key"], "K236");
    }

    #[tokio::test]
    async fn full_last_page_needs_one_empty_fetch() {
        let source = FakePages::new(vec![page(50, 0), page(50, 50)]);

        let outcome = ExhaustiveScan::new(50).run(&source).await.unwrap();

        assert_eq!(source.requests(), vec![(0, 50), (50, 50), (100, 50)]);
        assert_eq!(outcome.records.len(), 100);
    }

    #[tokio::test]
    async fn empty_library_fetches_once() {
        let source = FakePages::new(vec![]);
        let outcome = ExhaustiveScan::new(100).run(&source).await.unwrap();
        assert_eq!(outcome.pages, 1);
        assert!(outcome.records.is_empty());
    }
}
