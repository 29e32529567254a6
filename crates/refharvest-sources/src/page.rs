use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// One upstream record as an opaque field map. Field presence and types are
/// never assumed; see [`crate::fields`].
pub type RawRecord = Map<String, Value>;

/// One decoded upstream response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    pub records: Vec<RawRecord>,
    /// Result count declared by upstream, when the format carries one.
    pub total_results: Option<usize>,
}

impl RawPage {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            total_results: None,
        }
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total_results = Some(total);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Offset-paginated listing driven by the scan controllers.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, start: usize, size: usize) -> Result<RawPage>;
}
