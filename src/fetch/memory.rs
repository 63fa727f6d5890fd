//! In-memory [`RecordSource`], used by the CLI and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{FetchError, FetchResult, RecordSource, SourceCatalog, SourceQuery};
use crate::model::{Record, SourceId};

/// Serves records held in memory, applying the same facility and date
/// scoping a database-backed source would.
pub struct InMemorySource {
    records: HashMap<SourceId, Vec<Record>>,
    catalog: Arc<SourceCatalog>,
    /// Sources requested so far, in request order.
    requests: Mutex<Vec<SourceId>>,
    /// Sources that fail instead of answering.
    failing: Vec<SourceId>,
}

impl InMemorySource {
    pub fn new(records: HashMap<SourceId, Vec<Record>>, catalog: Arc<SourceCatalog>) -> Self {
        Self {
            records,
            catalog,
            requests: Mutex::new(Vec::new()),
            failing: Vec::new(),
        }
    }

    /// Make every fetch of `source_id` fail.
    pub fn with_failing_source(mut self, source_id: impl Into<SourceId>) -> Self {
        self.failing.push(source_id.into());
        self
    }

    /// Sources fetched so far.
    pub async fn requested_sources(&self) -> Vec<SourceId> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    async fn fetch(&self, query: &SourceQuery<'_>) -> FetchResult<Vec<Record>> {
        self.requests.lock().await.push(query.source_id.to_string());

        if self.failing.iter().any(|s| s == query.source_id) {
            return Err(FetchError::failed(query.source_id, "source marked as failing"));
        }

        let Some(records) = self.records.get(query.source_id) else {
            return Ok(Vec::new());
        };

        let scoped = records
            .iter()
            .map(|record| {
                let mut record = record.clone();
                record.source = query.source_id.to_string();
                record
            })
            .filter(|record| {
                let in_scope = self
                    .catalog
                    .record_org_unit(record)
                    .is_some_and(|id| query.facility_ids.contains(&id));
                let in_range = self
                    .catalog
                    .record_date(record)
                    .is_some_and(|date| query.range.contains(date));
                in_scope && in_range
            })
            .collect();

        Ok(scoped)
    }
}
