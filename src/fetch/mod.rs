//! Data fetching.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     selected indicator ids                      │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │ plan_sources (union of declared sources)
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         SourcePlan                              │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │ DataFetcher (one fetch per source, joined)
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              RecordSource (external persistence)                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No source outside the plan is ever requested.

mod memory;
mod planner;
pub mod source;

pub use memory::InMemorySource;
pub use planner::{plan_sources, SourcePlan};
pub use source::{SourceCatalog, SourceDefinition};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::model::{Record, SourceId};
use crate::period::DateRange;

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors reported by a [`RecordSource`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// The backing store failed while reading a source.
    #[error("Fetching {source_id} failed: {message}")]
    Failed { source_id: SourceId, message: String },
}

impl FetchError {
    pub fn failed(source_id: impl Into<SourceId>, message: impl Into<String>) -> Self {
        Self::Failed {
            source_id: source_id.into(),
            message: message.into(),
        }
    }
}

/// One scoped retrieval request.
#[derive(Debug, Clone, Copy)]
pub struct SourceQuery<'a> {
    pub source_id: &'a str,
    /// Field the date range applies to.
    pub date_field: &'a str,
    pub facility_ids: &'a [String],
    pub range: DateRange,
}

/// Retrieval contract implemented by the persistence layer.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the records of one source scoped to facilities and dates.
    async fn fetch(&self, query: &SourceQuery<'_>) -> FetchResult<Vec<Record>>;
}

/// Records of one run, grouped by source.
#[derive(Debug, Clone, Default)]
pub struct FetchedData {
    records: HashMap<SourceId, Vec<Arc<Record>>>,
}

impl FetchedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group loose records by their `source` tag.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut data = Self::new();
        for record in records {
            data.records
                .entry(record.source.clone())
                .or_default()
                .push(Arc::new(record));
        }
        data
    }

    /// Store a source's records, stamping each with the source id.
    pub fn insert(&mut self, source_id: &str, records: Vec<Record>) {
        let stamped = records
            .into_iter()
            .map(|mut record| {
                record.source = source_id.to_string();
                Arc::new(record)
            })
            .collect();
        self.records.insert(source_id.to_string(), stamped);
    }

    pub fn records(&self, source_id: &str) -> &[Arc<Record>] {
        self.records.get(source_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Records of several sources, in the given source order.
    pub fn records_from<'a>(
        &'a self,
        sources: &'a [SourceId],
    ) -> impl Iterator<Item = &'a Arc<Record>> + 'a {
        sources.iter().flat_map(move |s| self.records(s).iter())
    }

    pub fn total_records(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}

/// Executes a [`SourcePlan`] against a [`RecordSource`].
pub struct DataFetcher<'a> {
    source: &'a dyn RecordSource,
    catalog: &'a SourceCatalog,
}

impl<'a> DataFetcher<'a> {
    pub fn new(source: &'a dyn RecordSource, catalog: &'a SourceCatalog) -> Self {
        Self { source, catalog }
    }

    /// Fetch every planned source concurrently.
    pub async fn fetch(
        &self,
        plan: &SourcePlan,
        facility_ids: &[String],
        range: DateRange,
    ) -> FetchResult<FetchedData> {
        let futures: Vec<_> = plan
            .sources
            .iter()
            .map(|source_id| async move {
                let date_field = self.catalog.date_field(source_id);
                let query = SourceQuery {
                    source_id,
                    date_field: &date_field,
                    facility_ids,
                    range,
                };
                let records = self.source.fetch(&query).await?;
                debug!(source = %source_id, records = records.len(), "fetched source");
                Ok::<_, FetchError>((source_id, records))
            })
            .collect();

        let results = futures::future::try_join_all(futures).await?;

        let mut data = FetchedData::new();
        for (source_id, records) in results {
            data.insert(source_id, records);
        }
        Ok(data)
    }
}
