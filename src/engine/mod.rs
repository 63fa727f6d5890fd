//! Analysis orchestration.
//!
//! # Run pipeline
//!
//! ```text
//! AnalysisConfig
//!     │ validate_config
//!     ▼
//! org units ──► facility ids        period ──► ResolvedPeriod
//!     ▼
//! plan_sources ──► validate_indicator_names
//!     │  (empty scope: empty result)
//!     ▼
//! DataFetcher (concurrent)
//!     ▼
//! per indicator: compute ──► extract row/column values
//!     ▼
//! filters ──► explicit period keys
//!     ▼
//! domains (concurrent) ──► PivotBuilder ──► AnalysisResult
//! ```

mod filter;
mod validate;

pub use filter::{apply_filters, restrict_to_period_keys};
pub use validate::{validate_config, validate_indicator_names};

use chrono::{Local, NaiveDate, Utc};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::Settings;
use crate::dimension::{DimensionRegistry, DomainContext, DomainLookup, ExtractionContext};
use crate::error::EngineResult;
use crate::fetch::{plan_sources, DataFetcher, FetchedData, RecordSource, SourceCatalog};
use crate::indicator::{IndicatorDefinition, IndicatorRegistry};
use crate::model::{
    AnalysisConfig, AnalysisResult, ComputedDataPoint, DomainValue, ResultMetadata,
    INDICATOR_DIMENSION,
};
use crate::org_unit::OrgUnitCatalog;
use crate::period::resolve_period;
use crate::pivot::PivotBuilder;

/// Runs analyses against one record source.
///
/// Every collaborator is an explicit value shared through `Arc`; a run
/// never mutates the engine, so one engine serves concurrent runs.
#[derive(Clone)]
pub struct AnalyticsEngine {
    settings: Arc<Settings>,
    dimensions: Arc<DimensionRegistry>,
    indicators: Arc<IndicatorRegistry>,
    sources: Arc<SourceCatalog>,
    org_units: Arc<OrgUnitCatalog>,
    source: Arc<dyn RecordSource>,
}

impl AnalyticsEngine {
    /// Build an engine with registries derived from `settings`.
    pub fn new(
        settings: Settings,
        org_units: OrgUnitCatalog,
        source: Arc<dyn RecordSource>,
        lookup: Option<Arc<dyn DomainLookup>>,
    ) -> Self {
        let sources = Arc::new(SourceCatalog::new(&settings.sources));
        let dimensions = DimensionRegistry::from_settings(&settings, &sources, lookup);
        let indicators = IndicatorRegistry::from_settings(&settings);
        Self::from_parts(
            Arc::new(settings),
            Arc::new(dimensions),
            Arc::new(indicators),
            sources,
            Arc::new(org_units),
            source,
        )
    }

    /// Build an engine from prebuilt collaborators.
    pub fn from_parts(
        settings: Arc<Settings>,
        dimensions: Arc<DimensionRegistry>,
        indicators: Arc<IndicatorRegistry>,
        sources: Arc<SourceCatalog>,
        org_units: Arc<OrgUnitCatalog>,
        source: Arc<dyn RecordSource>,
    ) -> Self {
        Self {
            settings,
            dimensions,
            indicators,
            sources,
            org_units,
            source,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dimensions(&self) -> &DimensionRegistry {
        &self.dimensions
    }

    pub fn indicators(&self) -> &IndicatorRegistry {
        &self.indicators
    }

    pub fn sources(&self) -> &SourceCatalog {
        &self.sources
    }

    /// Run an analysis anchored at the local date.
    pub async fn run(&self, config: &AnalysisConfig) -> EngineResult<AnalysisResult> {
        self.run_at(config, Local::now().date_naive()).await
    }

    /// Run an analysis with relative periods anchored at `today`.
    pub async fn run_at(
        &self,
        config: &AnalysisConfig,
        today: NaiveDate,
    ) -> EngineResult<AnalysisResult> {
        let run_id = Uuid::new_v4();
        let span = info_span!("analysis", run_id = %run_id);
        self.execute(config, today, run_id).instrument(span).await
    }

    async fn execute(
        &self,
        config: &AnalysisConfig,
        today: NaiveDate,
        run_id: Uuid,
    ) -> EngineResult<AnalysisResult> {
        let started = Instant::now();
        let analysis = &self.settings.analysis;

        validate_config(config, &self.dimensions)?;

        let facility_ids = self.org_units.resolve(&config.org_units);
        let period = resolve_period(&config.period, analysis.default_granularity, today)?;
        let plan = plan_sources(&config.indicators, &self.indicators);
        let indicators: Vec<&IndicatorDefinition> = plan
            .indicators
            .iter()
            .filter_map(|id| self.indicators.get(id))
            .collect();
        validate_indicator_names(&indicators)?;
        debug!(
            facilities = facility_ids.len(),
            period = %period.range,
            sources = ?plan.sources,
            "planned analysis"
        );

        let build_metadata = |row_count: usize, point_count: usize| ResultMetadata {
            run_id,
            generated_at: Utc::now(),
            period: period.range,
            granularity: period.granularity,
            org_units: facility_ids.clone(),
            indicators: plan.indicators.clone(),
            visualization: config.visualization,
            execution_time_ms: started.elapsed().as_millis() as u64,
            row_count,
            point_count,
        };

        if facility_ids.is_empty() {
            info!("org-unit scope is empty");
            return Ok(AnalysisResult::empty(build_metadata(0, 0)));
        }

        let data = DataFetcher::new(self.source.as_ref(), &self.sources)
            .fetch(&plan, &facility_ids, period.range)
            .await?;
        debug!(records = data.total_records(), "fetched records");

        let ctx = ExtractionContext::new(
            &self.org_units,
            Arc::clone(&self.sources),
            period.granularity,
            today,
            analysis,
        );

        let mut columns = config.columns.clone();
        if plan.indicators.len() > 1 && !config.uses_dimension(INDICATOR_DIMENSION) {
            columns.push(INDICATOR_DIMENSION.to_string());
        }

        let placed: Vec<&String> = config.rows.iter().chain(columns.iter()).collect();
        let points = self.compute_points(&indicators, &data, &placed, &ctx)?;
        let points = apply_filters(points, &config.filters, &self.dimensions, &ctx)?;
        let points = restrict_to_period_keys(points, &period, &ctx);
        debug!(points = points.len(), "computed data points");

        let domain_ctx = DomainContext {
            org_units: &self.org_units,
            facility_ids: &facility_ids,
            period: &period,
        };
        let domains = self.resolve_domains(&placed, &domain_ctx).await?;

        let table = PivotBuilder::new(&config.rows, &columns, &indicators, &domains, analysis)
            .with_percentages(config.visualization.show_percentages)
            .build(&points);

        let metadata = build_metadata(table.rows.len(), points.len());
        info!(
            rows = metadata.row_count,
            columns = table.columns.len(),
            points = metadata.point_count,
            elapsed_ms = metadata.execution_time_ms,
            "analysis complete"
        );

        Ok(AnalysisResult {
            metadata,
            columns: table.columns,
            rows: table.rows,
            column_totals: table.column_totals,
            grand_total: table.grand_total,
        })
    }

    /// Compute every indicator and tag its points with the placed
    /// dimensions' values.
    fn compute_points(
        &self,
        indicators: &[&IndicatorDefinition],
        data: &FetchedData,
        placed: &[&String],
        ctx: &ExtractionContext,
    ) -> EngineResult<Vec<ComputedDataPoint>> {
        let extractors = placed
            .iter()
            .filter(|id| id.as_str() != INDICATOR_DIMENSION)
            .map(|id| self.dimensions.require(id))
            .collect::<EngineResult<Vec<_>>>()?;
        let tags_indicator = placed.iter().any(|id| id.as_str() == INDICATOR_DIMENSION);

        let mut points = Vec::new();
        for indicator in indicators {
            for value_point in indicator.compute(data) {
                let mut dimensions = IndexMap::with_capacity(placed.len());
                if tags_indicator {
                    dimensions.insert(
                        INDICATOR_DIMENSION.to_string(),
                        indicator.short_name.clone(),
                    );
                }
                if let Some(record) = &value_point.record {
                    for dimension in &extractors {
                        dimensions.insert(dimension.id.clone(), dimension.extract(record, ctx));
                    }
                }
                points.push(ComputedDataPoint {
                    indicator_id: indicator.id.clone(),
                    value: value_point.value,
                    dimensions,
                    record: value_point.record,
                });
            }
        }
        Ok(points)
    }

    /// Resolve the domain of every placed dimension concurrently.
    async fn resolve_domains(
        &self,
        placed: &[&String],
        ctx: &DomainContext<'_>,
    ) -> EngineResult<IndexMap<String, Vec<DomainValue>>> {
        let lookups = placed
            .iter()
            .filter(|id| id.as_str() != INDICATOR_DIMENSION)
            .map(|id| self.dimensions.require(id))
            .collect::<EngineResult<Vec<_>>>()?
            .into_iter()
            .map(|dimension| async move { (dimension.id.clone(), dimension.domain(ctx).await) });

        let mut domains = IndexMap::new();
        for (id, values) in futures::future::join_all(lookups).await {
            domains.insert(id, values?);
        }
        Ok(domains)
    }
}
