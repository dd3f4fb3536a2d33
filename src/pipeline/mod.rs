//! Chunked export pipeline: entity list → per-batch detail fetch → join → CSV append.
//!
//! The entity list is fetched once. It is then cut into consecutive batches of
//! `export.batch_size`; for each batch, the detail lookups for exactly that slice
//! of ids are issued together, the results are joined against the same slice of
//! entities, and the rows are appended to the output file before the next batch
//! starts. At most one batch of requests is ever in flight.

use crate::client::{GraphQlClient, QueryClient};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::fetch_sensitive_params;
use crate::join::join_batch;
use crate::sink::CsvSink;
use crate::types::ExportSummary;
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

/// Where a run currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Waiting on the entity-list query
    FetchingEntities,
    /// Working on the batch with this zero-based index
    ProcessingBatch(usize),
    /// All batches written
    Done,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::FetchingEntities => write!(f, "fetching-entities"),
            PipelineState::ProcessingBatch(i) => write!(f, "processing-batch({i})"),
            PipelineState::Done => write!(f, "done"),
        }
    }
}

/// Split `total` items into consecutive ranges of at most `batch_size`
///
/// Yields `ceil(total / batch_size)` ranges; only the last may be shorter. A
/// `batch_size` of zero is treated as one.
pub fn plan_batches(total: usize, batch_size: usize) -> Vec<Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..total)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(total))
        .collect()
}

/// Drives one export run against a [`QueryClient`]
pub struct ExportPipeline<C: QueryClient + ?Sized> {
    client: Arc<C>,
    config: Config,
    sink: CsvSink,
}

impl ExportPipeline<GraphQlClient> {
    /// Build a pipeline talking HTTP to the configured endpoint
    pub fn from_config(config: Config) -> Result<Self> {
        let client = GraphQlClient::new(&config.endpoint, config.export.include_response_params)?;
        Self::new(Arc::new(client), config)
    }
}

impl<C: QueryClient + ?Sized> ExportPipeline<C> {
    /// Create a pipeline; the configuration is validated here
    pub fn new(client: Arc<C>, config: Config) -> Result<Self> {
        config.validate()?;
        let sink = CsvSink::new(config.export.output_path.clone());
        Ok(Self {
            client,
            config,
            sink,
        })
    }

    /// Output sink rows are appended to
    pub fn sink(&self) -> &CsvSink {
        &self.sink
    }

    /// Run the export to completion
    ///
    /// # Errors
    ///
    /// Fails if the entity list cannot be fetched ([`Error::EntityFetch`]) or if
    /// rows cannot be appended to the output file. Rows written by earlier batches
    /// stay on disk. Failed detail lookups are not errors; they are counted in
    /// [`ExportSummary::failed_lookups`].
    pub async fn run(&self) -> Result<ExportSummary> {
        let started = Instant::now();
        let batch_size = self.config.export.batch_size;
        let pacing_delay = self.config.export.pacing_delay;

        let mut state = PipelineState::FetchingEntities;
        tracing::debug!(%state, "export started");

        let entities = self
            .client
            .fetch_entities(&self.config.query)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "entity list fetch failed, aborting export");
                Error::EntityFetch(Box::new(e))
            })?;
        let ids: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
        let batches = plan_batches(entities.len(), batch_size);

        tracing::info!(
            entities = entities.len(),
            batches = batches.len(),
            batch_size,
            "fetched entity list"
        );

        let mut summary = ExportSummary {
            total_entities: entities.len(),
            batches: batches.len(),
            ..Default::default()
        };

        for (index, range) in batches.into_iter().enumerate() {
            if index > 0 && !pacing_delay.is_zero() {
                tokio::time::sleep(pacing_delay).await;
            }
            state = PipelineState::ProcessingBatch(index);
            tracing::info!(
                %state,
                start = range.start,
                end = range.end,
                "processing records"
            );

            let batch_entities = &entities[range.clone()];
            let fetched = fetch_sensitive_params(self.client.as_ref(), &ids[range]).await;
            let rows = join_batch(batch_entities, &fetched.records);
            let written = self.sink.append_batch(rows).await?;

            tracing::debug!(
                %state,
                records = fetched.records.len(),
                failed_lookups = fetched.failed,
                rows = written,
                "batch written"
            );
            summary.rows_written += written;
            summary.failed_lookups += fetched.failed;
        }

        state = PipelineState::Done;
        summary.elapsed = started.elapsed();
        tracing::info!(
            %state,
            total_records = summary.total_entities,
            rows_written = summary.rows_written,
            failed_lookups = summary.failed_lookups,
            "Total Records Processed: {}",
            summary.total_entities
        );
        tracing::info!(elapsed_secs = summary.elapsed.as_secs_f64(), "execution time");

        Ok(summary)
    }
}
