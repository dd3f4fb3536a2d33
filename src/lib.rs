//! # api-data-export
//!
//! Exports API inventory and sensitive-parameter data from a security-analytics
//! GraphQL service into a CSV file.
//!
//! One bulk query returns the entity (API endpoint) list. The list is processed in
//! fixed-size batches: for every entity in a batch a detail query is issued, all of
//! them concurrently, and the sensitive-parameter records that come back are
//! inner-joined with the batch's entities by id. Each batch's rows are appended to
//! the output file before the next batch starts.
//!
//! ## Quick Start
//!
//! ```no_run
//! use api_data_export::{Config, ExportPipeline};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.endpoint.auth_token = Some("<token>".to_string());
//!     config.export.batch_size = 250;
//!
//!     let pipeline = ExportPipeline::from_config(config)?;
//!     let summary = pipeline.run().await?;
//!     println!("{} rows from {} entities", summary.rows_written, summary.total_entities);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// GraphQL query client
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Concurrent per-batch detail fetching
pub mod fetcher;
/// Entity/parameter join
pub mod join;
/// Batched export driver
pub mod pipeline;
/// CSV output
pub mod sink;
/// Core record types
pub mod types;

#[cfg(test)]
mod test_helpers;

// Re-export commonly used types
pub use client::{ApiInsight, GraphQlClient, QueryClient};
pub use config::{AttributeFilter, Config, EndpointConfig, EntityQueryConfig, ExportConfig};
pub use error::{Error, Result};
pub use pipeline::{ExportPipeline, PipelineState, plan_batches};
pub use sink::CsvSink;
pub use types::{EntitySummary, ExportSummary, OutputRow, ParamDirection, SensitiveParamRecord};
