//! Configuration types for api-data-export

use crate::error::{Error, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Upstream GraphQL endpoint and credentials
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// GraphQL endpoint URL (default: "https://api.traceable.ai/graphql")
    #[serde(default = "default_endpoint_url")]
    pub url: String,

    /// Value sent verbatim in the `Authorization` header
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header (default: "api-data-export/<version>")
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_endpoint_url(),
            auth_token: None,
            timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Batching, pacing and output settings for the export pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Entities per batch; also the upper bound on in-flight detail requests (default: 500)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between consecutive batches, in milliseconds (default: 100)
    #[serde(default = "default_pacing_delay", with = "duration_millis_serde")]
    pub pacing_delay: Duration,

    /// CSV file the joined rows are appended to (default: "combined_data.csv")
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Also request `responseSensitiveParams` in the detail query (default: false)
    ///
    /// Not every deployment exposes the response group; requesting an unknown field
    /// makes every detail lookup fail, so it is opt-in.
    #[serde(default)]
    pub include_response_params: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            pacing_delay: default_pacing_delay(),
            output_path: default_output_path(),
            include_response_params: false,
        }
    }
}

/// Comparison operator of an entity attribute filter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperator {
    /// Attribute equals the value
    Equals,
    /// Attribute differs from the value
    NotEquals,
    /// Attribute is one of the listed values
    In,
    /// Attribute is none of the listed values
    NotIn,
    /// Attribute contains the value
    Like,
}

impl FilterOperator {
    /// GraphQL enum literal for this operator
    pub fn as_graphql(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "EQUALS",
            FilterOperator::NotEquals => "NOT_EQUALS",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT_IN",
            FilterOperator::Like => "LIKE",
        }
    }
}

/// Value side of an attribute filter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A single string value
    Single(String),
    /// A list of string values (used with `IN` / `NOT_IN`)
    List(Vec<String>),
}

/// One entry of the entity query's `filterBy` list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFilter {
    /// Attribute key, e.g. "environment"
    pub key: String,
    /// Comparison operator
    pub operator: FilterOperator,
    /// Value(s) to compare against
    pub value: FilterValue,
}

impl AttributeFilter {
    /// Create a filter
    pub fn new(key: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            key: key.into(),
            operator,
            value,
        }
    }
}

/// Scope, time window and filters for the bulk entity query
///
/// When only one end of the time window is given, the other keeps its default
/// (the trailing 24 hours) unless that would invert the window; it is then placed
/// 24 hours from the given bound. See [`EntityQueryConfig::set_window`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "RawEntityQueryConfig")]
pub struct EntityQueryConfig {
    /// Entity scope (default: "API")
    pub scope: String,

    /// Maximum number of entities returned by the single list query (default: 3000)
    pub limit: u32,

    /// Offset into the entity list (default: 0)
    pub offset: u32,

    /// Start of the observation window (default: 24 hours before now)
    pub start_time: DateTime<Utc>,

    /// End of the observation window (default: now)
    pub end_time: DateTime<Utc>,

    /// Attribute filters (default: discovered APIs with data types in the sandbox environment)
    pub filters: Vec<AttributeFilter>,

    /// Include inactive entities (default: false)
    pub include_inactive: bool,
}

impl Default for EntityQueryConfig {
    fn default() -> Self {
        let end_time = Utc::now();
        Self {
            scope: default_scope(),
            limit: default_limit(),
            offset: 0,
            start_time: end_time - default_window(),
            end_time,
            filters: default_filters(),
            include_inactive: false,
        }
    }
}

impl EntityQueryConfig {
    /// Override either end of the time window
    ///
    /// A given bound always wins. The other bound is kept if the window stays
    /// ordered, otherwise it is moved to 24 hours away from the given one.
    pub fn set_window(&mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) {
        match (start, end) {
            (Some(start), Some(end)) => {
                self.start_time = start;
                self.end_time = end;
            }
            (Some(start), None) => {
                self.start_time = start;
                if self.end_time <= start {
                    self.end_time = start + default_window();
                }
            }
            (None, Some(end)) => {
                self.end_time = end;
                if self.start_time >= end {
                    self.start_time = end - default_window();
                }
            }
            (None, None) => {}
        }
    }
}

// Wire shape of `EntityQueryConfig`; the window bounds are resolved together
#[derive(Deserialize)]
struct RawEntityQueryConfig {
    #[serde(default = "default_scope")]
    scope: String,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
    #[serde(default)]
    start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    end_time: Option<DateTime<Utc>>,
    #[serde(default = "default_filters")]
    filters: Vec<AttributeFilter>,
    #[serde(default)]
    include_inactive: bool,
}

impl From<RawEntityQueryConfig> for EntityQueryConfig {
    fn from(raw: RawEntityQueryConfig) -> Self {
        let mut config = EntityQueryConfig {
            scope: raw.scope,
            limit: raw.limit,
            offset: raw.offset,
            filters: raw.filters,
            include_inactive: raw.include_inactive,
            ..Default::default()
        };
        config.set_window(raw.start_time, raw.end_time);
        config
    }
}

/// Main configuration for the exporter
///
/// Passed to [`ExportPipeline`](crate::pipeline::ExportPipeline) at construction;
/// nothing is read from process-wide state after that.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Endpoint location and credentials
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Batching, pacing and output
    #[serde(default)]
    pub export: ExportConfig,

    /// Entity list query parameters
    #[serde(default)]
    pub query: EntityQueryConfig,
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Check the settings the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.url.trim().is_empty() {
            return Err(Error::config("endpoint.url", "endpoint URL must not be empty"));
        }
        if self.export.batch_size == 0 {
            return Err(Error::config(
                "export.batch_size",
                "batch size must be at least 1",
            ));
        }
        if self.query.limit == 0 {
            return Err(Error::config("query.limit", "entity limit must be at least 1"));
        }
        if self.query.start_time >= self.query.end_time {
            return Err(Error::config(
                "query.start_time",
                format!(
                    "start time {} must be before end time {}",
                    self.query.start_time, self.query.end_time
                ),
            ));
        }
        Ok(())
    }
}

fn default_endpoint_url() -> String {
    "https://api.traceable.ai/graphql".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("api-data-export/{}", env!("CARGO_PKG_VERSION"))
}

fn default_batch_size() -> usize {
    500
}

fn default_pacing_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_output_path() -> PathBuf {
    PathBuf::from("combined_data.csv")
}

fn default_scope() -> String {
    "API".to_string()
}

fn default_limit() -> u32 {
    3000
}

fn default_window() -> ChronoDuration {
    ChronoDuration::hours(24)
}

fn default_filters() -> Vec<AttributeFilter> {
    vec![
        AttributeFilter::new(
            "apiDiscoveryState",
            FilterOperator::In,
            FilterValue::List(vec!["DISCOVERED".to_string()]),
        ),
        AttributeFilter::new(
            "dataTypeIds",
            FilterOperator::NotEquals,
            FilterValue::Single("null".to_string()),
        ),
        AttributeFilter::new(
            "environment",
            FilterOperator::Equals,
            FilterValue::Single("sandbox".to_string()),
        ),
    ]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
