//! GraphQL query client for the analytics service.
//!
//! The pipeline only talks to the upstream service through the [`QueryClient`]
//! trait: one bulk entity-list call and one detail call per entity id.
//! [`GraphQlClient`] is the HTTP implementation; tests substitute their own.

mod queries;

pub use queries::{api_insight_query, entities_query};

use crate::config::{EndpointConfig, EntityQueryConfig};
use crate::error::{Error, Result};
use crate::types::{EntitySummary, ParamDirection, SensitiveParamRecord};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Maximum number of response body bytes kept in an [`Error::Status`]
const ERROR_BODY_LIMIT: usize = 512;

/// Upstream query operations the export pipeline depends on
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Fetch the full, ordered entity list for the configured scope and window
    async fn fetch_entities(&self, query: &EntityQueryConfig) -> Result<Vec<EntitySummary>>;

    /// Fetch the sensitive-parameter insight for one entity
    async fn fetch_api_insight(&self, id: &str) -> Result<ApiInsight>;
}

/// Detail response for one entity
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInsight {
    /// Entity identifier the insight belongs to
    pub id: String,
    /// Parameters found in requests
    #[serde(default)]
    pub request_sensitive_params: ParamGroup,
    /// Parameters found in responses; absent unless requested and supported
    #[serde(default)]
    pub response_sensitive_params: Option<ParamGroup>,
}

impl ApiInsight {
    /// Flatten into records: request-side entries first, then response-side entries
    pub fn into_records(self) -> Vec<SensitiveParamRecord> {
        let ApiInsight {
            id,
            request_sensitive_params,
            response_sensitive_params,
        } = self;

        let request = request_sensitive_params
            .results
            .into_iter()
            .map(|entry| (ParamDirection::Request, entry));
        let response = response_sensitive_params
            .into_iter()
            .flat_map(|group| group.results)
            .map(|entry| (ParamDirection::Response, entry));

        request
            .chain(response)
            .map(|(direction, entry)| SensitiveParamRecord {
                id: id.clone(),
                data_type_id: entry.data_type_id,
                data_set_ids: entry.data_set_ids,
                direction,
                param_type: entry.param_type,
                typename: entry.typename,
            })
            .collect()
    }
}

/// A `results` list of sensitive parameters
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ParamGroup {
    /// Parameter entries
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<ParamEntry>,
    /// Total reported by the service
    #[serde(default)]
    pub total: Option<u64>,
}

/// One sensitive parameter entry as returned by the service
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamEntry {
    /// Data type identifier
    #[serde(default)]
    pub data_type_id: Option<String>,
    /// Dataset identifiers
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data_set_ids: Vec<String>,
    /// Parameter type tag
    #[serde(default, rename = "type")]
    pub param_type: Option<String>,
    /// GraphQL `__typename`
    #[serde(default, rename = "__typename")]
    pub typename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
struct EntitiesData {
    entities: EntityResults,
}

#[derive(Debug, Deserialize)]
struct EntityResults {
    #[serde(default, deserialize_with = "null_as_empty")]
    results: Vec<EntitySummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsightData {
    api_insight_by_api_id: Option<ApiInsight>,
}

/// HTTP implementation of [`QueryClient`]
pub struct GraphQlClient {
    http_client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
    insight_query: String,
}

impl GraphQlClient {
    /// Create a client for the configured endpoint
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(endpoint: &EndpointConfig, include_response_params: bool) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(endpoint.timeout)
            .user_agent(&endpoint.user_agent)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.url.clone(),
            auth_token: endpoint.auth_token.clone(),
            insight_query: api_insight_query(include_response_params),
        })
    }

    /// POST one GraphQL document and decode its `data` member
    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Option<Value>) -> Result<T> {
        let mut body = json!({ "query": query });
        if let Some(variables) = variables {
            body["variables"] = variables;
        }

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.header(reqwest::header::AUTHORIZATION, token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut body, ERROR_BODY_LIMIT);
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let envelope: GraphQlResponse<T> = serde_json::from_slice(&bytes)?;
        match envelope.data {
            Some(data) => {
                if !envelope.errors.is_empty() {
                    tracing::debug!(
                        errors = envelope.errors.len(),
                        "GraphQL response carried partial errors"
                    );
                }
                Ok(data)
            }
            None => Err(Error::GraphQl(join_messages(&envelope.errors))),
        }
    }
}

#[async_trait]
impl QueryClient for GraphQlClient {
    async fn fetch_entities(&self, query: &EntityQueryConfig) -> Result<Vec<EntitySummary>> {
        tracing::debug!(endpoint = %self.endpoint, scope = %query.scope, "fetching entity list");
        let data: EntitiesData = self.execute(&entities_query(query), None).await?;
        Ok(data.entities.results)
    }

    async fn fetch_api_insight(&self, id: &str) -> Result<ApiInsight> {
        let data: InsightData = self
            .execute(&self.insight_query, Some(json!({ "id": id })))
            .await?;
        data.api_insight_by_api_id
            .ok_or_else(|| Error::GraphQl(format!("no insight returned for {id}")))
    }
}

fn join_messages(errors: &[GraphQlErrorEntry]) -> String {
    if errors.is_empty() {
        return "response contained no data".to_string();
    }
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn truncate_at_char_boundary(text: &mut String, limit: usize) {
    if text.len() <= limit {
        return;
    }
    let mut cut = limit;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests;
