//! GraphQL query documents for the entity list and per-entity detail lookups.

use crate::config::{AttributeFilter, EntityQueryConfig, FilterValue};
use chrono::SecondsFormat;
use std::fmt::Write;

/// Attribute aliases requested for every entity, as `(alias, attribute key)`
const ENTITY_ATTRIBUTES: [(&str, &str); 8] = [
    ("name", "name"),
    ("dataTypeIds", "dataTypeIds"),
    ("serviceName", "serviceName"),
    ("isAuthenticated", "isAuthenticated"),
    ("isLearnt", "isLearnt"),
    ("apiRiskScoreCategory", "apiRiskScoreCategory"),
    ("riskLikelihoodFactors", "riskLikelihoodFactors"),
    ("riskImpactFactors", "riskImpactFactors"),
];

const PARAM_GROUP_SELECTION: &str = "{
      results {
        dataTypeId
        dataSetIds
        type
        __typename
      }
      total
      __typename
    }";

/// Build the bulk entity query
///
/// Scope, window and filters are written as literals; the upstream `entities`
/// field takes structured input types whose names vary between deployments, so
/// variables are avoided here.
pub fn entities_query(config: &EntityQueryConfig) -> String {
    let mut filters = String::new();
    for filter in &config.filters {
        let _ = writeln!(filters, "      {}", filter_literal(filter));
    }

    let mut attributes = String::new();
    for (alias, key) in ENTITY_ATTRIBUTES {
        let _ = writeln!(
            attributes,
            "      {alias}: attribute(expression: {{ key: {} }})",
            string_literal(key)
        );
    }

    format!(
        "{{
  entities(
    scope: {scope}
    limit: {limit}
    between: {{
      startTime: {start}
      endTime: {end}
    }}
    offset: {offset}
    filterBy: [
{filters}    ]
    includeInactive: {include_inactive}
  ) {{
    results {{
      id
{attributes}    }}
  }}
}}",
        scope = string_literal(&config.scope),
        limit = config.limit,
        start = string_literal(
            &config
                .start_time
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
        end = string_literal(&config.end_time.to_rfc3339_opts(SecondsFormat::Millis, true)),
        offset = config.offset,
        include_inactive = config.include_inactive,
    )
}

/// Build the per-entity detail query, taking the entity id as `$id`
pub fn api_insight_query(include_response_params: bool) -> String {
    let response_group = if include_response_params {
        format!("\n    responseSensitiveParams {PARAM_GROUP_SELECTION}")
    } else {
        String::new()
    };

    format!(
        "query GetApiDetails($id: String!) {{
  apiInsightByApiId(id: $id) {{
    id
    requestSensitiveParams {PARAM_GROUP_SELECTION}{response_group}
  }}
}}"
    )
}

fn filter_literal(filter: &AttributeFilter) -> String {
    let value = match &filter.value {
        FilterValue::Single(v) => string_literal(v),
        FilterValue::List(values) => {
            let items: Vec<String> = values.iter().map(|v| string_literal(v)).collect();
            format!("[{}]", items.join(", "))
        }
    };
    format!(
        "{{ keyExpression: {{ key: {} }}, operator: {}, value: {}, type: ATTRIBUTE }}",
        string_literal(&filter.key),
        filter.operator.as_graphql(),
        value
    )
}

// GraphQL string escaping is a subset of JSON's
fn string_literal(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}
