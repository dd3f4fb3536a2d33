//! Core record types: entity summaries, sensitive-parameter records and joined rows

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An API endpoint as returned by the bulk entity query
///
/// Attribute values come back from the upstream service loosely typed (an
/// attribute may be null, a scalar or a list), so deserialization is lenient:
/// missing or null lists become empty, scalar lists become one-element lists, and
/// non-string text attributes keep their JSON rendering.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    /// Entity identifier, unique within one fetch
    pub id: String,

    /// Endpoint name
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,

    /// Owning service
    #[serde(default, deserialize_with = "lenient::text")]
    pub service_name: Option<String>,

    /// Whether the endpoint requires authentication
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_authenticated: Option<bool>,

    /// Whether the endpoint has been learnt by the analytics service
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_learnt: Option<bool>,

    /// Risk category label, e.g. "LOW"
    #[serde(default, deserialize_with = "lenient::text")]
    pub api_risk_score_category: Option<String>,

    /// Factors contributing to risk likelihood
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub risk_likelihood_factors: Vec<String>,

    /// Factors contributing to risk impact
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub risk_impact_factors: Vec<String>,

    /// Sensitive data types observed on the endpoint
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub data_type_ids: Vec<String>,
}

/// Which side of the exchange a sensitive parameter was found on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamDirection {
    /// Found in `requestSensitiveParams`
    Request,
    /// Found in `responseSensitiveParams`
    Response,
}

impl std::fmt::Display for ParamDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamDirection::Request => write!(f, "request"),
            ParamDirection::Response => write!(f, "response"),
        }
    }
}

/// One sensitive parameter belonging to an entity
///
/// Several records may share the same `id`; an entity can also have none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveParamRecord {
    /// Identifier of the owning entity
    pub id: String,
    /// Sensitive data type identifier
    pub data_type_id: Option<String>,
    /// Datasets the data type belongs to
    pub data_set_ids: Vec<String>,
    /// Request or response side
    pub direction: ParamDirection,
    /// Parameter type tag, e.g. "PII"
    pub param_type: Option<String>,
    /// GraphQL `__typename` of the parameter entry
    pub typename: Option<String>,
}

/// A joined output row: one entity paired with one of its sensitive parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    /// Entity identifier
    pub id: String,
    /// Endpoint name
    pub name: Option<String>,
    /// Data types on the entity
    pub data_type_ids: Vec<String>,
    /// Datasets from the matched parameter
    pub dataset_ids: Vec<String>,
    /// Owning service
    pub service_name: Option<String>,
    /// Authentication flag
    pub is_authenticated: Option<bool>,
    /// Learnt flag
    pub is_learnt: Option<bool>,
    /// Risk category
    pub api_risk_score_category: Option<String>,
    /// Risk likelihood factors
    pub risk_likelihood: Vec<String>,
    /// Risk impact factors
    pub risk_impact_factors: Vec<String>,
    /// Parameter type tag
    pub param_type: Option<String>,
    /// Parameter `__typename`
    pub typename: Option<String>,
}

impl OutputRow {
    /// CSV header, in output column order
    pub const COLUMNS: [&'static str; 12] = [
        "id",
        "name",
        "dataTypeIds",
        "datasetIds",
        "serviceName",
        "isAuthenticated",
        "isLearnt",
        "apiRiskScoreCategory",
        "riskLikelihood",
        "riskImpactFactors",
        "type",
        "typename",
    ];

    /// Pair an entity with one of its parameter records
    pub fn from_pair(entity: &EntitySummary, param: &SensitiveParamRecord) -> Self {
        Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            data_type_ids: entity.data_type_ids.clone(),
            dataset_ids: param.data_set_ids.clone(),
            service_name: entity.service_name.clone(),
            is_authenticated: entity.is_authenticated,
            is_learnt: entity.is_learnt,
            api_risk_score_category: entity.api_risk_score_category.clone(),
            risk_likelihood: entity.risk_likelihood_factors.clone(),
            risk_impact_factors: entity.risk_impact_factors.clone(),
            param_type: param.param_type.clone(),
            typename: param.typename.clone(),
        }
    }

    /// Render the row as CSV cells, aligned with [`OutputRow::COLUMNS`]
    ///
    /// Lists are rendered as JSON arrays, flags as `true`/`false`, missing values as
    /// empty cells.
    pub fn to_record(&self) -> [String; 12] {
        [
            self.id.clone(),
            text_cell(&self.name),
            list_cell(&self.data_type_ids),
            list_cell(&self.dataset_ids),
            text_cell(&self.service_name),
            flag_cell(self.is_authenticated),
            flag_cell(self.is_learnt),
            text_cell(&self.api_risk_score_category),
            list_cell(&self.risk_likelihood),
            list_cell(&self.risk_impact_factors),
            text_cell(&self.param_type),
            text_cell(&self.typename),
        ]
    }
}

fn text_cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn flag_cell(value: Option<bool>) -> String {
    value.map(|b| b.to_string()).unwrap_or_default()
}

fn list_cell(values: &[String]) -> String {
    serde_json::Value::from(values).to_string()
}

/// Totals reported once an export completes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Entities returned by the entity-list query
    pub total_entities: usize,
    /// Batches processed
    pub batches: usize,
    /// Rows appended to the output file
    pub rows_written: usize,
    /// Detail lookups that failed and were skipped
    pub failed_lookups: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

// Tolerant decoders for loosely typed attribute values
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(scalar_to_string)
                .collect(),
            Some(other) => vec![scalar_to_string(other)],
        })
    }

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(Value::Null) => None,
            Some(other) => Some(scalar_to_string(other)),
        })
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        let flag = match &value {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            Some(_) => None,
        };
        if flag.is_none() {
            tracing::debug!(value = ?value, "unrecognised flag value, leaving cell empty");
        }
        Ok(flag)
    }

    fn scalar_to_string(value: Value) -> String {
        match value {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }
}
