//! Shared fixtures for the export integration tests

#![allow(dead_code)]

use api_data_export::Config;
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing at the mock server, writing into `out_dir`
pub fn config_for(server: &MockServer, out_dir: &Path, batch_size: usize) -> Config {
    let mut config = Config::default();
    config.endpoint.url = format!("{}/graphql", server.uri());
    config.endpoint.auth_token = Some("test-token".to_string());
    config.endpoint.timeout = Duration::from_secs(5);
    config.export.batch_size = batch_size;
    config.export.pacing_delay = Duration::ZERO;
    config.export.output_path = out_dir.join("combined_data.csv");
    config
}

/// Entity as returned by the `entities` query
pub fn entity_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "dataTypeIds": ["d1"],
        "serviceName": "s",
        "isAuthenticated": true,
        "isLearnt": false,
        "apiRiskScoreCategory": "LOW",
        "riskLikelihoodFactors": [],
        "riskImpactFactors": []
    })
}

/// Single sensitive-parameter entry
pub fn param_json(data_type: &str, datasets: &[&str], kind: &str) -> Value {
    json!({
        "dataTypeId": data_type,
        "dataSetIds": datasets,
        "type": kind,
        "__typename": "Param"
    })
}

/// Serve the entity list for the bulk query
pub async fn mount_entities(server: &MockServer, entities: Vec<Value>) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("entities("))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "entities": { "results": entities } }
        })))
        .mount(server)
        .await;
}

/// Serve an insight with only a request-side group for `id`
pub async fn mount_insight(server: &MockServer, id: &str, request: Vec<Value>) {
    let total = request.len();
    mount_insight_body(
        server,
        id,
        json!({
            "id": id,
            "requestSensitiveParams": {
                "results": request,
                "total": total,
                "__typename": "SensitiveParams"
            }
        }),
    )
    .await;
}

/// Serve an arbitrary `apiInsightByApiId` payload for `id`
pub async fn mount_insight_body(server: &MockServer, id: &str, insight: Value) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({ "variables": { "id": id } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "apiInsightByApiId": insight }
        })))
        .mount(server)
        .await;
}

/// Fail the detail lookup for `id` with the given status
pub async fn mount_insight_failure(server: &MockServer, id: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({ "variables": { "id": id } })))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Parse the output file into header + records
pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("open output");
    let headers = reader
        .headers()
        .expect("read header")
        .iter()
        .map(str::to_string)
        .collect();
    let records = reader
        .records()
        .map(|r| r.expect("read record").iter().map(str::to_string).collect())
        .collect();
    (headers, records)
}
