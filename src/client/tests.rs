// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoint_for(server: &MockServer) -> EndpointConfig {
    EndpointConfig {
        url: format!("{}/graphql", server.uri()),
        auth_token: Some("test-token".to_string()),
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn insight_body(id: &str) -> Value {
    json!({
        "data": {
            "apiInsightByApiId": {
                "id": id,
                "requestSensitiveParams": {
                    "results": [
                        { "dataTypeId": "d1", "dataSetIds": ["ds1"], "type": "PII", "__typename": "Param" },
                        { "dataTypeId": "d2", "dataSetIds": [], "type": "SECRET", "__typename": "Param" }
                    ],
                    "total": 2,
                    "__typename": "SensitiveParams"
                }
            }
        }
    })
}

#[tokio::test]
async fn fetch_entities_posts_query_with_auth_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "test-token"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "entities": {
                    "results": [
                        { "id": "e1", "name": "A", "dataTypeIds": ["d1"], "serviceName": "s",
                          "isAuthenticated": true, "isLearnt": false, "apiRiskScoreCategory": "LOW",
                          "riskLikelihoodFactors": [], "riskImpactFactors": [] },
                        { "id": "e2", "name": "B", "dataTypeIds": null }
                    ]
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphQlClient::new(&endpoint_for(&server), false).unwrap();
    let entities = client
        .fetch_entities(&EntityQueryConfig::default())
        .await
        .unwrap();

    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0].id, "e1");
    assert_eq!(entities[0].is_authenticated, Some(true));
    assert_eq!(entities[1].id, "e2");
    assert!(entities[1].data_type_ids.is_empty());
}

#[tokio::test]
async fn fetch_entities_non_success_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let client = GraphQlClient::new(&endpoint_for(&server), false).unwrap();
    match client.fetch_entities(&EntityQueryConfig::default()).await {
        Err(Error::Status { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid token");
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn graphql_errors_without_data_are_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [ { "message": "unknown scope" }, { "message": "bad window" } ]
        })))
        .mount(&server)
        .await;

    let client = GraphQlClient::new(&endpoint_for(&server), false).unwrap();
    match client.fetch_entities(&EntityQueryConfig::default()).await {
        Err(Error::GraphQl(message)) => assert_eq!(message, "unknown scope; bad window"),
        other => panic!("expected GraphQl error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_api_insight_sends_id_variable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({ "variables": { "id": "e42" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(insight_body("e42")))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphQlClient::new(&endpoint_for(&server), false).unwrap();
    let insight = client.fetch_api_insight("e42").await.unwrap();

    assert_eq!(insight.id, "e42");
    assert_eq!(insight.request_sensitive_params.results.len(), 2);
    assert_eq!(insight.request_sensitive_params.total, Some(2));
    assert!(insight.response_sensitive_params.is_none());
}

#[tokio::test]
async fn fetch_api_insight_null_payload_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "apiInsightByApiId": null } })),
        )
        .mount(&server)
        .await;

    let client = GraphQlClient::new(&endpoint_for(&server), false).unwrap();
    assert!(matches!(
        client.fetch_api_insight("missing").await,
        Err(Error::GraphQl(_))
    ));
}

#[tokio::test]
async fn undecodable_body_is_a_serialization_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = GraphQlClient::new(&endpoint_for(&server), false).unwrap();
    assert!(matches!(
        client.fetch_api_insight("e1").await,
        Err(Error::Serialization(_))
    ));
}

#[test]
fn insight_records_list_request_side_before_response_side() {
    let insight: ApiInsight = serde_json::from_value(json!({
        "id": "e1",
        "requestSensitiveParams": {
            "results": [ { "dataTypeId": "d1", "dataSetIds": ["ds1"], "type": "PII", "__typename": "Param" } ]
        },
        "responseSensitiveParams": {
            "results": [
                { "dataTypeId": "d2", "dataSetIds": ["ds2"], "type": "PCI", "__typename": "Param" },
                { "dataTypeId": "d3", "dataSetIds": null, "type": null, "__typename": "Param" }
            ]
        }
    }))
    .unwrap();

    let records = insight.into_records();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.id == "e1"));
    assert_eq!(records[0].direction, ParamDirection::Request);
    assert_eq!(records[0].data_set_ids, vec!["ds1".to_string()]);
    assert_eq!(records[1].direction, ParamDirection::Response);
    assert_eq!(records[1].param_type.as_deref(), Some("PCI"));
    assert_eq!(records[2].direction, ParamDirection::Response);
    assert!(records[2].data_set_ids.is_empty());
    assert_eq!(records[2].param_type, None);
}

#[test]
fn insight_without_any_params_yields_no_records() {
    let insight: ApiInsight =
        serde_json::from_value(json!({ "id": "e1", "requestSensitiveParams": { "results": null } }))
            .unwrap();
    assert!(insight.into_records().is_empty());
}

#[test]
fn long_error_bodies_are_truncated_on_char_boundary() {
    let mut body = "é".repeat(400);
    truncate_at_char_boundary(&mut body, ERROR_BODY_LIMIT);
    assert!(body.len() <= ERROR_BODY_LIMIT);
    assert!(body.chars().all(|c| c == 'é'));
}
