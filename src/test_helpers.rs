//! Shared fixtures for unit tests: an in-memory [`QueryClient`] and record builders.

use crate::client::{ApiInsight, ParamEntry, ParamGroup, QueryClient};
use crate::config::EntityQueryConfig;
use crate::error::{Error, Result};
use crate::types::EntitySummary;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

type LookupHook = Box<dyn Fn() + Send + Sync>;

/// In-memory client serving canned entities and insights
///
/// Ids without a canned insight fail with HTTP 500. Every detail request is
/// recorded, along with the peak number of requests in flight at once.
#[derive(Default)]
pub(crate) struct FakeClient {
    entities: Vec<EntitySummary>,
    entity_failure: bool,
    insights: HashMap<String, ApiInsight>,
    on_lookup: Option<(String, LookupHook)>,
    requested: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeClient {
    pub(crate) fn with_entities(mut self, entities: Vec<EntitySummary>) -> Self {
        self.entities = entities;
        self
    }

    pub(crate) fn with_insight(mut self, insight: ApiInsight) -> Self {
        self.insights.insert(insight.id.clone(), insight);
        self
    }

    /// Run `hook` when the detail lookup for `id` starts
    pub(crate) fn on_lookup(mut self, id: &str, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_lookup = Some((id.to_string(), Box::new(hook)));
        self
    }

    pub(crate) fn failing_entity_list(mut self) -> Self {
        self.entity_failure = true;
        self
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryClient for FakeClient {
    async fn fetch_entities(&self, _query: &EntityQueryConfig) -> Result<Vec<EntitySummary>> {
        if self.entity_failure {
            return Err(Error::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(self.entities.clone())
    }

    async fn fetch_api_insight(&self, id: &str) -> Result<ApiInsight> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(id.to_string());
        }
        if let Some((hook_id, hook)) = &self.on_lookup {
            if hook_id == id {
                hook();
            }
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.insights.get(id).cloned().ok_or_else(|| Error::Status {
            status: 500,
            body: format!("no insight for {id}"),
        })
    }
}

/// Entity with every summary field populated
pub(crate) fn entity(id: &str, name: &str) -> EntitySummary {
    EntitySummary {
        id: id.to_string(),
        name: Some(name.to_string()),
        service_name: Some("s".to_string()),
        is_authenticated: Some(true),
        is_learnt: Some(false),
        api_risk_score_category: Some("LOW".to_string()),
        risk_likelihood_factors: vec![],
        risk_impact_factors: vec![],
        data_type_ids: vec!["d1".to_string()],
    }
}

/// Parameter entry of type "PII" with the given dataset
pub(crate) fn param(data_type: &str, dataset: &str) -> ParamEntry {
    ParamEntry {
        data_type_id: Some(data_type.to_string()),
        data_set_ids: vec![dataset.to_string()],
        param_type: Some("PII".to_string()),
        typename: Some("Param".to_string()),
    }
}

/// Insight with the given request-side entries and no response group
pub(crate) fn insight(id: &str, request: Vec<ParamEntry>) -> ApiInsight {
    ApiInsight {
        id: id.to_string(),
        request_sensitive_params: ParamGroup {
            total: Some(request.len() as u64),
            results: request,
        },
        response_sensitive_params: None,
    }
}
