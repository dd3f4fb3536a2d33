//! Inner join of entity summaries with their sensitive-parameter records.

use crate::types::{EntitySummary, OutputRow, SensitiveParamRecord};
use std::collections::HashMap;

/// Index records by entity id, keeping fetch order within each id
fn index_by_id(records: &[SensitiveParamRecord]) -> HashMap<&str, Vec<&SensitiveParamRecord>> {
    let mut index: HashMap<&str, Vec<&SensitiveParamRecord>> = HashMap::new();
    for record in records {
        index.entry(record.id.as_str()).or_default().push(record);
    }
    index
}

/// Join a batch of entities with the records fetched for it
///
/// Produces one row per (entity, matching record) pair. Rows follow entity order;
/// an entity's rows follow record order. Entities with no records produce no rows,
/// and records whose id matches no entity are ignored.
pub fn join_batch(entities: &[EntitySummary], records: &[SensitiveParamRecord]) -> Vec<OutputRow> {
    let index = index_by_id(records);
    let mut rows = Vec::with_capacity(records.len());

    for entity in entities {
        let Some(matches) = index.get(entity.id.as_str()) else {
            continue;
        };
        for record in matches {
            tracing::debug!(
                id = %entity.id,
                name = entity.name.as_deref().unwrap_or_default(),
                "joined sensitive parameter"
            );
            rows.push(OutputRow::from_pair(entity, record));
        }
    }
    rows
}
