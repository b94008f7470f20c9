use std::collections::HashMap;

use super::emit_metric;
use super::types::CollectStats;
use crate::config::MetricDefinition;
use crate::entity::{Entity, MetricSet};
use crate::error::CollectError;
use crate::snmp::{SnmpSession, known_protocol_error};

/// Коллектор скалярных наборов метрик, один GET на набор
pub struct ScalarCollector;

impl ScalarCollector {
    /// Запрашивает все OID набора и сохраняет значения одной записью.
    ///
    /// Неизвестные OID в ответе пропускаются, кроме диагностических
    /// счетчиков USM: они прерывают набор.
    pub async fn collect(
        session: &mut dyn SnmpSession,
        event_type: &str,
        metrics: &[MetricDefinition],
        entity: &mut Entity,
    ) -> Result<CollectStats, CollectError> {
        let mut stats = CollectStats::default();

        let mut oids = Vec::with_capacity(metrics.len());
        let mut definitions: HashMap<&str, &MetricDefinition> = HashMap::new();
        for definition in metrics {
            let oid = definition.oid.trim();
            if definitions.insert(oid, definition).is_none() {
                oids.push(oid.to_string());
            }
        }

        if oids.is_empty() {
            return Ok(stats);
        }

        let variables = session.get(&oids).await?;

        let mut metric_set = MetricSet::new(event_type);
        for variable in variables {
            let oid = variable.oid.trim();
            let Some(definition) = definitions.get(oid) else {
                if let Some(name) = known_protocol_error(oid) {
                    return Err(CollectError::KnownProtocolError {
                        oid: oid.to_string(),
                        name,
                    });
                }
                stats.note(CollectError::UndefinedOid {
                    oid: oid.to_string(),
                });
                continue;
            };

            let name = definition.output_name(oid);
            emit_metric(
                &mut metric_set,
                name,
                oid,
                &variable.value,
                definition.source_type,
                &mut stats,
            );
        }

        entity.add_metric_set(metric_set);
        stats.records += 1;
        Ok(stats)
    }
}
