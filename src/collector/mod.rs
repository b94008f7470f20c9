pub mod coerce;
pub mod index;
pub mod inventory;
pub mod scalar_collector;
pub mod table_collector;
pub mod types;


pub use inventory::InventoryCollector;
pub use scalar_collector::ScalarCollector;
pub use table_collector::{TableAccumulator, TableCollector};
pub use types::{CollectStats, CycleReport, Failure, ItemType};

use crate::config::{CollectionDefinitions, MetricSetKind};
use crate::entity::{Entity, MetricSet, SourceType};
use crate::error::CollectError;
use crate::snmp::{RawValue, SnmpSession};

/// Выполняет один цикл сбора с устройства
pub struct SnmpCollector;

impl SnmpCollector {
    /// Собирает все наборы метрик в порядке объявления, затем инвентарь.
    ///
    /// Прерванный набор логируется и попадает в отчет, остальные наборы
    /// и инвентарь все равно собираются.
    pub async fn collect_all(
        session: &mut dyn SnmpSession,
        definitions: &CollectionDefinitions,
        entity: &mut Entity,
    ) -> CycleReport {
        let mut report = CycleReport::default();

        for metric_set in &definitions.metric_sets {
            report.metric_sets_attempted += 1;

            let result = match &metric_set.kind {
                MetricSetKind::Scalar => {
                    ScalarCollector::collect(
                        session,
                        &metric_set.event_type,
                        &metric_set.metrics,
                        entity,
                    )
                    .await
                }
                MetricSetKind::Table { root_oid, index } => {
                    TableCollector::collect(
                        session,
                        &metric_set.event_type,
                        root_oid,
                        index,
                        &metric_set.metrics,
                        entity,
                    )
                    .await
                }
            };

            if let Ok(stats) = &result {
                tracing::debug!(
                    event_type = %metric_set.event_type,
                    kind = metric_set.kind_name(),
                    records = stats.records,
                    fields = stats.fields,
                    skipped = stats.skipped.len(),
                    "набор метрик собран"
                );
            }
            report.settle(ItemType::MetricSet, &metric_set.event_type, result);
        }

        let result = InventoryCollector::collect(session, &definitions.inventory, entity).await;
        report.settle(ItemType::Inventory, "inventory", result);

        report
    }
}

/// Приводит значение одной ячейки и сохраняет его, пропуски учитываются в stats
pub(crate) fn emit_metric(
    metric_set: &mut MetricSet,
    name: &str,
    oid: &str,
    value: &RawValue,
    declared: SourceType,
    stats: &mut CollectStats,
) {
    let coerced = match coerce::coerce_metric(value, declared) {
        Ok(coerced) => coerced,
        Err(gap) => {
            stats.note(CollectError::NoValue {
                oid: oid.to_string(),
                gap,
            });
            return;
        }
    };

    if coerced.best_effort {
        tracing::warn!(
            oid = %oid,
            wire_type = value.type_name(),
            "неподдерживаемый тип значения, преобразовано по возможности"
        );
    }

    match metric_set.set_metric(name, coerced.value, coerced.source_type) {
        Ok(()) => stats.fields += 1,
        Err(source) => stats.note(CollectError::Sink {
            field: name.to_string(),
            source,
        }),
    }
}
