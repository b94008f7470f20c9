use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::emit_metric;
use super::index;
use super::types::CollectStats;
use crate::config::{IndexDefinition, MetricDefinition};
use crate::entity::{Entity, MetricSet, MetricValue, SourceType};
use crate::error::CollectError;
use crate::snmp::{RawValue, RawVariable, SnmpSession};

/// Результат одного обхода таблицы, разделенный на ячейки индексов и метрик.
///
/// Живет только в пределах одного вызова [`TableCollector::collect`].
#[derive(Debug, Default)]
pub struct TableAccumulator {
    row_keys: BTreeSet<String>,
    index_attrs: BTreeMap<String, BTreeMap<String, String>>,
    metric_cells: HashMap<String, RawValue>,
}

impl TableAccumulator {
    /// Относит переменную обхода к ячейкам индекса или метрик
    pub fn absorb(
        &mut self,
        index: &[IndexDefinition],
        variable: RawVariable,
    ) -> Result<(), CollectError> {
        let oid = variable.oid.trim();

        match index::extract(oid, &variable.value, index)? {
            Some(cell) => {
                self.row_keys.insert(cell.row_key.clone());
                self.index_attrs
                    .entry(cell.row_key)
                    .or_default()
                    .insert(cell.name, cell.value);
            }
            None => {
                self.metric_cells.insert(oid.to_string(), variable.value);
            }
        }

        Ok(())
    }

    pub fn row_keys(&self) -> impl Iterator<Item = &str> {
        self.row_keys.iter().map(String::as_str)
    }

    pub fn metric_cell_count(&self) -> usize {
        self.metric_cells.len()
    }

    /// Одна запись на каждый ключ строки с атрибутами индекса
    fn into_rows(
        self,
        event_type: &str,
        metrics: &[MetricDefinition],
    ) -> (Vec<MetricSet>, CollectStats) {
        let mut stats = CollectStats::default();
        let mut rows = Vec::with_capacity(self.row_keys.len());

        for row_key in &self.row_keys {
            let Some(attributes) = self.index_attrs.get(row_key) else {
                continue;
            };

            let mut metric_set = MetricSet::new(event_type);
            for (name, value) in attributes {
                let value = MetricValue::Text(value.clone());
                match metric_set.set_metric(name, value, SourceType::Attribute) {
                    Ok(()) => stats.fields += 1,
                    Err(source) => stats.note(CollectError::Sink {
                        field: name.clone(),
                        source,
                    }),
                }
            }

            for definition in metrics {
                let oid = format!("{}.{}", definition.oid.trim(), row_key);
                let Some(value) = self.metric_cells.get(&oid) else {
                    continue;
                };
                emit_metric(
                    &mut metric_set,
                    definition.output_name(&oid),
                    &oid,
                    value,
                    definition.source_type,
                    &mut stats,
                );
            }

            rows.push(metric_set);
        }

        stats.records = rows.len();
        (rows, stats)
    }
}

/// Коллектор табличных наборов метрик, один обход поддерева
pub struct TableCollector;

impl TableCollector {
    /// Обходит `root_oid` и создает по записи на каждую найденную строку.
    ///
    /// Ячейка индекса без значения прерывает обход, для таблицы
    /// ничего не записывается.
    pub async fn collect(
        session: &mut dyn SnmpSession,
        event_type: &str,
        root_oid: &str,
        index: &[IndexDefinition],
        metrics: &[MetricDefinition],
        entity: &mut Entity,
    ) -> Result<CollectStats, CollectError> {
        let mut accumulator = TableAccumulator::default();

        session
            .walk(root_oid.trim(), &mut |variable: RawVariable| {
                accumulator.absorb(index, variable)
            })
            .await?;

        tracing::debug!(
            event_type = %event_type,
            rows = accumulator.row_keys.len(),
            metric_cells = accumulator.metric_cell_count(),
            "обход таблицы завершен"
        );

        let (rows, stats) = accumulator.into_rows(event_type, metrics);
        for row in rows {
            entity.add_metric_set(row);
        }

        Ok(stats)
    }
}
