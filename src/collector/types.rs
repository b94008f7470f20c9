use std::fmt;

use crate::error::{CollectError, Severity};

/// Результат сбора одного набора метрик или инвентаря
#[derive(Debug, Default)]
pub struct CollectStats {
    /// Записи (наборы метрик), переданные в entity
    pub records: usize,
    /// Сохраненные поля или элементы инвентаря
    pub fields: usize,
    /// Пропущенные проблемы, по одной записи на каждый случай
    pub skipped: Vec<CollectError>,
}

impl CollectStats {
    /// Логирует проблему один раз и сохраняет ее
    pub(crate) fn note(&mut self, issue: CollectError) {
        debug_assert!(issue.is_ignorable(), "прерывающая ошибка в note: {}", issue);
        tracing::warn!(error = %issue, "значение пропущено");
        self.skipped.push(issue);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    MetricSet,
    Inventory,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::MetricSet => f.write_str("metric_set"),
            ItemType::Inventory => f.write_str("inventory"),
        }
    }
}

/// Прерванный набор метрик или инвентарь
#[derive(Debug)]
pub struct Failure {
    pub item_type: ItemType,
    pub item_name: String,
    pub error: CollectError,
}

/// Итог одного полного цикла сбора
#[derive(Debug, Default)]
pub struct CycleReport {
    pub metric_sets_attempted: usize,
    pub records: usize,
    pub fields: usize,
    pub skipped_fields: usize,
    pub failures: Vec<Failure>,
}

impl CycleReport {
    /// Учитывает результат одного коллектора по уровню серьезности ошибки
    pub(crate) fn settle(
        &mut self,
        item_type: ItemType,
        item_name: &str,
        result: Result<CollectStats, CollectError>,
    ) {
        let error = match result {
            Ok(stats) => {
                self.record(&stats);
                return;
            }
            Err(error) => error,
        };

        match error.severity() {
            Severity::Ignorable => {
                tracing::warn!(
                    item_type = %item_type,
                    item = %item_name,
                    error = %error,
                    "ошибка пропущена"
                );
                self.skipped_fields += 1;
            }
            Severity::MetricSetAborting => self.fail(item_type, item_name, error),
        }
    }

    fn record(&mut self, stats: &CollectStats) {
        self.records += stats.records;
        self.fields += stats.fields;
        self.skipped_fields += stats.skipped.len();
    }

    fn fail(&mut self, item_type: ItemType, item_name: &str, error: CollectError) {
        tracing::error!(
            item_type = %item_type,
            item = %item_name,
            error = %error,
            "сбор прерван"
        );
        self.failures.push(Failure {
            item_type,
            item_name: item_name.to_string(),
            error,
        });
    }

    pub fn metric_sets_failed(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.item_type == ItemType::MetricSet)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueGap;

    #[test]
    fn test_settle_counts_stats() {
        let mut report = CycleReport::default();
        let stats = CollectStats {
            records: 2,
            fields: 7,
            skipped: vec![CollectError::NoValue {
                oid: ".1.3.6.1.2.1.2.2.1.8.2".to_string(),
                gap: ValueGap::Null,
            }],
        };

        report.settle(ItemType::MetricSet, "SNMPInterfaceSample", Ok(stats));

        assert_eq!(report.records, 2);
        assert_eq!(report.fields, 7);
        assert_eq!(report.skipped_fields, 1);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_settle_routes_by_severity() {
        let mut report = CycleReport::default();

        report.settle(
            ItemType::MetricSet,
            "SNMPSample",
            Err(CollectError::UndefinedOid {
                oid: ".1.3.6.1.2.1.1.9.0".to_string(),
            }),
        );
        assert!(report.failures.is_empty());
        assert_eq!(report.skipped_fields, 1);

        report.settle(
            ItemType::Inventory,
            "inventory",
            Err(CollectError::Transport(anyhow::anyhow!("timeout"))),
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].item_type, ItemType::Inventory);
        assert_eq!(report.metric_sets_failed(), 0);
    }
}
