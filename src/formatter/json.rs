use serde::Serialize;
use std::collections::BTreeMap;

use crate::collector::CycleReport;
use crate::entity::{Entity, Integration, Inventory, MetricValue};

pub const PROTOCOL_VERSION: &str = "3";

/// Результат цикла сбора для публикации
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationJson<'a> {
    pub name: &'a str,
    pub integration_version: &'a str,
    pub protocol_version: &'static str,
    pub collected_at: String,
    pub summary: ResultSummary,
    pub errors: Vec<ErrorInfo>,
    pub data: Vec<EntityJson<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    pub metric_sets_attempted: usize,
    pub metric_sets_failed: usize,
    pub records: usize,
    pub fields: usize,
    pub skipped_fields: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub item_type: String, // "metric_set" | "inventory"
    pub item_name: String,
    pub error_message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityJson<'a> {
    pub entity: EntityId<'a>,
    /// Каждая запись как плоская карта полей, включая `event_type`
    pub metrics: Vec<BTreeMap<&'a str, &'a MetricValue>>,
    pub inventory: &'a Inventory,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityId<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
}

/// JSON форматтер для результатов сбора
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format_integration<'a>(
        integration: &'a Integration,
        report: &CycleReport,
    ) -> IntegrationJson<'a> {
        let summary = ResultSummary {
            metric_sets_attempted: report.metric_sets_attempted,
            metric_sets_failed: report.metric_sets_failed(),
            records: report.records,
            fields: report.fields,
            skipped_fields: report.skipped_fields,
        };

        IntegrationJson {
            name: &integration.name,
            integration_version: &integration.version,
            protocol_version: PROTOCOL_VERSION,
            collected_at: chrono::Utc::now().to_rfc3339(),
            summary,
            errors: Self::extract_errors(report),
            data: integration
                .entities()
                .iter()
                .map(Self::format_entity)
                .collect(),
        }
    }

    fn format_entity(entity: &Entity) -> EntityJson<'_> {
        let metrics = entity
            .metric_sets()
            .iter()
            .map(|ms| {
                ms.fields()
                    .iter()
                    .map(|(name, field)| (name.as_str(), &field.value))
                    .collect()
            })
            .collect();

        EntityJson {
            entity: EntityId {
                name: entity.name(),
                kind: entity.kind(),
            },
            metrics,
            inventory: entity.inventory(),
        }
    }

    fn extract_errors(report: &CycleReport) -> Vec<ErrorInfo> {
        report
            .failures
            .iter()
            .map(|failure| ErrorInfo {
                item_type: failure.item_type.to_string(),
                item_name: failure.item_name.clone(),
                error_message: failure.error.to_string(),
            })
            .collect()
    }

    /// Сериализует в отформатированный JSON
    pub fn to_json_string(
        integration: &Integration,
        report: &CycleReport,
    ) -> anyhow::Result<String> {
        let json = Self::format_integration(integration, report);
        serde_json::to_string_pretty(&json)
            .map_err(|e| anyhow::anyhow!("Ошибка сериализации JSON: {}", e))
    }

    /// Сериализует в компактный JSON
    pub fn to_json_compact(
        integration: &Integration,
        report: &CycleReport,
    ) -> anyhow::Result<String> {
        let json = Self::format_integration(integration, report);
        serde_json::to_string(&json)
            .map_err(|e| anyhow::anyhow!("Ошибка сериализации JSON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::ItemType;
    use crate::entity::{MetricSet, SourceType};
    use crate::error::CollectError;

    fn sample() -> (Integration, CycleReport) {
        let mut integration = Integration::new("com.example.snmp", "0.1.0");
        let entity = integration.entity("10.0.0.1", "host");

        let mut ms = MetricSet::new("SNMPSample");
        ms.set_metric("sysUpTime", MetricValue::Number(12345), SourceType::Gauge)
            .unwrap();
        entity.add_metric_set(ms);
        entity
            .set_inventory_item("system", "sysDescr", MetricValue::Text("Linux".into()))
            .unwrap();

        let mut report = CycleReport {
            metric_sets_attempted: 2,
            records: 1,
            fields: 1,
            ..CycleReport::default()
        };
        report.settle(
            ItemType::MetricSet,
            "SNMPInterfaceSample",
            Err(CollectError::Transport(anyhow::anyhow!("request timed out"))),
        );

        (integration, report)
    }

    #[test]
    fn test_payload_layout() {
        let (integration, report) = sample();
        let json = JsonFormatter::to_json_compact(&integration, &report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["name"], "com.example.snmp");
        assert_eq!(value["protocol_version"], "3");
        assert_eq!(value["summary"]["metric_sets_failed"], 1);
        assert_eq!(value["errors"][0]["item_type"], "metric_set");
        assert!(value["errors"][0]["error_message"]
            .as_str()
            .unwrap()
            .contains("request timed out"));

        let data = &value["data"][0];
        assert_eq!(data["entity"]["name"], "10.0.0.1");
        assert_eq!(data["entity"]["type"], "host");
        assert_eq!(data["metrics"][0]["event_type"], "SNMPSample");
        assert_eq!(data["metrics"][0]["sysUpTime"], 12345);
        assert_eq!(data["inventory"]["system"]["sysDescr"], "Linux");
    }

    #[test]
    fn test_pretty_and_compact_agree() {
        let (integration, report) = sample();
        let pretty: serde_json::Value =
            serde_json::from_str(&JsonFormatter::to_json_string(&integration, &report).unwrap())
                .unwrap();
        let compact: serde_json::Value =
            serde_json::from_str(&JsonFormatter::to_json_compact(&integration, &report).unwrap())
                .unwrap();

        assert_eq!(pretty["data"], compact["data"]);
        assert_eq!(pretty["summary"], compact["summary"]);
    }
}
