//! Определения сбора: какие OID опрашивать и как их называть и типизировать.
//!
//! Файлы в формате YAML с двумя группами верхнего уровня:
//!
//! ```yaml
//! metric_sets:
//!   - event_type: SNMPSample
//!     type: scalar
//!     metrics:
//!       - oid: .1.3.6.1.2.1.1.3.0
//!         metric_name: sysUpTime
//!         metric_type: gauge
//!   - event_type: SNMPInterfaceSample
//!     type: table
//!     root_oid: .1.3.6.1.2.1.2.2.1
//!     index:
//!       - oid: .1.3.6.1.2.1.2.2.1.1
//!         name: ifIndex
//!     metrics:
//!       - oid: .1.3.6.1.2.1.2.2.1.8
//!         metric_name: ifOperStatus
//!         metric_type: attribute
//! inventory:
//!   - oid: .1.3.6.1.2.1.1.1.0
//!     category: system
//!     name: sysDescr
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::entity::SourceType;
use crate::snmp::oid::{canonical_oid, parse_oid};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Не удалось прочитать файл сбора {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Не удалось разобрать файл сбора {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yml::Error,
    },

    #[error("{origin}: {reason}")]
    Invalid { origin: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefinition {
    /// Полный OID для скаляров, префикс колонки для таблиц
    pub oid: String,
    /// Может быть пустым, см. [`MetricDefinition::output_name`]
    pub metric_name: String,
    pub source_type: SourceType,
}

impl MetricDefinition {
    pub fn new(oid: &str, metric_name: &str, source_type: SourceType) -> Self {
        Self {
            oid: oid.trim().to_string(),
            metric_name: metric_name.trim().to_string(),
            source_type,
        }
    }

    /// Имя из конфигурации или `oid`, если имя не задано
    pub fn output_name<'a>(&'a self, oid: &'a str) -> &'a str {
        if self.metric_name.is_empty() {
            oid
        } else {
            &self.metric_name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub oid: String,
    pub name: String,
}

impl IndexDefinition {
    pub fn new(oid: &str, name: &str) -> Self {
        Self {
            oid: oid.trim().to_string(),
            name: name.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricSetKind {
    Scalar,
    Table {
        root_oid: String,
        index: Vec<IndexDefinition>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSetDefinition {
    pub event_type: String,
    pub kind: MetricSetKind,
    pub metrics: Vec<MetricDefinition>,
}

impl MetricSetDefinition {
    pub fn scalar(event_type: &str, metrics: Vec<MetricDefinition>) -> Self {
        Self {
            event_type: event_type.to_string(),
            kind: MetricSetKind::Scalar,
            metrics,
        }
    }

    pub fn table(
        event_type: &str,
        root_oid: &str,
        index: Vec<IndexDefinition>,
        metrics: Vec<MetricDefinition>,
    ) -> Self {
        Self {
            event_type: event_type.to_string(),
            kind: MetricSetKind::Table {
                root_oid: root_oid.trim().to_string(),
                index,
            },
            metrics,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            MetricSetKind::Scalar => "scalar",
            MetricSetKind::Table { .. } => "table",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItemDefinition {
    pub oid: String,
    pub name: String,
    pub category: String,
}

impl InventoryItemDefinition {
    pub fn new(oid: &str, category: &str, name: &str) -> Self {
        Self {
            oid: oid.trim().to_string(),
            name: name.trim().to_string(),
            category: category.trim().to_string(),
        }
    }
}

/// Все, что опрашивается за один цикл сбора
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionDefinitions {
    pub metric_sets: Vec<MetricSetDefinition>,
    pub inventory: Vec<InventoryItemDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CollectionFile {
    #[serde(default)]
    metric_sets: Vec<MetricSetEntry>,
    #[serde(default)]
    inventory: Vec<InventoryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum MetricSetType {
    Scalar,
    Table,
}

#[derive(Debug, Deserialize)]
struct MetricSetEntry {
    event_type: String,
    #[serde(rename = "type")]
    set_type: MetricSetType,
    #[serde(default)]
    root_oid: Option<String>,
    #[serde(default)]
    index: Vec<IndexEntry>,
    #[serde(default)]
    metrics: Vec<MetricEntry>,
}

#[derive(Debug, Deserialize)]
struct MetricEntry {
    oid: String,
    #[serde(default)]
    metric_name: String,
    metric_type: SourceType,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    oid: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct InventoryEntry {
    oid: String,
    category: String,
    name: String,
}

impl CollectionDefinitions {
    /// Читает и объединяет файлы по порядку
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let mut merged = Self::default();

        for path in paths {
            let path = path.as_ref();
            let origin = path.display().to_string();
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: origin.clone(),
                source,
            })?;

            let definitions = Self::from_yaml_str(&content, &origin)?;
            merged.metric_sets.extend(definitions.metric_sets);
            merged.inventory.extend(definitions.inventory);
        }

        if merged.is_empty() {
            return Err(ConfigError::Invalid {
                origin: "файлы сбора".to_string(),
                reason: "не определено ни одного набора метрик или элемента инвентаря".to_string(),
            });
        }

        Ok(merged)
    }

    /// Разбирает и проверяет один YAML документ. `origin` используется в ошибках
    pub fn from_yaml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let file: CollectionFile =
            serde_yml::from_str(content).map_err(|source| ConfigError::Parse {
                path: origin.to_string(),
                source,
            })?;

        let invalid = |reason: String| ConfigError::Invalid {
            origin: origin.to_string(),
            reason,
        };

        let mut metric_sets = Vec::with_capacity(file.metric_sets.len());
        for entry in file.metric_sets {
            metric_sets.push(convert_metric_set(entry).map_err(invalid)?);
        }

        let mut inventory = Vec::with_capacity(file.inventory.len());
        for entry in file.inventory {
            let oid = checked_oid(&entry.oid, "элемент инвентаря").map_err(invalid)?;
            if entry.category.trim().is_empty() || entry.name.trim().is_empty() {
                return Err(invalid(format!(
                    "для элемента инвентаря {} нужны category и name",
                    oid
                )));
            }
            inventory.push(InventoryItemDefinition::new(&oid, &entry.category, &entry.name));
        }

        Ok(Self {
            metric_sets,
            inventory,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.metric_sets.is_empty() && self.inventory.is_empty()
    }
}

/// Проверяет OID и возвращает его каноническую форму
fn checked_oid(oid: &str, what: &str) -> Result<String, String> {
    let invalid = |e: anyhow::Error| format!("{}: невалидный OID '{}': {:#}", what, oid, e);
    parse_oid(oid).map_err(invalid)?;
    canonical_oid(oid).map_err(invalid)
}

fn convert_metric_set(entry: MetricSetEntry) -> Result<MetricSetDefinition, String> {
    let event_type = entry.event_type.trim();
    if event_type.is_empty() {
        return Err("набор метрик с пустым event_type".to_string());
    }

    let mut metrics = Vec::with_capacity(entry.metrics.len());
    for metric in &entry.metrics {
        let oid = checked_oid(&metric.oid, &format!("метрика в {}", event_type))?;
        metrics.push(MetricDefinition::new(&oid, &metric.metric_name, metric.metric_type));
    }

    match entry.set_type {
        MetricSetType::Scalar => {
            if entry.root_oid.is_some() || !entry.index.is_empty() {
                return Err(format!(
                    "скалярный набор {} не может содержать root_oid или index",
                    event_type
                ));
            }
            Ok(MetricSetDefinition::scalar(event_type, metrics))
        }
        MetricSetType::Table => {
            let root_oid = entry
                .root_oid
                .as_deref()
                .ok_or_else(|| format!("для таблицы {} нужен root_oid", event_type))?;
            let root_oid = checked_oid(root_oid, &format!("root_oid в {}", event_type))?;

            if entry.index.is_empty() {
                return Err(format!(
                    "для таблицы {} нужен хотя бы один index",
                    event_type
                ));
            }

            let mut index = Vec::with_capacity(entry.index.len());
            for idx in &entry.index {
                let oid = checked_oid(&idx.oid, &format!("index в {}", event_type))?;
                if idx.name.trim().is_empty() {
                    return Err(format!("у index {} в {} нет name", oid, event_type));
                }
                index.push(IndexDefinition::new(&oid, &idx.name));
            }
            check_index_overlap(event_type, &index)?;

            Ok(MetricSetDefinition::table(event_type, &root_oid, index, metrics))
        }
    }
}

/// При извлечении побеждает первое совпадение, поэтому два индекса,
/// совпадающие с одним OID, сделали бы ключи строк зависимыми от порядка.
fn check_index_overlap(event_type: &str, index: &[IndexDefinition]) -> Result<(), String> {
    for (i, a) in index.iter().enumerate() {
        for b in &index[i + 1..] {
            if oid_covers(&a.oid, &b.oid) || oid_covers(&b.oid, &a.oid) {
                return Err(format!(
                    "OID индексов {} ({}) и {} ({}) в {} пересекаются",
                    a.oid, a.name, b.oid, b.name, event_type
                ));
            }
        }
    }
    Ok(())
}

fn oid_covers(prefix: &str, oid: &str) -> bool {
    oid == prefix
        || oid
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}
