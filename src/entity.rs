//! Приемник результатов: интеграция содержит entity, entity содержит
//! наборы метрик и инвентарь по категориям.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Поле с типом события, есть в каждом наборе метрик
pub const EVENT_TYPE_FIELD: &str = "event_type";

/// Объявленный тип поля метрики
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Gauge,
    Rate,
    Delta,
    Attribute,
}

impl SourceType {
    pub fn is_numeric(self) -> bool {
        !matches!(self, SourceType::Attribute)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceType::Gauge => "gauge",
            SourceType::Rate => "rate",
            SourceType::Delta => "delta",
            SourceType::Attribute => "attribute",
        };
        f.write_str(name)
    }
}

/// Значение в наборе метрик или в инвентаре.
///
/// Числа хранятся как `i128`: туда без потерь помещаются все целые типы SNMP
/// (знаковые и беззнаковые 64-битные).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricValue {
    Number(i128),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Text(s) => serializer.serialize_str(s),
            MetricValue::Number(n) => {
                if let Ok(v) = i64::try_from(*n) {
                    serializer.serialize_i64(v)
                } else if let Ok(v) = u64::try_from(*n) {
                    serializer.serialize_u64(v)
                } else {
                    serializer.serialize_i128(*n)
                }
            }
        }
    }
}

/// Причины, по которым приемник отклоняет значение
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("имя не может быть пустым")]
    EmptyName,
    #[error("категория инвентаря не может быть пустой")]
    EmptyCategory,
    #[error("поле [{0}] уже задано")]
    Duplicate(String),
    #[error("значение [{value}] не подходит для типа {source_type}")]
    TypeMismatch {
        value: String,
        source_type: SourceType,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub value: MetricValue,
    pub source_type: SourceType,
}

/// Одна выходная запись. Всегда содержит тип события как атрибут
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSet {
    event_type: String,
    fields: BTreeMap<String, Field>,
}

impl MetricSet {
    pub fn new(event_type: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            EVENT_TYPE_FIELD.to_string(),
            Field {
                value: MetricValue::Text(event_type.to_string()),
                source_type: SourceType::Attribute,
            },
        );

        Self {
            event_type: event_type.to_string(),
            fields,
        }
    }

    pub fn set_metric(
        &mut self,
        name: &str,
        value: MetricValue,
        source_type: SourceType,
    ) -> Result<(), SinkError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SinkError::EmptyName);
        }

        let fits = match &value {
            MetricValue::Number(_) => source_type.is_numeric(),
            MetricValue::Text(_) => source_type == SourceType::Attribute,
        };
        if !fits {
            return Err(SinkError::TypeMismatch {
                value: value.to_string(),
                source_type,
            });
        }

        if self.fields.contains_key(name) {
            return Err(SinkError::Duplicate(name.to_string()));
        }

        self.fields
            .insert(name.to_string(), Field { value, source_type });
        Ok(())
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Field> {
        &self.fields
    }

    /// Количество полей без учета типа события
    pub fn len(&self) -> usize {
        self.fields.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type Inventory = BTreeMap<String, BTreeMap<String, MetricValue>>;

/// Логическая цель, получающая все записи цикла сбора
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    name: String,
    kind: String,
    metric_sets: Vec<MetricSet>,
    inventory: Inventory,
}

impl Entity {
    pub fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            metric_sets: Vec::new(),
            inventory: Inventory::new(),
        }
    }

    pub fn add_metric_set(&mut self, metric_set: MetricSet) {
        self.metric_sets.push(metric_set);
    }

    pub fn set_inventory_item(
        &mut self,
        category: &str,
        name: &str,
        value: MetricValue,
    ) -> Result<(), SinkError> {
        let category = category.trim();
        let name = name.trim();
        if category.is_empty() {
            return Err(SinkError::EmptyCategory);
        }
        if name.is_empty() {
            return Err(SinkError::EmptyName);
        }

        let items = self.inventory.entry(category.to_string()).or_default();
        if items.contains_key(name) {
            return Err(SinkError::Duplicate(format!("{}/{}", category, name)));
        }
        items.insert(name.to_string(), value);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn metric_sets(&self) -> &[MetricSet] {
        &self.metric_sets
    }

    /// Наборы метрик с данным типом события, в порядке добавления
    pub fn metric_sets_of<'a>(
        &'a self,
        event_type: &'a str,
    ) -> impl Iterator<Item = &'a MetricSet> {
        self.metric_sets
            .iter()
            .filter(move |ms| ms.event_type() == event_type)
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }
}

/// Корневой контейнер, публикуемый в конце цикла
#[derive(Debug, Clone)]
pub struct Integration {
    pub name: String,
    pub version: String,
    entities: Vec<Entity>,
}

impl Integration {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            entities: Vec::new(),
        }
    }

    /// Возвращает entity с таким именем и типом, создает при первом обращении
    pub fn entity(&mut self, name: &str, kind: &str) -> &mut Entity {
        let position = self
            .entities
            .iter()
            .position(|e| e.name == name && e.kind == kind);

        match position {
            Some(i) => &mut self.entities[i],
            None => {
                self.entities.push(Entity::new(name, kind));
                let last = self.entities.len() - 1;
                &mut self.entities[last]
            }
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_set_carries_event_type() {
        let ms = MetricSet::new("SNMPSample");
        assert_eq!(ms.event_type(), "SNMPSample");
        assert_eq!(
            ms.get(EVENT_TYPE_FIELD).map(|f| &f.value),
            Some(&MetricValue::Text("SNMPSample".to_string()))
        );
        assert!(ms.is_empty());
    }

    #[test]
    fn test_set_metric_rejects_bad_input() {
        let mut ms = MetricSet::new("SNMPSample");

        assert_eq!(
            ms.set_metric("  ", MetricValue::Number(1), SourceType::Gauge),
            Err(SinkError::EmptyName)
        );
        assert!(matches!(
            ms.set_metric("descr", MetricValue::Text("x".into()), SourceType::Gauge),
            Err(SinkError::TypeMismatch { .. })
        ));
        assert!(matches!(
            ms.set_metric("count", MetricValue::Number(3), SourceType::Attribute),
            Err(SinkError::TypeMismatch { .. })
        ));

        ms.set_metric("count", MetricValue::Number(3), SourceType::Rate)
            .unwrap();
        assert_eq!(
            ms.set_metric("count", MetricValue::Number(4), SourceType::Rate),
            Err(SinkError::Duplicate("count".to_string()))
        );
        assert_eq!(
            ms.set_metric(EVENT_TYPE_FIELD, MetricValue::Text("x".into()), SourceType::Attribute),
            Err(SinkError::Duplicate(EVENT_TYPE_FIELD.to_string()))
        );
        assert_eq!(ms.len(), 1);
    }

    #[test]
    fn test_inventory_items_grouped_by_category() {
        let mut entity = Entity::new("10.0.0.1", "host");
        entity
            .set_inventory_item("system", "sysDescr", MetricValue::Text("Linux".into()))
            .unwrap();
        entity
            .set_inventory_item("system", "sysServices", MetricValue::Number(72))
            .unwrap();

        assert_eq!(
            entity.set_inventory_item("", "x", MetricValue::Number(1)),
            Err(SinkError::EmptyCategory)
        );
        assert!(matches!(
            entity.set_inventory_item("system", "sysDescr", MetricValue::Number(1)),
            Err(SinkError::Duplicate(_))
        ));

        let system = &entity.inventory()["system"];
        assert_eq!(system.len(), 2);
        assert_eq!(system["sysServices"], MetricValue::Number(72));
    }

    #[test]
    fn test_integration_reuses_entities() {
        let mut integration = Integration::new("com.example.snmp", "0.1.0");
        integration
            .entity("router", "host")
            .add_metric_set(MetricSet::new("A"));
        integration
            .entity("router", "host")
            .add_metric_set(MetricSet::new("B"));
        integration.entity("switch", "host");

        assert_eq!(integration.entities().len(), 2);
        assert_eq!(integration.entities()[0].metric_sets().len(), 2);
    }

    #[test]
    fn test_large_numbers_serialize_losslessly() {
        let json = serde_json::to_string(&MetricValue::Number(u64::MAX as i128)).unwrap();
        assert_eq!(json, "18446744073709551615");
        let json = serde_json::to_string(&MetricValue::Number(-5)).unwrap();
        assert_eq!(json, "-5");
    }
}
