use std::collections::HashMap;

use super::coerce::coerce_inventory;
use super::types::CollectStats;
use crate::config::InventoryItemDefinition;
use crate::entity::{Entity, MetricValue};
use crate::error::CollectError;
use crate::snmp::{SnmpSession, known_protocol_error};

/// Коллектор инвентаря, один GET
pub struct InventoryCollector;

impl InventoryCollector {
    /// Элементы записываются в entity, только если весь ответ обработан
    /// без известной ошибки протокола.
    pub async fn collect(
        session: &mut dyn SnmpSession,
        items: &[InventoryItemDefinition],
        entity: &mut Entity,
    ) -> Result<CollectStats, CollectError> {
        let mut stats = CollectStats::default();

        let mut oids = Vec::with_capacity(items.len());
        let mut definitions: HashMap<&str, &InventoryItemDefinition> = HashMap::new();
        for item in items {
            let oid = item.oid.trim();
            if definitions.insert(oid, item).is_none() {
                oids.push(oid.to_string());
            }
        }

        if oids.is_empty() {
            return Ok(stats);
        }

        let variables = session.get(&oids).await?;

        let mut collected: Vec<(&InventoryItemDefinition, MetricValue)> = Vec::new();
        for variable in &variables {
            let oid = variable.oid.trim();
            let Some(item) = definitions.get(oid) else {
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

            match coerce_inventory(&variable.value) {
                Ok(value) => collected.push((*item, value)),
                Err(gap) => stats.note(CollectError::NoValue {
                    oid: oid.to_string(),
                    gap,
                }),
            }
        }

        for (item, value) in collected {
            match entity.set_inventory_item(&item.category, &item.name, value) {
                Ok(()) => stats.fields += 1,
                Err(source) => stats.note(CollectError::Sink {
                    field: format!("{}/{}", item.category, item.name),
                    source,
                }),
            }
        }

        Ok(stats)
    }
}
