//! SNMP поллер.
//!
//! Читает определения сбора (скалярные наборы, таблицы и элементы
//! инвентаря), опрашивает одно устройство через [`snmp::SnmpSession`] и
//! сохраняет типизированные записи в [`entity::Entity`].

pub mod collector;
pub mod config;
pub mod entity;
pub mod error;
pub mod formatter;
pub mod snmp;

pub use collector::{CycleReport, SnmpCollector};
pub use config::{AppConfig, CollectionDefinitions, Settings};
pub use entity::{Entity, Integration, MetricSet, MetricValue, SourceType};
pub use error::{CollectError, Severity};
pub use snmp::{RawValue, RawVariable, SnmpSession};
