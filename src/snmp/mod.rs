use async_trait::async_trait;
use std::fmt;

use crate::error::CollectError;

pub mod oid;
pub mod usm;
pub mod v2c;

pub use oid::{normalize_oid, parse_oid};
pub use usm::known_protocol_error;
pub use v2c::SnmpClientV2c;

/// Значение протокола с типом из PDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    OctetString(Vec<u8>),
    Gauge32(u32),
    Counter32(u32),
    Counter64(u64),
    Integer(i64),
    Null,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    Timeticks(u32),
    IpAddress([u8; 4]),
    ObjectIdentifier(String),
    /// Любой другой тип, в debug представлении
    Other(String),
}

impl RawValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::OctetString(_) => "OctetString",
            RawValue::Gauge32(_) => "Gauge32",
            RawValue::Counter32(_) => "Counter32",
            RawValue::Counter64(_) => "Counter64",
            RawValue::Integer(_) => "Integer",
            RawValue::Null => "Null",
            RawValue::NoSuchObject => "NoSuchObject",
            RawValue::NoSuchInstance => "NoSuchInstance",
            RawValue::EndOfMibView => "EndOfMibView",
            RawValue::Timeticks(_) => "Timeticks",
            RawValue::IpAddress(_) => "IpAddress",
            RawValue::ObjectIdentifier(_) => "ObjectIdentifier",
            RawValue::Other(_) => "Other",
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::OctetString(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            RawValue::Gauge32(n) | RawValue::Counter32(n) | RawValue::Timeticks(n) => {
                write!(f, "{}", n)
            }
            RawValue::Counter64(n) => write!(f, "{}", n),
            RawValue::Integer(n) => write!(f, "{}", n),
            RawValue::IpAddress([a, b, c, d]) => write!(f, "{}.{}.{}.{}", a, b, c, d),
            RawValue::ObjectIdentifier(oid) => f.write_str(oid),
            RawValue::Other(text) => f.write_str(text),
            RawValue::Null
            | RawValue::NoSuchObject
            | RawValue::NoSuchInstance
            | RawValue::EndOfMibView => f.write_str(self.type_name()),
        }
    }
}

/// Пара (OID, значение) из ответа GET или из обхода
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVariable {
    pub oid: String,
    pub value: RawValue,
}

impl RawVariable {
    pub fn new(oid: impl Into<String>, value: RawValue) -> Self {
        Self {
            oid: oid.into(),
            value,
        }
    }
}

/// Callback обхода. Ошибка останавливает обход и возвращается из walk
pub type WalkCallback<'a> = dyn FnMut(RawVariable) -> Result<(), CollectError> + Send + 'a;

/// SNMP операции, нужные коллекторам.
///
/// Таймауты и повторы на стороне реализации, коллекторы сами
/// ничего не повторяют.
#[async_trait]
pub trait SnmpSession: Send {
    /// Запрашивает указанные OID
    async fn get(&mut self, oids: &[String]) -> Result<Vec<RawVariable>, CollectError>;

    /// Обходит поддерево `root_oid` и передает каждую переменную в `on_each`
    /// до запроса следующей
    async fn walk(
        &mut self,
        root_oid: &str,
        on_each: &mut WalkCallback<'_>,
    ) -> Result<(), CollectError>;
}
