//! Преобразование SNMP значений в выходные значения.
//!
//! Все функции здесь чистые, логирование на стороне вызывающего.

use crate::entity::{MetricValue, SourceType};
use crate::error::ValueGap;
use crate::snmp::RawValue;

/// Как будет сохранено поле
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Numeric,
    Attribute,
}

impl From<SourceType> for TargetKind {
    fn from(source_type: SourceType) -> Self {
        if source_type.is_numeric() {
            TargetKind::Numeric
        } else {
            TargetKind::Attribute
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coerced {
    pub value: MetricValue,
    /// Объявленный тип, или `Attribute`, если пришел текст
    pub source_type: SourceType,
    /// Для типа нет отдельного правила, значение преобразовано по возможности
    pub best_effort: bool,
}

/// Группы значений по способу преобразования
enum WireClass {
    Text(String),
    Number(i128),
    Gap(ValueGap),
}

/// Относит значение к [`WireClass`]. Флаг отмечает типы без отдельного правила
fn classify(value: &RawValue) -> (WireClass, bool) {
    match value {
        RawValue::OctetString(bytes) => (
            WireClass::Text(String::from_utf8_lossy(bytes).into_owned()),
            false,
        ),
        RawValue::Gauge32(n) | RawValue::Counter32(n) => (WireClass::Number(i128::from(*n)), false),
        RawValue::Counter64(n) => (WireClass::Number(i128::from(*n)), false),
        RawValue::Integer(n) => (WireClass::Number(i128::from(*n)), false),
        RawValue::Null => (WireClass::Gap(ValueGap::Null), false),
        RawValue::NoSuchObject => (WireClass::Gap(ValueGap::NoSuchObject), false),
        RawValue::NoSuchInstance => (WireClass::Gap(ValueGap::NoSuchInstance), false),
        RawValue::EndOfMibView => (WireClass::Gap(ValueGap::EndOfMibView), true),
        RawValue::Timeticks(n) => (WireClass::Number(i128::from(*n)), true),
        RawValue::IpAddress(_) | RawValue::ObjectIdentifier(_) | RawValue::Other(_) => {
            (WireClass::Text(value.to_string()), true)
        }
    }
}

/// Приводит значение метрики к объявленному типу.
///
/// | значение        | числовой тип       | attribute        |
/// |-----------------|--------------------|------------------|
/// | текст           | текст, attribute   | текст            |
/// | число           | число              | десятичная строка|
/// | null / no-such  | пропуск            | пропуск          |
pub fn coerce_metric(value: &RawValue, declared: SourceType) -> Result<Coerced, ValueGap> {
    let (class, best_effort) = classify(value);

    let (value, source_type) = match (class, TargetKind::from(declared)) {
        (WireClass::Gap(gap), _) => return Err(gap),
        (WireClass::Text(text), _) => (MetricValue::Text(text), SourceType::Attribute),
        (WireClass::Number(n), TargetKind::Numeric) => (MetricValue::Number(n), declared),
        (WireClass::Number(n), TargetKind::Attribute) => {
            (MetricValue::Text(n.to_string()), SourceType::Attribute)
        }
    };

    Ok(Coerced {
        value,
        source_type,
        best_effort,
    })
}

/// Приводит значение индекса. Индексы всегда attribute.
///
/// Возвращает строку и признак преобразования по возможности.
pub fn coerce_index(value: &RawValue) -> Result<(String, bool), ValueGap> {
    match classify(value) {
        (WireClass::Gap(gap), _) => Err(gap),
        (WireClass::Text(text), best_effort) => Ok((text, best_effort)),
        (WireClass::Number(n), best_effort) => Ok((n.to_string(), best_effort)),
    }
}

/// Значение инвентаря: текст остается текстом, числа числами
pub fn coerce_inventory(value: &RawValue) -> Result<MetricValue, ValueGap> {
    match classify(value).0 {
        WireClass::Gap(gap) => Err(gap),
        WireClass::Text(text) => Ok(MetricValue::Text(text)),
        WireClass::Number(n) => Ok(MetricValue::Number(n)),
    }
}
