use crate::entity::SinkError;

/// Насколько далеко распространяется ошибка сбора.
///
/// `Ignorable` стоит не больше одного поля или одного OID.
/// `MetricSetAborting` прерывает набор метрик, в котором возникла,
/// драйвер переходит к следующему.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Ignorable,
    MetricSetAborting,
}

/// Значения протокола без данных
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValueGap {
    #[error("пустое значение (Null)")]
    Null,
    #[error("объект не существует (NoSuchObject)")]
    NoSuchObject,
    #[error("экземпляр не существует (NoSuchInstance)")]
    NoSuchInstance,
    #[error("конец MIB (EndOfMibView)")]
    EndOfMibView,
}

/// Ошибки при сборе одного набора метрик или инвентаря
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// GET или WALK не удался на уровне сессии
    #[error("Ошибка SNMP транспорта: {0:#}")]
    Transport(#[from] anyhow::Error),

    #[error("Невалидный OID [{oid}]: {reason}")]
    InvalidOid { oid: String, reason: String },

    /// Ячейка индекса таблицы пришла без значения
    #[error("Не удалось прочитать значение индекса таблицы [{oid}]: {gap}")]
    UnreadableIndex { oid: String, gap: ValueGap },

    /// Устройство ответило одним из диагностических счетчиков USM
    #[error("Устройство вернуло SNMP ошибку для OID [{oid}]: {name}")]
    KnownProtocolError { oid: String, name: &'static str },

    #[error("OID отсутствует в определениях и не будет отправлен [{oid}]")]
    UndefinedOid { oid: String },

    #[error("{gap} для OID [{oid}]")]
    NoValue { oid: String, gap: ValueGap },

    #[error("Не удалось сохранить [{field}]: {source}")]
    Sink {
        field: String,
        #[source]
        source: SinkError,
    },
}

impl CollectError {
    pub fn severity(&self) -> Severity {
        match self {
            CollectError::Transport(_)
            | CollectError::InvalidOid { .. }
            | CollectError::UnreadableIndex { .. }
            | CollectError::KnownProtocolError { .. } => Severity::MetricSetAborting,
            CollectError::UndefinedOid { .. }
            | CollectError::NoValue { .. }
            | CollectError::Sink { .. } => Severity::Ignorable,
        }
    }

    pub fn is_ignorable(&self) -> bool {
        self.severity() == Severity::Ignorable
    }
}
