use anyhow::{Context, Result};
use async_trait::async_trait;
use snmp2::{AsyncSession, Oid, Value};
use tokio::time::{timeout, Duration};

use super::oid::{format_arcs, format_oid, oid_arcs, parse_oid};
use super::{RawValue, RawVariable, SnmpSession, WalkCallback};
use crate::config::ConnectionSettings;
use crate::error::CollectError;

impl From<Value<'_>> for RawValue {
    fn from(value: Value<'_>) -> Self {
        match value {
            Value::OctetString(bytes) => RawValue::OctetString(bytes.to_vec()),
            Value::Integer(n) => RawValue::Integer(n),
            Value::Counter32(n) => RawValue::Counter32(n),
            Value::Unsigned32(n) => RawValue::Gauge32(n),
            Value::Counter64(n) => RawValue::Counter64(n),
            Value::Timeticks(n) => RawValue::Timeticks(n),
            Value::IpAddress(octets) => RawValue::IpAddress(octets),
            Value::ObjectIdentifier(oid) => RawValue::ObjectIdentifier(format_oid(&oid)),
            Value::Null => RawValue::Null,
            Value::NoSuchObject => RawValue::NoSuchObject,
            Value::NoSuchInstance => RawValue::NoSuchInstance,
            Value::EndOfMibView => RawValue::EndOfMibView,
            other => RawValue::Other(format!("{:?}", other)),
        }
    }
}

/// Счетчик повторов одного SNMP запроса
#[derive(Debug)]
struct RetryBudget {
    attempt: u32,
    retries: u32,
}

impl RetryBudget {
    fn new(retries: u32) -> Self {
        Self { attempt: 0, retries }
    }

    /// Разрешает следующую попытку или возвращает последнюю ошибку,
    /// если повторы закончились.
    fn next(&mut self, request: &str, error: anyhow::Error) -> Result<()> {
        if self.attempt >= self.retries {
            return Err(error.context(format!(
                "{} не удался после {} попыток",
                request,
                self.attempt + 1
            )));
        }
        self.attempt += 1;
        tracing::debug!(request, attempt = self.attempt, error = %error, "повтор SNMP запроса");
        Ok(())
    }
}

/// Что делать после обработки одной пачки GETBULK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkStep {
    Continue,
    Done,
}

/// Передает переменные пачки в `on_each`, пока они лежат под `root`.
///
/// Обход заканчивается на пустой пачке, на OID вне поддерева, на
/// EndOfMibView и на OID, который не больше предыдущего. `last` хранит
/// последний переданный OID и с него начинается следующий запрос.
fn absorb_batch(
    root: &[u64],
    last: &mut Vec<u64>,
    batch: Vec<RawVariable>,
    on_each: &mut WalkCallback<'_>,
) -> Result<WalkStep, CollectError> {
    if batch.is_empty() {
        return Ok(WalkStep::Done);
    }

    for variable in batch {
        let arcs = oid_arcs(&variable.oid).map_err(|e| CollectError::InvalidOid {
            oid: variable.oid.clone(),
            reason: format!("{:#}", e),
        })?;

        if !arcs.starts_with(root) || variable.value == RawValue::EndOfMibView {
            return Ok(WalkStep::Done);
        }

        // агент, который не продвигается вперед, зациклил бы обход
        if arcs <= *last {
            tracing::warn!(
                oid = %variable.oid,
                previous = %format_arcs(last.as_slice()),
                "SNMP walk не продвигается, обход остановлен"
            );
            return Ok(WalkStep::Done);
        }

        on_each(variable)?;
        *last = arcs;
    }

    Ok(WalkStep::Continue)
}

/// SNMPv2c сессия поверх UDP
pub struct SnmpClientV2c {
    session: AsyncSession,
    timeout: Duration,
    retries: u32,
    max_repetitions: u32,
}

impl SnmpClientV2c {
    pub async fn new(
        target: &str,
        community: &[u8],
        settings: &ConnectionSettings,
    ) -> Result<Self> {
        let session = AsyncSession::new_v2c(target, community, 2)
            .await
            .context(format!("Не удалось создать SNMP сессию с {}", target))?;

        Ok(Self {
            session,
            timeout: Duration::from_secs(settings.timeout),
            retries: settings.retries,
            max_repetitions: settings.max_repetitions,
        })
    }

    async fn get_one(&mut self, oid: &Oid<'_>) -> Result<RawVariable> {
        let mut budget = RetryBudget::new(self.retries);
        loop {
            match timeout(self.timeout, self.session.get(oid)).await {
                Ok(Ok(resp)) => {
                    let (name, value) = resp
                        .varbinds
                        .into_iter()
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("SNMP ответ пустой"))?;
                    return Ok(RawVariable::new(format_oid(&name), RawValue::from(value)));
                }
                Ok(Err(e)) => budget.next("SNMP GET", anyhow::anyhow!("{:?}", e))?,
                Err(_) => budget.next("SNMP GET", anyhow::anyhow!("таймаут запроса"))?,
            }
        }
    }

    async fn get_bulk(&mut self, start_oid: &Oid<'_>) -> Result<Vec<RawVariable>> {
        let oids = [start_oid];
        let mut budget = RetryBudget::new(self.retries);
        loop {
            let request = self.session.getbulk(&oids, 0, self.max_repetitions);
            match timeout(self.timeout, request).await {
                Ok(Ok(resp)) => {
                    return Ok(resp
                        .varbinds
                        .map(|(oid, value)| {
                            RawVariable::new(format_oid(&oid), RawValue::from(value))
                        })
                        .collect());
                }
                Ok(Err(e)) => budget.next("SNMP GETBULK", anyhow::anyhow!("{:?}", e))?,
                Err(_) => budget.next("SNMP GETBULK", anyhow::anyhow!("таймаут запроса"))?,
            }
        }
    }
}

fn to_protocol_oid(oid: &str) -> Result<Oid<'static>, CollectError> {
    parse_oid(oid).map_err(|e| CollectError::InvalidOid {
        oid: oid.to_string(),
        reason: format!("{:#}", e),
    })
}

#[async_trait]
impl SnmpSession for SnmpClientV2c {
    /// Один GET на каждый OID, результаты в порядке запроса
    async fn get(&mut self, oids: &[String]) -> Result<Vec<RawVariable>, CollectError> {
        let mut variables = Vec::with_capacity(oids.len());
        for oid in oids {
            let oid = to_protocol_oid(oid)?;
            variables.push(self.get_one(&oid).await?);
        }
        Ok(variables)
    }

    async fn walk(
        &mut self,
        root_oid: &str,
        on_each: &mut WalkCallback<'_>,
    ) -> Result<(), CollectError> {
        let root = oid_arcs(root_oid).map_err(|e| CollectError::InvalidOid {
            oid: root_oid.to_string(),
            reason: format!("{:#}", e),
        })?;
        let mut last = root.clone();

        loop {
            let start = to_protocol_oid(&format_arcs(&last))?;
            let batch = self.get_bulk(&start).await?;
            if absorb_batch(&root, &mut last, batch, on_each)? == WalkStep::Done {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IF_TABLE: &[u64] = &[1, 3, 6, 1, 2, 1, 2, 2, 1];

    fn var(oid: &str, value: i64) -> RawVariable {
        RawVariable::new(oid, RawValue::Integer(value))
    }

    fn run(last: &mut Vec<u64>, batch: Vec<RawVariable>) -> (WalkStep, Vec<String>) {
        let mut seen = Vec::new();
        let mut on_each = |variable: RawVariable| {
            seen.push(variable.oid);
            Ok::<(), CollectError>(())
        };
        let step = absorb_batch(IF_TABLE, last, batch, &mut on_each).unwrap();
        (step, seen)
    }

    #[test]
    fn test_batch_inside_subtree_continues_from_last_oid() {
        let mut last = IF_TABLE.to_vec();
        let (step, seen) = run(
            &mut last,
            vec![var(".1.3.6.1.2.1.2.2.1.1.1", 1), var(".1.3.6.1.2.1.2.2.1.1.2", 2)],
        );

        assert_eq!(step, WalkStep::Continue);
        assert_eq!(seen, vec![".1.3.6.1.2.1.2.2.1.1.1", ".1.3.6.1.2.1.2.2.1.1.2"]);
        assert_eq!(format_arcs(&last), ".1.3.6.1.2.1.2.2.1.1.2");
    }

    #[test]
    fn test_walk_stops_when_leaving_subtree() {
        let mut last = IF_TABLE.to_vec();
        let (step, seen) = run(
            &mut last,
            vec![var(".1.3.6.1.2.1.2.2.1.22.2", 0), var(".1.3.6.1.2.1.2.2.2.1", 7)],
        );

        assert_eq!(step, WalkStep::Done);
        assert_eq!(seen, vec![".1.3.6.1.2.1.2.2.1.22.2"]);
    }

    #[test]
    fn test_walk_stops_on_end_of_mib_view() {
        let mut last = IF_TABLE.to_vec();
        let batch = vec![
            var(".1.3.6.1.2.1.2.2.1.1.1", 1),
            RawVariable::new(".1.3.6.1.2.1.2.2.1.1.2", RawValue::EndOfMibView),
        ];
        let (step, seen) = run(&mut last, batch);

        assert_eq!(step, WalkStep::Done);
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_walk_stops_on_empty_batch() {
        let mut last = IF_TABLE.to_vec();
        let (step, seen) = run(&mut last, Vec::new());
        assert_eq!(step, WalkStep::Done);
        assert!(seen.is_empty());
    }

    #[test]
    fn test_walk_stops_when_oid_repeats_or_goes_back() {
        let mut last = IF_TABLE.to_vec();
        let (step, seen) = run(
            &mut last,
            vec![var(".1.3.6.1.2.1.2.2.1.1.1", 1), var(".1.3.6.1.2.1.2.2.1.1.1", 1)],
        );
        assert_eq!(step, WalkStep::Done);
        assert_eq!(seen.len(), 1);

        // A, B, A
        let mut last = IF_TABLE.to_vec();
        let batch = vec![
            var(".1.3.6.1.2.1.2.2.1.1.1", 1),
            var(".1.3.6.1.2.1.2.2.1.1.2", 2),
            var(".1.3.6.1.2.1.2.2.1.1.1", 1),
        ];
        let (step, seen) = run(&mut last, batch);
        assert_eq!(step, WalkStep::Done);
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_walk_stops_when_next_batch_restarts_behind_last() {
        let mut last = IF_TABLE.to_vec();
        let (step, _) = run(&mut last, vec![var(".1.3.6.1.2.1.2.2.1.2.1", 1)]);
        assert_eq!(step, WalkStep::Continue);

        let (step, seen) = run(&mut last, vec![var(".1.3.6.1.2.1.2.2.1.1.5", 5)]);
        assert_eq!(step, WalkStep::Done);
        assert!(seen.is_empty());
    }

    #[test]
    fn test_callback_error_stops_the_walk() {
        let mut last = IF_TABLE.to_vec();
        let mut calls = 0;
        let mut on_each = |variable: RawVariable| {
            calls += 1;
            Err(CollectError::UnreadableIndex {
                oid: variable.oid,
                gap: crate::error::ValueGap::Null,
            })
        };
        let batch = vec![var(".1.3.6.1.2.1.2.2.1.1.1", 1), var(".1.3.6.1.2.1.2.2.1.1.2", 2)];

        let result = absorb_batch(IF_TABLE, &mut last, batch, &mut on_each);

        assert!(matches!(result, Err(CollectError::UnreadableIndex { .. })));
        assert_eq!(calls, 1);
        assert_eq!(last, IF_TABLE.to_vec());
    }

    #[test]
    fn test_retry_budget_allows_configured_retries() {
        let mut budget = RetryBudget::new(2);
        assert!(budget.next("SNMP GET", anyhow::anyhow!("таймаут запроса")).is_ok());
        assert!(budget.next("SNMP GET", anyhow::anyhow!("таймаут запроса")).is_ok());

        let err = budget
            .next("SNMP GET", anyhow::anyhow!("таймаут запроса"))
            .unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("после 3 попыток"));
        assert!(message.contains("таймаут запроса"));
    }

    #[test]
    fn test_retry_budget_without_retries_fails_first_time() {
        let mut budget = RetryBudget::new(0);
        assert!(budget.next("SNMP GETBULK", anyhow::anyhow!("boom")).is_err());
    }
}
