use super::coerce::coerce_index;
use crate::config::IndexDefinition;
use crate::error::CollectError;
use crate::snmp::RawValue;

/// Ячейка обхода из колонки индекса
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCell {
    /// Все после `<index oid>.`, целиком для составных индексов
    pub row_key: String,
    pub name: String,
    pub value: String,
}

/// Ключ строки для `oid` под `index_oid`, если `oid` имеет вид `index_oid.<key>`
pub fn row_key<'a>(oid: &'a str, index_oid: &str) -> Option<&'a str> {
    oid.strip_prefix(index_oid)?
        .strip_prefix('.')
        .filter(|key| !key.is_empty())
}

/// Сверяет `oid` с определениями индексов в порядке объявления.
///
/// `Ok(None)`, если ни одно не совпало: это ячейка метрики.
/// Побеждает первое совпадение.
pub fn extract(
    oid: &str,
    value: &RawValue,
    index: &[IndexDefinition],
) -> Result<Option<IndexCell>, CollectError> {
    let Some((definition, key)) = index
        .iter()
        .find_map(|def| row_key(oid, &def.oid).map(|key| (def, key)))
    else {
        return Ok(None);
    };

    let (value, best_effort) = coerce_index(value).map_err(|gap| CollectError::UnreadableIndex {
        oid: oid.to_string(),
        gap,
    })?;

    if best_effort {
        tracing::warn!(
            oid = %oid,
            index = %definition.name,
            "для значения индекса нет отдельного преобразования, используется текст"
        );
    }

    Ok(Some(IndexCell {
        row_key: key.to_string(),
        name: definition.name.clone(),
        value,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueGap;

    fn if_index() -> Vec<IndexDefinition> {
        vec![
            IndexDefinition::new("1.3.6.1.2.1.2.2.1.1", "ifIndex"),
            IndexDefinition::new("1.3.6.1.2.1.2.2.1.2", "ifDescr"),
        ]
    }

    #[test]
    fn test_row_key() {
        assert_eq!(row_key("1.3.6.1.2.1.2.2.1.1.7", "1.3.6.1.2.1.2.2.1.1"), Some("7"));
        assert_eq!(
            row_key("1.3.6.1.2.1.4.20.1.1.10.0.0.1", "1.3.6.1.2.1.4.20.1.1"),
            Some("10.0.0.1")
        );
        // соседняя колонка с общим текстовым префиксом
        assert_eq!(row_key("1.3.6.1.2.1.2.2.1.10.7", "1.3.6.1.2.1.2.2.1.1"), None);
        assert_eq!(row_key("1.3.6.1.2.1.2.2.1.1", "1.3.6.1.2.1.2.2.1.1"), None);
        assert_eq!(row_key("1.3.6.1.2.1.2.2.1.1.", "1.3.6.1.2.1.2.2.1.1"), None);
    }

    #[test]
    fn test_extract_index_cell() {
        let cell = extract("1.3.6.1.2.1.2.2.1.1.3", &RawValue::Integer(3), &if_index())
            .unwrap()
            .unwrap();
        assert_eq!(
            cell,
            IndexCell {
                row_key: "3".to_string(),
                name: "ifIndex".to_string(),
                value: "3".to_string(),
            }
        );

        let cell = extract(
            "1.3.6.1.2.1.2.2.1.2.3",
            &RawValue::OctetString(b"eth0".to_vec()),
            &if_index(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(cell.name, "ifDescr");
        assert_eq!(cell.value, "eth0");
    }

    #[test]
    fn test_extract_metric_cell() {
        let cell = extract("1.3.6.1.2.1.2.2.1.8.3", &RawValue::Integer(1), &if_index()).unwrap();
        assert_eq!(cell, None);
    }

    #[test]
    fn test_first_matching_definition_wins() {
        let index = vec![
            IndexDefinition::new("1.3.6.1.4.1.9.9.1", "outer"),
            IndexDefinition::new("1.3.6.1.4.1.9.9.1.5", "inner"),
        ];
        let cell = extract("1.3.6.1.4.1.9.9.1.5.2", &RawValue::Integer(2), &index)
            .unwrap()
            .unwrap();
        assert_eq!(cell.name, "outer");
        assert_eq!(cell.row_key, "5.2");
    }

    #[test]
    fn test_unreadable_index() {
        let err = extract("1.3.6.1.2.1.2.2.1.1.3", &RawValue::Null, &if_index()).unwrap_err();
        match err {
            CollectError::UnreadableIndex { oid, gap } => {
                assert_eq!(oid, "1.3.6.1.2.1.2.2.1.1.3");
                assert_eq!(gap, ValueGap::Null);
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = extract("1.3.6.1.2.1.2.2.1.1.3", &RawValue::NoSuchInstance, &if_index())
            .unwrap_err();
        assert!(matches!(err, CollectError::UnreadableIndex { .. }));
    }
}
