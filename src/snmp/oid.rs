use anyhow::{Context, Result};
use snmp2::Oid;

/// Разбирает OID в список чисел, с точкой в начале или без.
/// Пустые компоненты (`1.3..6`, `1.3.6.`) пропускаются.
pub fn oid_arcs(s: &str) -> Result<Vec<u64>> {
    let parts: Result<Vec<u64>, _> = s
        .trim()
        .split('.')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u64>())
        .collect();

    let parts = parts.context(format!("Невалидный OID: {}", s))?;
    if parts.is_empty() {
        anyhow::bail!("Пустой OID");
    }
    Ok(parts)
}

pub fn parse_oid(s: &str) -> Result<Oid<'static>> {
    let parts = oid_arcs(s)?;
    Oid::from(&parts).map_err(|e| anyhow::anyhow!("Не удалось создать Oid из '{}': {:?}", s, e))
}

/// Собирает OID обратно из чисел в форме `.1.3.6.1`
pub fn format_arcs(arcs: &[u64]) -> String {
    arcs.iter().map(|arc| format!(".{}", arc)).collect()
}

/// Каноническая форма OID: точка в начале, без пустых компонентов.
///
/// Через нее проходят и определения сбора, и ответы транспорта, поэтому
/// точное сравнение строк между ними работает.
pub fn canonical_oid(s: &str) -> Result<String> {
    oid_arcs(s).map(|arcs| format_arcs(&arcs))
}

/// Обрезает пробелы и добавляет точку в начале, без проверки компонентов
pub fn normalize_oid(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('.') || trimmed.is_empty() {
        trimmed.to_string()
    } else {
        format!(".{}", trimmed)
    }
}

/// Форматирует OID протокола в форме с точкой в начале
pub fn format_oid(oid: &Oid<'_>) -> String {
    normalize_oid(&oid.to_string())
}
