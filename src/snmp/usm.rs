/// Счетчики статистики USM (RFC 3414), которые агент возвращает вместо
/// запрошенных OID при ошибке аутентификации или шифрования SNMPv3
const USM_STATS: &[(&str, &str)] = &[
    ("1.3.6.1.6.3.15.1.1.3.0", "oidUsmStatsUnknownUserNames"),
    ("1.3.6.1.6.3.15.1.1.4.0", "oidUsmStatsUnknownEngineIDs"),
    ("1.3.6.1.6.3.15.1.1.5.0", "oidUsmStatsWrongDigests"),
    ("1.3.6.1.6.3.15.1.1.6.0", "oidUsmStatsDecryptionErrors"),
];

/// Имя диагностического счетчика для `oid`, если это он
pub fn known_protocol_error(oid: &str) -> Option<&'static str> {
    let oid = oid.trim().trim_start_matches('.');
    USM_STATS
        .iter()
        .find(|(known, _)| *known == oid)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_with_and_without_leading_dot() {
        assert_eq!(
            known_protocol_error(".1.3.6.1.6.3.15.1.1.3.0"),
            Some("oidUsmStatsUnknownUserNames")
        );
        assert_eq!(
            known_protocol_error("1.3.6.1.6.3.15.1.1.6.0"),
            Some("oidUsmStatsDecryptionErrors")
        );
        assert_eq!(known_protocol_error(".1.3.6.1.2.1.1.3.0"), None);
    }
}
