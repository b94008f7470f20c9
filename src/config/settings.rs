use serde::{Deserialize, Serialize};
use std::env;

/// Базовые настройки приложения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Адрес устройства, `host:port`
    pub target: String,
    pub connection: ConnectionSettings,
    pub auth: AuthSettings,
    /// YAML файлы с определениями наборов метрик и инвентаря
    pub collection_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Таймаут для одного SNMP запроса (секунды)
    pub timeout: u64,
    /// Количество повторов при ошибках и таймаутах
    pub retries: u32,
    /// max-repetitions для GETBULK при обходе таблиц
    pub max_repetitions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    pub v2c: SnmpV2cSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpV2cSettings {
    pub community: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: "127.0.0.1:161".to_string(),
            connection: ConnectionSettings {
                timeout: 10,
                retries: 2,
                max_repetitions: 10,
            },
            auth: AuthSettings {
                v2c: SnmpV2cSettings {
                    community: "public".to_string(),
                },
            },
            collection_files: vec!["./profiles/generic-endpoint.yaml".to_string()],
        }
    }
}

impl Settings {
    /// Значения по умолчанию, переопределенные переменными окружения `SNMP_*`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(target) = lookup("SNMP_TARGET") {
            settings.target = target;
        }
        if let Some(community) = lookup("SNMP_COMMUNITY") {
            settings.auth.v2c.community = community;
        }
        if let Some(timeout) = lookup("SNMP_TIMEOUT").and_then(|s| s.parse().ok()) {
            settings.connection.timeout = timeout;
        }
        if let Some(retries) = lookup("SNMP_RETRIES").and_then(|s| s.parse().ok()) {
            settings.connection.retries = retries;
        }
        if let Some(reps) = lookup("SNMP_MAX_REPETITIONS").and_then(|s| s.parse().ok()) {
            settings.connection.max_repetitions = reps;
        }
        if let Some(files) = lookup("SNMP_COLLECTION_FILES") {
            let files: Vec<String> = files
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect();
            if !files.is_empty() {
                settings.collection_files = files;
            }
        }

        settings
    }

    /// Хост из target, используется как имя entity
    pub fn target_host(&self) -> &str {
        match self.target.rsplit_once(':') {
            Some((host, port)) if port.parse::<u16>().is_ok() => host,
            _ => &self.target,
        }
    }
}
