use anyhow::{Context, Result};

pub mod collection;
pub mod settings;

pub use collection::{
    CollectionDefinitions, ConfigError, IndexDefinition, InventoryItemDefinition,
    MetricDefinition, MetricSetDefinition, MetricSetKind,
};
pub use settings::{ConnectionSettings, Settings};

/// Главная конфигурация приложения
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: Settings,
    pub collection: CollectionDefinitions,
}

impl AppConfig {
    /// Загружает настройки из окружения, затем указанные в них файлы сбора
    pub fn load() -> Result<Self> {
        let settings = Settings::from_env();
        let collection = CollectionDefinitions::load(settings.collection_files.as_slice())
            .context("Не удалось загрузить определения сбора")?;

        Ok(Self {
            settings,
            collection,
        })
    }

    pub fn get_target(&self) -> &str {
        &self.settings.target
    }

    pub fn get_community(&self) -> Vec<u8> {
        self.settings.auth.v2c.community.clone().into_bytes()
    }

    pub fn log_summary(&self) {
        let tables = self
            .collection
            .metric_sets
            .iter()
            .filter(|ms| matches!(ms.kind, MetricSetKind::Table { .. }))
            .count();

        tracing::info!(
            target_addr = %self.get_target(),
            timeout_secs = self.settings.connection.timeout,
            metric_sets = self.collection.metric_sets.len(),
            tables,
            inventory_items = self.collection.inventory.len(),
            "конфигурация загружена"
        );
    }
}
