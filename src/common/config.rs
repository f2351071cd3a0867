//! Конфигурация для bidstore
//!
//! Источники в порядке возрастания приоритета: значения по умолчанию,
//! TOML файл, переменные окружения `BIDSTORE_*`, аргументы командной строки.
//! Каждый следующий источник применяется поверх предыдущего.

use crate::common::{Error, Result};
use crate::storage::index::IndexConfig;
use crate::storage::loader::CsvLayout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Идентификатор заявки, который ищется по умолчанию
pub const DEFAULT_BID_KEY: &str = "98223";

/// Путь к выгрузке по умолчанию
pub const DEFAULT_CSV_PATH: &str = "eBid_Monthly_Sales.csv";

/// Уровень логирования по умолчанию
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Основная конфигурация приложения
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BidStoreConfig {
    /// Конфигурация индекса
    pub index: IndexConfig,
    /// Путь к CSV-выгрузке
    pub csv_path: PathBuf,
    /// Расположение столбцов в выгрузке
    pub csv: CsvLayout,
    /// Ключ для поиска по умолчанию
    pub default_bid_key: String,
    /// Уровень логирования
    pub log_level: String,
}

impl Default for BidStoreConfig {
    fn default() -> Self {
        Self {
            index: IndexConfig::default(),
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            csv: CsvLayout::default(),
            default_bid_key: DEFAULT_BID_KEY.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl BidStoreConfig {
    /// Загружает конфигурацию из TOML файла
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Разбирает конфигурацию из TOML строки
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| Error::configuration(err.to_string()))
    }

    /// Сохраняет конфигурацию в TOML файл
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|err| Error::configuration(err.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Применяет переменные окружения `BIDSTORE_*` поверх текущих значений
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Применяет переменные из произвольного источника. Заданная переменная
    /// всегда заменяет текущее значение, даже если совпадает со значением
    /// по умолчанию.
    pub fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(index_type) = var("BIDSTORE_INDEX") {
            self.index.index_type = index_type.parse()?;
        }

        if let Some(buckets) = var("BIDSTORE_BUCKETS") {
            self.index.bucket_count = buckets.parse().map_err(|_| {
                Error::configuration(format!("BIDSTORE_BUCKETS is not a number: {}", buckets))
            })?;
        }

        if let Some(csv_path) = var("BIDSTORE_CSV_PATH") {
            self.csv_path = PathBuf::from(csv_path);
        }

        if let Some(bid_key) = var("BIDSTORE_BID_KEY") {
            self.default_bid_key = bid_key;
        }

        if let Some(log_level) = var("BIDSTORE_LOG_LEVEL") {
            self.log_level = log_level;
        }

        Ok(())
    }

    /// Валидирует конфигурацию
    pub fn validate(&self) -> Result<()> {
        if self.index.bucket_count == 0 {
            return Err(Error::configuration("bucket count must be greater than 0"));
        }

        if self.default_bid_key.trim().is_empty() {
            return Err(Error::configuration("default bid key cannot be empty"));
        }

        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(Error::configuration(format!(
                "unknown log level: {}",
                self.log_level
            )));
        }

        self.csv.validate()
    }
}
