//! Модуль индексов для bidstore
//!
//! Этот модуль предоставляет две независимые реализации одного контракта:
//! несбалансированное бинарное дерево поиска и хеш-таблицу с цепочками
//! фиксированного размера.

pub mod binary_search_tree;
pub mod chained_hash;
pub mod shared;

pub use binary_search_tree::{BinarySearchTree, InOrderIter};
pub use chained_hash::{bucket_hash, ChainedHashTable, DEFAULT_BUCKET_COUNT};
pub use shared::SharedIndex;

use crate::common::{Bid, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Трейт для всех типов индексов заявок
///
/// Ни одна операция не завершается ошибкой: отсутствие ключа при поиске
/// или удалении является обычным результатом.
pub trait Index {
    /// Вставляет копию заявки в индекс (дубликаты не объединяются)
    fn insert(&mut self, bid: Bid);

    /// Ищет заявку по идентификатору и возвращает её копию
    fn search(&self, bid_id: &str) -> Option<Bid>;

    /// Удаляет первую найденную заявку с данным идентификатором.
    /// Возвращает `false`, если такой заявки нет (индекс не меняется).
    fn delete(&mut self, bid_id: &str) -> bool;

    /// Полный обход индекса в порядке, присущем реализации
    fn scan(&self) -> Box<dyn Iterator<Item = &Bid> + '_>;

    /// Полный обход вместе с номером корзины, в которой лежит заявка.
    /// Для индексов без корзин номер отсутствует.
    fn scan_with_bucket(&self) -> Box<dyn Iterator<Item = (Option<usize>, &Bid)> + '_> {
        Box::new(self.scan().map(|bid| (None, bid)))
    }

    /// Возвращает количество элементов в индексе
    fn size(&self) -> usize;

    /// Удаляет все элементы
    fn clear(&mut self);

    /// Тип индекса
    fn index_type(&self) -> IndexType;

    /// Снимок статистики индекса
    fn statistics(&self) -> IndexStatistics;

    /// Проверяет, пуст ли индекс
    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

/// Статистика индекса
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStatistics {
    /// Общее количество элементов
    pub total_elements: u64,
    /// Количество операций вставки
    pub insert_operations: u64,
    /// Количество операций поиска
    pub search_operations: u64,
    /// Количество операций удаления
    pub delete_operations: u64,
    /// Глубина индекса (высота дерева или длина самой длинной цепочки)
    pub depth: u32,
    /// Коэффициент заполнения
    pub fill_factor: f64,
}

/// Тип индекса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    /// Несбалансированное бинарное дерево поиска
    BinarySearchTree,
    /// Хеш-таблица с цепочками
    Hash,
}

impl std::str::FromStr for IndexType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tree" | "bst" | "binary_search_tree" => Ok(IndexType::BinarySearchTree),
            "hash" | "hash_table" => Ok(IndexType::Hash),
            _ => Err(Error::configuration(format!("Unsupported index type: {}", s))),
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexType::BinarySearchTree => write!(f, "tree"),
            IndexType::Hash => write!(f, "hash"),
        }
    }
}

/// Конфигурация индекса
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Тип индекса
    pub index_type: IndexType,
    /// Количество корзин хеш-таблицы (фиксировано после создания)
    pub bucket_count: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_type: IndexType::BinarySearchTree,
            bucket_count: DEFAULT_BUCKET_COUNT,
        }
    }
}

/// Создает индекс по конфигурации
pub fn create_index(config: &IndexConfig) -> Result<Box<dyn Index + Send>> {
    match config.index_type {
        IndexType::BinarySearchTree => Ok(Box::new(BinarySearchTree::new())),
        IndexType::Hash => Ok(Box::new(ChainedHashTable::with_bucket_count(
            config.bucket_count,
        )?)),
    }
}
