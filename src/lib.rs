//! bidstore - хранилища заявок в памяти
//!
//! Два независимых индекса с общим контрактом: несбалансированное бинарное
//! дерево поиска (обход по возрастанию идентификатора) и хеш-таблица с
//! цепочками фиксированного размера (обход по корзинам). Вокруг них:
//! загрузка CSV-выгрузки, сортировки по названию и интерактивное меню.

pub mod cli;
pub mod common;
pub mod executor;
pub mod storage;

pub use common::error::{Error, Result};
pub use common::types::*;
pub use storage::index::{
    create_index, BinarySearchTree, ChainedHashTable, Index, IndexConfig, IndexStatistics,
    IndexType, SharedIndex,
};

/// Версия библиотеки
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
