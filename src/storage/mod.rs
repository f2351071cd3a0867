//! Хранилище заявок bidstore

pub mod index;
pub mod loader;

#[cfg(test)]
pub mod tests;

pub use index::{create_index, Index, IndexConfig, IndexStatistics, IndexType};
pub use loader::{BidCsvReader, CsvLayout, LoadReport};
