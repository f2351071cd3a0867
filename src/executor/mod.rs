//! Операции над загруженными заявками вне индексов

pub mod sort;

pub use sort::{quick_sort, selection_sort, sort_bids, SortAlgorithm};
