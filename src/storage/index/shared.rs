//! Разделяемый индекс
//!
//! Сами индексы однопоточные. Для использования из нескольких потоков
//! индекс целиком оборачивается в одну блокировку, которая берется на
//! время каждой публичной операции.

use crate::common::Bid;
use crate::storage::index::{Index, IndexStatistics};
use parking_lot::Mutex;
use std::sync::Arc;

/// Клонируемый дескриптор индекса под общей блокировкой
#[derive(Debug)]
pub struct SharedIndex<I> {
    inner: Arc<Mutex<I>>,
}

impl<I> Clone for SharedIndex<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I: Index> SharedIndex<I> {
    /// Оборачивает индекс
    pub fn new(index: I) -> Self {
        Self {
            inner: Arc::new(Mutex::new(index)),
        }
    }

    pub fn insert(&self, bid: Bid) {
        self.inner.lock().insert(bid);
    }

    pub fn search(&self, bid_id: &str) -> Option<Bid> {
        self.inner.lock().search(bid_id)
    }

    pub fn delete(&self, bid_id: &str) -> bool {
        self.inner.lock().delete(bid_id)
    }

    pub fn size(&self) -> usize {
        self.inner.lock().size()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Копия всех заявок в порядке обхода индекса
    pub fn snapshot(&self) -> Vec<Bid> {
        self.inner.lock().scan().cloned().collect()
    }

    pub fn statistics(&self) -> IndexStatistics {
        self.inner.lock().statistics()
    }

    /// Выполняет несколько операций под одной блокировкой
    pub fn with<R>(&self, f: impl FnOnce(&mut I) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
