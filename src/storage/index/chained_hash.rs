//! Хеш-таблица с цепочками для bidstore
//!
//! Фиксированное число корзин, каждая корзина хранит односвязную цепочку
//! узлов в порядке вставки. Размер таблицы не меняется после создания.

use crate::common::{Bid, Error, Result};
use crate::storage::index::{Index, IndexStatistics, IndexType};
use std::cell::Cell;

/// Количество корзин по умолчанию
pub const DEFAULT_BUCKET_COUNT: usize = 179;

/// Множитель полиномиального хеша
const HASH_MULTIPLIER: u32 = 31;

/// Вычисляет номер корзины для идентификатора.
///
/// `h = h * 31 + c` слева направо с переполнением по модулю 2^32, затем
/// `h % bucket_count`. Код символа берется как знаковый байт UTF-8,
/// расширенный до 32 бит, что совпадает с уже сохраненными распределениями.
pub fn bucket_hash(bid_id: &str, bucket_count: usize) -> usize {
    let hash = bid_id.bytes().fold(0u32, |acc, byte| {
        acc.wrapping_mul(HASH_MULTIPLIER)
            .wrapping_add(byte as i8 as u32)
    });
    (hash as usize) % bucket_count
}

/// Элемент цепочки
#[derive(Debug)]
struct ChainEntry {
    bid: Bid,
    /// Закешированный номер корзины
    key: usize,
    next: Option<Box<ChainEntry>>,
}

type Chain = Option<Box<ChainEntry>>;

/// Хеш-таблица с разрешением коллизий методом цепочек
#[derive(Debug)]
pub struct ChainedHashTable {
    /// Головы цепочек, по одной на корзину
    buckets: Vec<Chain>,
    /// Количество элементов
    size: usize,
    /// Счетчики изменяющих операций
    statistics: IndexStatistics,
    /// Счетчик поиска (поиск выполняется по `&self`)
    search_operations: Cell<u64>,
}

impl ChainedHashTable {
    /// Создает таблицу с количеством корзин по умолчанию
    pub fn new() -> Self {
        Self::build(DEFAULT_BUCKET_COUNT)
    }

    /// Создает таблицу с заданным количеством корзин
    pub fn with_bucket_count(bucket_count: usize) -> Result<Self> {
        if bucket_count == 0 {
            return Err(Error::configuration("bucket count must be greater than 0"));
        }
        Ok(Self::build(bucket_count))
    }

    fn build(bucket_count: usize) -> Self {
        let mut buckets = Vec::with_capacity(bucket_count);
        buckets.resize_with(bucket_count, || None);
        Self {
            buckets,
            size: 0,
            statistics: IndexStatistics::default(),
            search_operations: Cell::new(0),
        }
    }

    /// Количество корзин
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Номер корзины для идентификатора
    pub fn bucket_of(&self, bid_id: &str) -> usize {
        bucket_hash(bid_id, self.buckets.len())
    }

    /// Добавляет заявку в конец цепочки её корзины
    pub fn insert(&mut self, bid: Bid) {
        self.statistics.insert_operations += 1;
        let key = self.bucket_of(&bid.bid_id);
        log::trace!("hash insert {} into bucket {}", bid.bid_id, key);

        let mut slot = &mut self.buckets[key];
        while let Some(entry) = slot {
            slot = &mut entry.next;
        }
        *slot = Some(Box::new(ChainEntry {
            bid,
            key,
            next: None,
        }));
        self.size += 1;
    }

    /// Возвращает ссылку на первую заявку цепочки с данным идентификатором
    pub fn get(&self, bid_id: &str) -> Option<&Bid> {
        let mut current = self.buckets[self.bucket_of(bid_id)].as_deref();
        while let Some(entry) = current {
            if entry.bid.bid_id == bid_id {
                return Some(&entry.bid);
            }
            current = entry.next.as_deref();
        }
        None
    }

    /// Ищет заявку и возвращает её копию
    pub fn search(&self, bid_id: &str) -> Option<Bid> {
        self.search_operations.set(self.search_operations.get() + 1);
        let found = self.get(bid_id).cloned();
        if found.is_none() {
            log::debug!("hash search miss {}", bid_id);
        }
        found
    }

    /// Удаляет первую заявку с данным идентификатором, перенаправляя
    /// ссылку предыдущего узла (или голову корзины) на следующий узел
    pub fn delete(&mut self, bid_id: &str) -> bool {
        self.statistics.delete_operations += 1;
        let key = self.bucket_of(bid_id);

        let mut slot = &mut self.buckets[key];
        loop {
            let matches = match slot.as_deref() {
                None => {
                    log::debug!("hash delete miss {}", bid_id);
                    return false;
                }
                Some(entry) => entry.bid.bid_id == bid_id,
            };
            if matches {
                break;
            }
            let Some(entry) = slot else {
                return false;
            };
            slot = &mut entry.next;
        }

        if let Some(mut removed) = slot.take() {
            *slot = removed.next.take();
            log::trace!("hash delete {} from bucket {}", bid_id, key);
        }
        self.size -= 1;
        true
    }

    /// Длина цепочки корзины (0 для номера вне диапазона)
    pub fn chain_len(&self, bucket: usize) -> usize {
        self.buckets
            .get(bucket)
            .map_or(0, |head| ChainIter::new(head.as_deref()).count())
    }

    /// Обход всех заявок: корзины по возрастанию номера, внутри корзины
    /// от головы к хвосту. Порядок не отсортирован по ключу.
    pub fn iter(&self) -> impl Iterator<Item = &Bid> + '_ {
        self.iter_with_bucket().map(|(_, bid)| bid)
    }

    /// Обход всех заявок вместе с номером корзины, в которой они лежат
    pub fn iter_with_bucket(&self) -> impl Iterator<Item = (usize, &Bid)> + '_ {
        self.buckets.iter().enumerate().flat_map(|(bucket, head)| {
            ChainIter::new(head.as_deref()).map(move |bid| (bucket, bid))
        })
    }

    /// Количество элементов
    pub fn len(&self) -> usize {
        self.size
    }

    /// Проверяет, пуста ли таблица
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Освобождает все узлы всех корзин
    pub fn clear(&mut self) {
        for head in self.buckets.iter_mut() {
            let mut current = head.take();
            while let Some(mut entry) = current {
                current = entry.next.take();
            }
        }
        self.size = 0;
    }

    /// Проверяет, что каждый узел лежит в корзине `hash(id) % bucket_count`
    /// и что закешированный номер корзины совпадает с ней
    pub fn validate_structure(&self) -> Result<()> {
        let mut visited = 0usize;
        for (bucket, head) in self.buckets.iter().enumerate() {
            let mut current = head.as_deref();
            while let Some(entry) = current {
                visited += 1;
                let expected = self.bucket_of(&entry.bid.bid_id);
                if expected != bucket || entry.key != bucket {
                    return Err(Error::internal(format!(
                        "bid {} stored in bucket {} (cached {}), expected {}",
                        entry.bid.bid_id, bucket, entry.key, expected
                    )));
                }
                current = entry.next.as_deref();
            }
        }
        if visited != self.size {
            return Err(Error::internal(format!(
                "table holds {} entries but counts {}",
                visited, self.size
            )));
        }
        Ok(())
    }

    /// Снимок статистики таблицы
    pub fn statistics(&self) -> IndexStatistics {
        let occupied = self.buckets.iter().filter(|head| head.is_some()).count();
        let longest = (0..self.buckets.len())
            .map(|bucket| self.chain_len(bucket))
            .max()
            .unwrap_or(0);
        IndexStatistics {
            total_elements: self.size as u64,
            search_operations: self.search_operations.get(),
            depth: longest as u32,
            fill_factor: occupied as f64 / self.buckets.len() as f64,
            ..self.statistics.clone()
        }
    }
}

impl Default for ChainedHashTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChainedHashTable {
    fn drop(&mut self) {
        self.clear();
    }
}

impl Index for ChainedHashTable {
    fn insert(&mut self, bid: Bid) {
        ChainedHashTable::insert(self, bid)
    }

    fn search(&self, bid_id: &str) -> Option<Bid> {
        ChainedHashTable::search(self, bid_id)
    }

    fn delete(&mut self, bid_id: &str) -> bool {
        ChainedHashTable::delete(self, bid_id)
    }

    fn scan(&self) -> Box<dyn Iterator<Item = &Bid> + '_> {
        Box::new(self.iter())
    }

    fn scan_with_bucket(&self) -> Box<dyn Iterator<Item = (Option<usize>, &Bid)> + '_> {
        Box::new(
            self.iter_with_bucket()
                .map(|(bucket, bid)| (Some(bucket), bid)),
        )
    }

    fn size(&self) -> usize {
        self.size
    }

    fn clear(&mut self) {
        ChainedHashTable::clear(self)
    }

    fn index_type(&self) -> IndexType {
        IndexType::Hash
    }

    fn statistics(&self) -> IndexStatistics {
        ChainedHashTable::statistics(self)
    }
}

impl Extend<Bid> for ChainedHashTable {
    fn extend<I: IntoIterator<Item = Bid>>(&mut self, iter: I) {
        for bid in iter {
            self.insert(bid);
        }
    }
}

/// Обход одной цепочки от головы к хвосту
struct ChainIter<'a> {
    current: Option<&'a ChainEntry>,
}

impl<'a> ChainIter<'a> {
    fn new(head: Option<&'a ChainEntry>) -> Self {
        Self { current: head }
    }
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a Bid;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.current?;
        self.current = entry.next.as_deref();
        Some(&entry.bid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(id: &str) -> Bid {
        Bid::new(id, format!("title {}", id), "General Fund", 10.0)
    }

    fn ids<'a>(bids: impl Iterator<Item = &'a Bid>) -> Vec<String> {
        bids.map(|bid| bid.bid_id.clone()).collect()
    }

    #[test]
    fn test_hash_function() {
        assert_eq!(bucket_hash("", 179), 0);
        assert_eq!(bucket_hash("A", 4), 65 % 4);
        // 31 * 65 + 66 = 2081
        assert_eq!(bucket_hash("AB", 179), 2081 % 179);
        assert_eq!(bucket_hash("98223", DEFAULT_BUCKET_COUNT), {
            let mut h: u32 = 0;
            for c in "98223".bytes() {
                h = h.wrapping_mul(31).wrapping_add(c as u32);
            }
            h as usize % 179
        });
    }

    #[test]
    fn test_hash_function_wraps_around() {
        let long_id = "z".repeat(64);
        let mut expected: u64 = 0;
        for c in long_id.bytes() {
            expected = (expected * 31 + c as u64) % (1u64 << 32);
        }
        assert_eq!(bucket_hash(&long_id, 179), (expected % 179) as usize);
    }

    #[test]
    fn test_hash_function_non_ascii_bytes_are_signed() {
        // 'é' = 0xC3 0xA9 в UTF-8, байты расширяются со знаком
        let expected = (0u32.wrapping_add(0xC3u8 as i8 as u32))
            .wrapping_mul(31)
            .wrapping_add(0xA9u8 as i8 as u32);
        assert_eq!(bucket_hash("é", 1000), expected as usize % 1000);
    }

    #[test]
    fn test_hash_table_creation() {
        let table = ChainedHashTable::new();
        assert_eq!(table.bucket_count(), DEFAULT_BUCKET_COUNT);
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);

        assert!(ChainedHashTable::with_bucket_count(0).is_err());
        assert_eq!(ChainedHashTable::with_bucket_count(1).unwrap().bucket_count(), 1);
    }

    #[test]
    fn test_hash_table_collisions_chain_in_insertion_order() {
        let mut table = ChainedHashTable::with_bucket_count(4).unwrap();
        for id in ["A", "E", "I"] {
            table.insert(bid(id));
        }

        // 65, 69 и 73 дают остаток 1
        for id in ["A", "E", "I"] {
            assert_eq!(table.bucket_of(id), 1);
        }
        assert_eq!(table.chain_len(1), 3);
        assert_eq!(table.chain_len(0), 0);
        assert_eq!(table.chain_len(99), 0);
        assert_eq!(ids(table.iter()), vec!["A", "E", "I"]);
        table.validate_structure().unwrap();
    }

    #[test]
    fn test_hash_table_emits_in_bucket_order() {
        let mut table = ChainedHashTable::with_bucket_count(4).unwrap();
        // 'D' = 68 -> 0, 'C' = 67 -> 3, 'B' = 66 -> 2, 'A' = 65 -> 1
        for id in ["C", "A", "D", "B"] {
            table.insert(bid(id));
        }
        let visited: Vec<(usize, String)> = table
            .iter_with_bucket()
            .map(|(bucket, bid)| (bucket, bid.bid_id.clone()))
            .collect();
        assert_eq!(
            visited,
            vec![
                (0, "D".to_string()),
                (1, "A".to_string()),
                (2, "B".to_string()),
                (3, "C".to_string()),
            ]
        );
    }

    #[test]
    fn test_scan_with_bucket_reports_storage_bucket() {
        let mut table = ChainedHashTable::with_bucket_count(4).unwrap();
        for id in ["C", "A", "E"] {
            table.insert(bid(id));
        }
        let index: &dyn Index = &table;
        let visited: Vec<(Option<usize>, &str)> = index
            .scan_with_bucket()
            .map(|(bucket, bid)| (bucket, bid.bid_id.as_str()))
            .collect();
        assert_eq!(visited, vec![(Some(1), "A"), (Some(1), "E"), (Some(3), "C")]);
    }

    #[test]
    fn test_hash_table_delete_head_middle_tail() {
        let mut table = ChainedHashTable::with_bucket_count(4).unwrap();
        for id in ["A", "E", "I", "M"] {
            table.insert(bid(id));
        }

        assert!(table.delete("E"));
        assert_eq!(ids(table.iter()), vec!["A", "I", "M"]);
        assert!(table.delete("A"));
        assert_eq!(ids(table.iter()), vec!["I", "M"]);
        assert!(table.delete("M"));
        assert_eq!(ids(table.iter()), vec!["I"]);
        assert!(!table.delete("M"));
        assert_eq!(table.len(), 1);
        table.validate_structure().unwrap();
    }

    #[test]
    fn test_hash_table_duplicates_first_match() {
        let mut table = ChainedHashTable::new();
        table.insert(Bid::new("7", "first", "f", 1.0));
        table.insert(Bid::new("7", "second", "f", 2.0));
        assert_eq!(table.len(), 2);
        assert_eq!(table.search("7").unwrap().title, "first");

        assert!(table.delete("7"));
        assert_eq!(table.search("7").unwrap().title, "second");
        assert!(table.delete("7"));
        assert!(table.search("7").is_none());
    }

    #[test]
    fn test_hash_table_clear() {
        let mut table: ChainedHashTable = ChainedHashTable::with_bucket_count(8).unwrap();
        table.extend((0..100).map(|i| bid(&i.to_string())));
        assert_eq!(table.len(), 100);
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
        assert_eq!(table.bucket_count(), 8);
    }

    #[test]
    fn test_hash_table_statistics() {
        let mut table = ChainedHashTable::with_bucket_count(4).unwrap();
        for id in ["A", "E", "I", "B"] {
            table.insert(bid(id));
        }
        table.search("A");
        table.search("Z");
        table.delete("B");

        let stats = table.statistics();
        assert_eq!(stats.total_elements, 3);
        assert_eq!(stats.insert_operations, 4);
        assert_eq!(stats.search_operations, 2);
        assert_eq!(stats.delete_operations, 1);
        assert_eq!(stats.depth, 3);
        assert!((stats.fill_factor - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_hash_table_validate_detects_misplaced_entry() {
        let mut table = ChainedHashTable::with_bucket_count(4).unwrap();
        table.insert(bid("A"));
        let entry = table.buckets[1].take();
        table.buckets[2] = entry;
        assert!(matches!(
            table.validate_structure(),
            Err(Error::Internal { .. })
        ));
    }
}
