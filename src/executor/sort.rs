//! Сортировка заявок по названию
//!
//! Две классические сортировки на месте над срезом заявок: сортировка
//! выбором и быстрая сортировка (разбиение Ломуто, опорный элемент последний).

use crate::common::{Bid, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Алгоритм сортировки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortAlgorithm {
    /// Сортировка выбором, O(n^2)
    Selection,
    /// Быстрая сортировка, O(n log n) в среднем, O(n^2) в худшем случае
    Quick,
}

impl std::str::FromStr for SortAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "selection" => Ok(SortAlgorithm::Selection),
            "quick" | "quicksort" => Ok(SortAlgorithm::Quick),
            _ => Err(Error::validation(format!("Unsupported sort algorithm: {}", s))),
        }
    }
}

impl fmt::Display for SortAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortAlgorithm::Selection => write!(f, "selection"),
            SortAlgorithm::Quick => write!(f, "quick"),
        }
    }
}

/// Сортирует заявки по названию выбранным алгоритмом
pub fn sort_bids(algorithm: SortAlgorithm, bids: &mut [Bid]) {
    log::debug!("Сортировка {} заявок: {}", bids.len(), algorithm);
    match algorithm {
        SortAlgorithm::Selection => selection_sort(bids),
        SortAlgorithm::Quick => quick_sort(bids),
    }
}

/// Сортировка выбором. Обмен выполняется только при найденном строго
/// меньшем названии.
pub fn selection_sort(bids: &mut [Bid]) {
    for i in 0..bids.len() {
        let mut min_index = i;
        for j in (i + 1)..bids.len() {
            if bids[j].title < bids[min_index].title {
                min_index = j;
            }
        }
        if min_index != i {
            bids.swap(i, min_index);
        }
    }
}

/// Быстрая сортировка
pub fn quick_sort(bids: &mut [Bid]) {
    // Рекурсия только по меньшей части: глубина стека O(log n)
    let mut rest = bids;
    while rest.len() > 1 {
        let pivot = partition(rest);
        let (left, right) = std::mem::take(&mut rest).split_at_mut(pivot);
        let right = &mut right[1..];
        if left.len() < right.len() {
            quick_sort(left);
            rest = right;
        } else {
            quick_sort(right);
            rest = left;
        }
    }
}

/// Разбиение Ломуто: опорный элемент последний, элементы `<=` уходят влево.
/// Возвращает итоговую позицию опорного элемента.
fn partition(bids: &mut [Bid]) -> usize {
    let end = bids.len() - 1;
    let mut store = 0;
    for j in 0..end {
        if bids[j].title <= bids[end].title {
            bids.swap(store, j);
            store += 1;
        }
    }
    bids.swap(store, end);
    store
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bids(titles: &[&str]) -> Vec<Bid> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| Bid::new(i.to_string(), *title, "fund", i as f64))
            .collect()
    }

    fn titles(bids: &[Bid]) -> Vec<&str> {
        bids.iter().map(|bid| bid.title.as_str()).collect()
    }

    #[test]
    fn test_selection_sort() {
        let mut data = bids(&["pear", "apple", "fig", "apple", "banana"]);
        selection_sort(&mut data);
        assert_eq!(titles(&data), vec!["apple", "apple", "banana", "fig", "pear"]);
        // Сортировка выбором без лишних обменов оставляет равные на месте
        assert_eq!(data[0].bid_id, "1");
        assert_eq!(data[1].bid_id, "3");
    }

    #[test]
    fn test_quick_sort() {
        let mut data = bids(&["pear", "apple", "fig", "apple", "banana", "cherry", "date"]);
        quick_sort(&mut data);
        assert_eq!(
            titles(&data),
            vec!["apple", "apple", "banana", "cherry", "date", "fig", "pear"]
        );
    }

    #[test]
    fn test_sorts_handle_trivial_inputs() {
        let mut empty: Vec<Bid> = Vec::new();
        quick_sort(&mut empty);
        selection_sort(&mut empty);

        let mut single = bids(&["only"]);
        quick_sort(&mut single);
        assert_eq!(titles(&single), vec!["only"]);
    }

    #[test]
    fn test_quick_sort_sorted_input() {
        let names: Vec<String> = (0..3_000).map(|i| format!("{:05}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut data = bids(&refs);
        quick_sort(&mut data);
        assert!(data.windows(2).all(|pair| pair[0].title <= pair[1].title));
    }

    #[test]
    fn test_sort_algorithm_parsing() {
        assert_eq!("quick".parse::<SortAlgorithm>().unwrap(), SortAlgorithm::Quick);
        assert_eq!("Selection".parse::<SortAlgorithm>().unwrap(), SortAlgorithm::Selection);
        assert!("bubble".parse::<SortAlgorithm>().is_err());

        let mut data = bids(&["b", "a"]);
        sort_bids(SortAlgorithm::Quick, &mut data);
        assert_eq!(titles(&data), vec!["a", "b"]);
    }
}
