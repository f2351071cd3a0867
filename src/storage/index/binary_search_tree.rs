//! Бинарное дерево поиска для bidstore
//!
//! Несбалансированное дерево заявок, упорядоченных по идентификатору.
//! Ключ строго меньше текущего уходит влево, все остальные (включая равные)
//! вправо, поэтому дубликаты допускаются и не объединяются.
//!
//! Каждый узел владеет своими потомками. Все изменения выполняются над
//! ссылкой, через которую мы спустились к узлу, без обратных указателей.
//! Обход, вычисление высоты, проверка и разрушение дерева итеративны:
//! вырожденное дерево (вставка отсортированных ключей) не переполняет стек.

use crate::common::{Bid, Error, Result};
use crate::storage::index::{Index, IndexStatistics, IndexType};
use std::cell::Cell;
use std::cmp::Ordering;

type Link = Option<Box<TreeNode>>;

/// Узел дерева
#[derive(Debug)]
struct TreeNode {
    bid: Bid,
    left: Link,
    right: Link,
}

impl TreeNode {
    fn new(bid: Bid) -> Self {
        Self {
            bid,
            left: None,
            right: None,
        }
    }
}

/// Несбалансированное бинарное дерево поиска
#[derive(Debug, Default)]
pub struct BinarySearchTree {
    /// Корневой узел
    root: Link,
    /// Количество узлов
    len: usize,
    /// Счетчики изменяющих операций
    statistics: IndexStatistics,
    /// Счетчик поиска (поиск выполняется по `&self`)
    search_operations: Cell<u64>,
}

impl BinarySearchTree {
    /// Создает пустое дерево
    pub fn new() -> Self {
        Self::default()
    }

    /// Вставляет заявку. Время O(h), балансировка не выполняется.
    pub fn insert(&mut self, bid: Bid) {
        self.statistics.insert_operations += 1;
        log::trace!("bst insert {}", bid.bid_id);

        let mut link = &mut self.root;
        while let Some(node) = link {
            link = if bid.bid_id < node.bid.bid_id {
                &mut node.left
            } else {
                &mut node.right
            };
        }
        *link = Some(Box::new(TreeNode::new(bid)));
        self.len += 1;
    }

    /// Возвращает ссылку на первую заявку с данным идентификатором
    pub fn get(&self, bid_id: &str) -> Option<&Bid> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match bid_id.cmp(node.bid.bid_id.as_str()) {
                Ordering::Equal => return Some(&node.bid),
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
            };
        }
        None
    }

    /// Ищет заявку и возвращает её копию
    pub fn search(&self, bid_id: &str) -> Option<Bid> {
        self.search_operations.set(self.search_operations.get() + 1);
        let found = self.get(bid_id).cloned();
        if found.is_none() {
            log::debug!("bst search miss {}", bid_id);
        }
        found
    }

    /// Удаляет узел с данным идентификатором и восстанавливает структуру.
    /// Отсутствующий ключ не является ошибкой: возвращается `false`.
    pub fn delete(&mut self, bid_id: &str) -> bool {
        self.statistics.delete_operations += 1;

        let mut link = &mut self.root;
        loop {
            let ordering = match link.as_deref() {
                None => {
                    log::debug!("bst delete miss {}", bid_id);
                    return false;
                }
                Some(node) => bid_id.cmp(node.bid.bid_id.as_str()),
            };
            if ordering == Ordering::Equal {
                break;
            }
            let Some(node) = link else {
                return false;
            };
            link = if ordering == Ordering::Less {
                &mut node.left
            } else {
                &mut node.right
            };
        }

        log::trace!("bst delete {}", bid_id);
        Self::unlink(link);
        self.len -= 1;
        true
    }

    /// Удаляет узел, на который указывает `link`.
    ///
    /// Без потомков ссылка становится пустой, с одним потомком заменяется
    /// им. С двумя потомками узел остается на месте, а его запись заменяется
    /// записью преемника (самого левого узла правого поддерева), который
    /// затем отсоединяется.
    fn unlink(link: &mut Link) {
        let Some(mut node) = link.take() else {
            return;
        };
        *link = match (node.left.take(), node.right.take()) {
            (None, None) => None,
            (Some(child), None) | (None, Some(child)) => Some(child),
            (Some(left), Some(right)) => {
                node.left = Some(left);
                node.right = Some(right);
                if let Some(successor) = Self::detach_min(&mut node.right) {
                    node.bid = successor;
                }
                Some(node)
            }
        };
    }

    /// Отсоединяет самый левый узел поддерева и возвращает его запись.
    /// У такого узла нет левого потомка, поэтому его место занимает правый.
    fn detach_min(mut link: &mut Link) -> Option<Bid> {
        while link.as_ref()?.left.is_some() {
            link = &mut link.as_mut()?.left;
        }
        let mut node = link.take()?;
        *link = node.right.take();
        Some(node.bid)
    }

    /// Ленивый обход в порядке возрастания идентификаторов
    pub fn iter(&self) -> InOrderIter<'_> {
        InOrderIter::new(self.root.as_deref())
    }

    /// Количество узлов
    pub fn len(&self) -> usize {
        self.len
    }

    /// Проверяет, пусто ли дерево
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Разрушает дерево, многократно удаляя корень
    pub fn clear(&mut self) {
        while self.root.is_some() {
            Self::unlink(&mut self.root);
            self.len -= 1;
        }
    }

    /// Вычисляет высоту дерева (0 для пустого)
    pub fn height(&self) -> u32 {
        let mut max_depth = 0;
        let mut stack: Vec<(&TreeNode, u32)> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, 1));
        }
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for child in [node.left.as_deref(), node.right.as_deref()].into_iter().flatten() {
                stack.push((child, depth + 1));
            }
        }
        max_depth
    }

    /// Проверяет инвариант упорядоченности для каждого узла:
    /// левое поддерево строго меньше, правое больше или равно.
    pub fn validate_structure(&self) -> Result<()> {
        let mut visited = 0usize;
        let mut stack: Vec<(&TreeNode, Option<&str>, Option<&str>)> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, None, None));
        }

        while let Some((node, lower, upper)) = stack.pop() {
            visited += 1;
            let key = node.bid.bid_id.as_str();
            if lower.is_some_and(|lower| key < lower) {
                return Err(Error::internal(format!(
                    "key {} is less than its right-subtree bound",
                    key
                )));
            }
            if upper.is_some_and(|upper| key >= upper) {
                return Err(Error::internal(format!(
                    "key {} is not less than its left-subtree bound",
                    key
                )));
            }
            if let Some(left) = node.left.as_deref() {
                stack.push((left, lower, Some(key)));
            }
            if let Some(right) = node.right.as_deref() {
                stack.push((right, Some(key), upper));
            }
        }

        if visited != self.len {
            return Err(Error::internal(format!(
                "tree holds {} nodes but counts {}",
                visited, self.len
            )));
        }
        Ok(())
    }

    /// Снимок статистики дерева
    pub fn statistics(&self) -> IndexStatistics {
        let depth = self.height();
        let capacity = 2f64.powi(depth as i32) - 1.0;
        IndexStatistics {
            total_elements: self.len as u64,
            search_operations: self.search_operations.get(),
            depth,
            fill_factor: if capacity > 0.0 {
                self.len as f64 / capacity
            } else {
                0.0
            },
            ..self.statistics.clone()
        }
    }
}

impl Drop for BinarySearchTree {
    fn drop(&mut self) {
        self.clear();
    }
}

impl Index for BinarySearchTree {
    fn insert(&mut self, bid: Bid) {
        BinarySearchTree::insert(self, bid)
    }

    fn search(&self, bid_id: &str) -> Option<Bid> {
        BinarySearchTree::search(self, bid_id)
    }

    fn delete(&mut self, bid_id: &str) -> bool {
        BinarySearchTree::delete(self, bid_id)
    }

    fn scan(&self) -> Box<dyn Iterator<Item = &Bid> + '_> {
        Box::new(self.iter())
    }

    fn size(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        BinarySearchTree::clear(self)
    }

    fn index_type(&self) -> IndexType {
        IndexType::BinarySearchTree
    }

    fn statistics(&self) -> IndexStatistics {
        BinarySearchTree::statistics(self)
    }
}

impl Extend<Bid> for BinarySearchTree {
    fn extend<I: IntoIterator<Item = Bid>>(&mut self, iter: I) {
        for bid in iter {
            self.insert(bid);
        }
    }
}

impl FromIterator<Bid> for BinarySearchTree {
    fn from_iter<I: IntoIterator<Item = Bid>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a> IntoIterator for &'a BinarySearchTree {
    type Item = &'a Bid;
    type IntoIter = InOrderIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ленивый симметричный обход (левое поддерево, узел, правое поддерево)
/// с явным стеком вместо рекурсии
#[derive(Debug)]
pub struct InOrderIter<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> InOrderIter<'a> {
    fn new(root: Option<&'a TreeNode>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut node: Option<&'a TreeNode>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a> Iterator for InOrderIter<'a> {
    type Item = &'a Bid;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(&node.bid)
    }
}
