//! Базовые типы данных для bidstore

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор заявки
pub type BidId = String;

/// Заявка на закупку
///
/// Обычное значение без поведения: индексы хранят собственные копии,
/// порядок и хеширование определяются только полем `bid_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    /// Уникальный идентификатор
    pub bid_id: BidId,
    /// Название
    pub title: String,
    /// Код фонда
    pub fund: String,
    /// Сумма (неотрицательная)
    pub amount: f64,
}

impl Bid {
    /// Создает новую заявку
    pub fn new(
        bid_id: impl Into<String>,
        title: impl Into<String>,
        fund: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            bid_id: bid_id.into(),
            title: title.into(),
            fund: fund.into(),
            amount,
        }
    }

    /// Проверяет, что заявка может быть передана в индекс
    pub fn validate(&self) -> Result<()> {
        if self.bid_id.is_empty() {
            return Err(Error::validation("bid id cannot be empty"));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(Error::validation(format!(
                "bid {} has invalid amount {}",
                self.bid_id, self.amount
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} | {} | {}",
            self.bid_id, self.title, self.amount, self.fund
        )
    }
}
