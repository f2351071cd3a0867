//! Тесты для модуля storage
//!
//! Общие проверки контракта индекса, которые прогоняются на обеих
//! реализациях через трейт `Index`.
