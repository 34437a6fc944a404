//! Order form model and totals calculation.
//!
//! An [`Order`] holds client data and an ordered list of [`Task`]s, each with
//! articles, a shipping fee and add-costs. The
//! [`TotalsCalculator`](calculations::TotalsCalculator) turns an order into
//! per-task and grand totals, and the [`OrderEditor`](editor::OrderEditor)
//! mutates the tree and recomputes after every change.

pub mod calculations;
pub mod editor;
pub mod ids;
pub mod models;
pub mod money;
pub mod payload;

pub use models::*;
pub use money::{Cents, CurrencyFormat};
