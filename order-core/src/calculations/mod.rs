//! Monetary calculations over an order tree.
//!
//! Everything here is pure: the same order in gives the same totals out.

pub mod common;
pub mod reshipping;
pub mod totals;

pub use reshipping::{ReshippingInput, resolve_reshipping_fee};
pub use totals::{FeeSchedule, OrderTotals, TaskTotals, TotalsCalculator, TotalsError};
