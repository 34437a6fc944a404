//! Per-task and grand totals for an order.
//!
//! # Calculation
//!
//! | Step | Value |
//! |------|-------|
//! | 1    | Line total per article: quantity × price when both are positive, else nothing |
//! | 2    | Task subtotal: Σ line totals + shipping fee + Σ add-cost prices |
//! | 3    | Fee: round(share × subtotal) + base, rounding half away from zero |
//! | 4    | Task total: subtotal + fee |
//! | 5    | Grand subtotal, fee and total: sums over all tasks |
//! | 6    | Reshipping fee: added to the grand total only, for shipped orders |
//!
//! # Example
//!
//! ```
//! use order_core::calculations::{FeeSchedule, ReshippingInput, TotalsCalculator};
//! use order_core::{Article, Cents, Order, Task};
//!
//! let mut task = Task::new("https://shop.example");
//! task.shipping_fee = Cents(300);
//! task.articles.push(Article::new("item-1", "blue", 2, Cents(500)));
//!
//! let order = Order {
//!     tasks: vec![task],
//!     ..Default::default()
//! };
//!
//! let calculator = TotalsCalculator::new(FeeSchedule::default()).unwrap();
//! let totals = calculator.calculate(&order, &ReshippingInput::default()).unwrap();
//!
//! assert_eq!(totals.tasks[0].subtotal, Cents(1300));
//! assert_eq!(totals.tasks[0].fee, Cents(1316));
//! assert_eq!(totals.total, Cents(2616));
//! ```

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::common::round_half_away;
use super::reshipping::{ReshippingInput, resolve_reshipping_fee};
use crate::models::{Order, Task};
use crate::money::Cents;

/// Errors that can occur while computing totals.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TotalsError {
    /// The fee share must be between 0 and 1.
    #[error("fee share must be between 0 and 1, got {0}")]
    InvalidFeeShare(Decimal),

    /// The fee base must be non-negative.
    #[error("fee base must be non-negative, got {0}")]
    InvalidFeeBase(Cents),

    /// An amount left the representable range.
    #[error("amount overflow in {0}")]
    Overflow(&'static str),
}

/// The per-task service fee: a fixed base plus a share of the task subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Fixed part charged on every task, in cents.
    pub base: Cents,

    /// Fraction of the task subtotal, e.g. `0.02` for 2 %.
    pub share: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base: Cents(1290),
            share: Decimal::new(2, 2),
        }
    }
}

impl FeeSchedule {
    pub fn validate(&self) -> Result<(), TotalsError> {
        if self.share < Decimal::ZERO || self.share > Decimal::ONE {
            return Err(TotalsError::InvalidFeeShare(self.share));
        }
        if self.base < Cents::ZERO {
            return Err(TotalsError::InvalidFeeBase(self.base));
        }
        Ok(())
    }

    /// Fee for a task with the given subtotal.
    ///
    /// The subtotal may be negative when discounts exceed the goods; rounding
    /// is symmetric around zero, so `fee(-50)` is `base - 1`.
    pub fn fee(
        &self,
        subtotal: Cents,
    ) -> Result<Cents, TotalsError> {
        let share = round_half_away(self.share * Decimal::from(subtotal.get()))
            .to_i64()
            .ok_or(TotalsError::Overflow("fee"))?;
        Cents(share)
            .checked_add(self.base)
            .ok_or(TotalsError::Overflow("fee"))
    }
}

/// Totals of a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTotals {
    /// One entry per article, `None` where nothing is shown.
    pub line_totals: Vec<Option<Cents>>,
    pub subtotal: Cents,
    pub fee: Cents,
    pub total: Cents,
}

/// Totals of a whole order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// In task order.
    pub tasks: Vec<TaskTotals>,

    /// Σ task subtotals.
    pub subtotal: Cents,

    /// Σ task fees.
    pub fee: Cents,

    /// Present only for shipped orders.
    pub reshipping_fee: Option<Cents>,

    /// Σ task totals plus the reshipping fee.
    pub total: Cents,
}

/// Calculator for order totals.
#[derive(Debug, Clone)]
pub struct TotalsCalculator {
    schedule: FeeSchedule,
}

impl TotalsCalculator {
    /// Creates a calculator after validating the fee schedule.
    pub fn new(schedule: FeeSchedule) -> Result<Self, TotalsError> {
        schedule.validate()?;
        Ok(Self { schedule })
    }

    pub fn schedule(&self) -> &FeeSchedule {
        &self.schedule
    }

    /// Calculates the totals of every task and of the whole order.
    ///
    /// `reshipping` is consulted only when the order's delivery method is
    /// shipping.
    ///
    /// # Errors
    ///
    /// Returns [`TotalsError::Overflow`] if any sum leaves the `i64` range.
    pub fn calculate(
        &self,
        order: &Order,
        reshipping: &ReshippingInput,
    ) -> Result<OrderTotals, TotalsError> {
        let tasks = order
            .tasks
            .iter()
            .map(|task| self.task_totals(task))
            .collect::<Result<Vec<_>, _>>()?;

        let subtotal = Self::sum(tasks.iter().map(|t| t.subtotal), "grand subtotal")?;
        let fee = Self::sum(tasks.iter().map(|t| t.fee), "grand fee")?;
        let tasks_total = Self::sum(tasks.iter().map(|t| t.total), "grand total")?;

        let reshipping_fee = order
            .is_shipping()
            .then(|| resolve_reshipping_fee(reshipping));

        let total = match reshipping_fee {
            Some(reshipping_fee) => tasks_total
                .checked_add(reshipping_fee)
                .ok_or(TotalsError::Overflow("grand total"))?,
            None => tasks_total,
        };

        debug!(
            tasks = tasks.len(),
            subtotal = subtotal.get(),
            fee = fee.get(),
            total = total.get(),
            "recomputed order totals"
        );

        Ok(OrderTotals {
            tasks,
            subtotal,
            fee,
            reshipping_fee,
            total,
        })
    }

    /// Calculates subtotal, fee and total of one task.
    fn task_totals(
        &self,
        task: &Task,
    ) -> Result<TaskTotals, TotalsError> {
        let line_totals = self.line_totals(task)?;
        let subtotal = self.task_subtotal(task, &line_totals)?;
        let fee = self.schedule.fee(subtotal)?;
        let total = subtotal
            .checked_add(fee)
            .ok_or(TotalsError::Overflow("task total"))?;

        Ok(TaskTotals {
            line_totals,
            subtotal,
            fee,
            total,
        })
    }

    /// Line totals of all articles; non-countable articles yield `None`.
    fn line_totals(
        &self,
        task: &Task,
    ) -> Result<Vec<Option<Cents>>, TotalsError> {
        task.articles
            .iter()
            .map(|article| {
                if article.is_countable() {
                    article
                        .line_total()
                        .map(Some)
                        .ok_or(TotalsError::Overflow("line total"))
                } else {
                    Ok(None)
                }
            })
            .collect()
    }

    /// Σ line totals + shipping fee + Σ add-costs.
    fn task_subtotal(
        &self,
        task: &Task,
        line_totals: &[Option<Cents>],
    ) -> Result<Cents, TotalsError> {
        let amounts = line_totals
            .iter()
            .flatten()
            .copied()
            .chain(std::iter::once(task.shipping_fee))
            .chain(task.add_costs.iter().map(|c| c.price));
        Self::sum(amounts, "task subtotal")
    }

    fn sum(
        amounts: impl IntoIterator<Item = Cents>,
        what: &'static str,
    ) -> Result<Cents, TotalsError> {
        amounts
            .into_iter()
            .try_fold(Cents::ZERO, |acc, amount| acc.checked_add(amount))
            .ok_or(TotalsError::Overflow(what))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{AddCost, Article, DeliveryMethod};

    fn calculator() -> TotalsCalculator {
        TotalsCalculator::new(FeeSchedule::default()).unwrap()
    }

    fn task_with(
        articles: Vec<Article>,
        shipping_fee: i64,
        add_costs: Vec<AddCost>,
    ) -> Task {
        Task {
            id: String::new(),
            merchant: "https://shop.example".to_string(),
            shipping_fee: Cents(shipping_fee),
            articles,
            add_costs,
        }
    }

    fn order_with(tasks: Vec<Task>) -> Order {
        Order {
            tasks,
            ..Default::default()
        }
    }

    // =========================================================================
    // FeeSchedule tests
    // =========================================================================

    #[test]
    fn fee_adds_base_to_rounded_share() {
        let schedule = FeeSchedule::default();

        assert_eq!(schedule.fee(Cents(1300)), Ok(Cents(1316)));
        assert_eq!(schedule.fee(Cents(1000)), Ok(Cents(1310)));
    }

    #[test]
    fn fee_of_zero_subtotal_is_base() {
        assert_eq!(FeeSchedule::default().fee(Cents::ZERO), Ok(Cents(1290)));
    }

    #[test]
    fn fee_rounds_midpoint_away_from_zero() {
        let schedule = FeeSchedule::default();

        // 0.02 × 25 = 0.5
        assert_eq!(schedule.fee(Cents(25)), Ok(Cents(1291)));
        // 0.02 × -25 = -0.5
        assert_eq!(schedule.fee(Cents(-25)), Ok(Cents(1289)));
    }

    #[test]
    fn fee_of_negative_subtotal() {
        // 0.02 × -50 = -1.0
        assert_eq!(FeeSchedule::default().fee(Cents(-50)), Ok(Cents(1289)));
    }

    #[test]
    fn validate_rejects_share_above_one() {
        let schedule = FeeSchedule {
            share: dec!(1.5),
            ..Default::default()
        };

        assert_eq!(
            schedule.validate(),
            Err(TotalsError::InvalidFeeShare(dec!(1.5)))
        );
        assert!(TotalsCalculator::new(schedule).is_err());
    }

    #[test]
    fn validate_rejects_negative_share() {
        let schedule = FeeSchedule {
            share: dec!(-0.01),
            ..Default::default()
        };

        assert_eq!(
            schedule.validate(),
            Err(TotalsError::InvalidFeeShare(dec!(-0.01)))
        );
    }

    #[test]
    fn validate_rejects_negative_base() {
        let schedule = FeeSchedule {
            base: Cents(-1),
            ..Default::default()
        };

        assert_eq!(schedule.validate(), Err(TotalsError::InvalidFeeBase(Cents(-1))));
    }

    // =========================================================================
    // calculate tests
    // =========================================================================

    #[test]
    fn single_article_with_shipping_fee() {
        let order = order_with(vec![task_with(
            vec![Article::new("a", "", 2, Cents(500))],
            300,
            vec![],
        )]);

        let totals = calculator()
            .calculate(&order, &ReshippingInput::default())
            .unwrap();

        assert_eq!(totals.tasks[0].line_totals, vec![Some(Cents(1000))]);
        assert_eq!(totals.tasks[0].subtotal, Cents(1300));
        assert_eq!(totals.tasks[0].fee, Cents(1316));
        assert_eq!(totals.tasks[0].total, Cents(2616));
        assert_eq!(totals.total, Cents(2616));
    }

    #[test]
    fn discount_add_cost_reduces_subtotal() {
        let order = order_with(vec![task_with(
            vec![Article::new("a", "", 4, Cents(500))],
            0,
            vec![AddCost::new("voucher", Cents(-1000))],
        )]);

        let totals = calculator()
            .calculate(&order, &ReshippingInput::default())
            .unwrap();

        assert_eq!(totals.tasks[0].subtotal, Cents(1000));
        assert_eq!(totals.tasks[0].fee, Cents(1310));
        assert_eq!(totals.tasks[0].total, Cents(2310));
    }

    #[test]
    fn discount_can_make_subtotal_negative() {
        let order = order_with(vec![task_with(
            vec![],
            0,
            vec![AddCost::new("refund", Cents(-50))],
        )]);

        let totals = calculator()
            .calculate(&order, &ReshippingInput::default())
            .unwrap();

        assert_eq!(totals.tasks[0].subtotal, Cents(-50));
        assert_eq!(totals.tasks[0].fee, Cents(1289));
        assert_eq!(totals.tasks[0].total, Cents(1239));
    }

    #[test]
    fn uncountable_articles_show_nothing_and_add_nothing() {
        let order = order_with(vec![task_with(
            vec![
                Article::new("zero quantity", "", 0, Cents(500)),
                Article::new("zero price", "", 1, Cents::ZERO),
                Article::new("counted", "", 1, Cents(200)),
            ],
            0,
            vec![],
        )]);

        let totals = calculator()
            .calculate(&order, &ReshippingInput::default())
            .unwrap();

        assert_eq!(
            totals.tasks[0].line_totals,
            vec![None, None, Some(Cents(200))]
        );
        assert_eq!(totals.tasks[0].subtotal, Cents(200));
    }

    #[test]
    fn grand_totals_sum_all_tasks() {
        let order = order_with(vec![
            task_with(vec![Article::new("a", "", 2, Cents(500))], 300, vec![]),
            task_with(
                vec![Article::new("b", "", 4, Cents(500))],
                0,
                vec![AddCost::new("voucher", Cents(-1000))],
            ),
        ]);

        let totals = calculator()
            .calculate(&order, &ReshippingInput::default())
            .unwrap();

        assert_eq!(totals.subtotal, Cents(1300 + 1000));
        assert_eq!(totals.fee, Cents(1316 + 1310));
        assert_eq!(totals.total, Cents(2616 + 2310));
        assert_eq!(totals.reshipping_fee, None);
    }

    #[test]
    fn empty_order_has_zero_totals() {
        let totals = calculator()
            .calculate(&Order::default(), &ReshippingInput::default())
            .unwrap();

        assert_eq!(totals, OrderTotals::default());
    }

    #[test]
    fn reshipping_fee_is_added_to_grand_total_only() {
        let mut order = order_with(vec![task_with(
            vec![Article::new("a", "", 2, Cents(500))],
            300,
            vec![],
        )]);
        order.delivery_method = Some(DeliveryMethod::Shipping);
        let reshipping = ReshippingInput {
            service_min_cost: Cents(500),
            override_fee: None,
            manual_entry: Some(Cents(700)),
        };

        let totals = calculator().calculate(&order, &reshipping).unwrap();

        assert_eq!(totals.reshipping_fee, Some(Cents(700)));
        assert_eq!(totals.tasks[0].total, Cents(2616));
        assert_eq!(totals.subtotal, Cents(1300));
        assert_eq!(totals.total, Cents(2616 + 700));
    }

    #[test]
    fn reshipping_is_ignored_for_pickup() {
        let mut order = order_with(vec![]);
        order.delivery_method = Some(DeliveryMethod::Pickup);
        let reshipping = ReshippingInput {
            service_min_cost: Cents(500),
            override_fee: None,
            manual_entry: None,
        };

        let totals = calculator().calculate(&order, &reshipping).unwrap();

        assert_eq!(totals.reshipping_fee, None);
        assert_eq!(totals.total, Cents::ZERO);
    }

    #[test]
    fn recomputing_unchanged_order_gives_identical_totals() {
        let order = order_with(vec![task_with(
            vec![
                Article::new("a", "", 3, Cents(333)),
                Article::new("b", "", 0, Cents(1)),
            ],
            490,
            vec![AddCost::new("customs", Cents(1234))],
        )]);
        let calculator = calculator();

        let first = calculator
            .calculate(&order, &ReshippingInput::default())
            .unwrap();
        let second = calculator
            .calculate(&order, &ReshippingInput::default())
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn overflowing_line_total_is_an_error() {
        let order = order_with(vec![task_with(
            vec![Article::new("a", "", i64::MAX, Cents(2))],
            0,
            vec![],
        )]);

        let result = calculator().calculate(&order, &ReshippingInput::default());

        assert_eq!(result, Err(TotalsError::Overflow("line total")));
    }

    #[test]
    fn overflowing_add_costs_are_an_error() {
        let order = order_with(vec![task_with(
            vec![],
            0,
            vec![
                AddCost::new("customs", Cents(i64::MAX)),
                AddCost::new("handling", Cents(1)),
            ],
        )]);

        let result = calculator().calculate(&order, &ReshippingInput::default());

        assert_eq!(result, Err(TotalsError::Overflow("task subtotal")));
    }

    #[test]
    fn custom_schedule_changes_fee() {
        let schedule = FeeSchedule {
            base: Cents(100),
            share: dec!(0.10),
        };
        let calculator = TotalsCalculator::new(schedule).unwrap();
        let order = order_with(vec![task_with(vec![], 1000, vec![])]);

        let totals = calculator
            .calculate(&order, &ReshippingInput::default())
            .unwrap();

        assert_eq!(totals.tasks[0].fee, Cents(200));
    }
}
