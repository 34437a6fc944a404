//! Order-level reshipping fee.

use serde::{Deserialize, Serialize};

use crate::models::{Order, ShippingCatalog};
use crate::money::Cents;

/// Values the reshipping fee is resolved from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReshippingInput {
    /// Minimum cost of the selected shipping service.
    pub service_min_cost: Cents,

    /// Fee stored on the order. Replaces the minimum when present and non-zero.
    pub override_fee: Option<Cents>,

    /// Value typed into the form. Wins when it is larger.
    pub manual_entry: Option<Cents>,
}

impl ReshippingInput {
    /// Builds the input from the order's selected service and stored fee.
    pub fn for_order(
        order: &Order,
        catalog: &ShippingCatalog,
    ) -> Self {
        Self {
            service_min_cost: catalog.min_cost(&order.client.shipping_service),
            override_fee: order.reshipping_fee,
            manual_entry: None,
        }
    }

    pub fn with_manual_entry(
        mut self,
        manual_entry: Option<Cents>,
    ) -> Self {
        self.manual_entry = manual_entry;
        self
    }
}

/// Resolves the reshipping fee.
///
/// 1. Start from the service minimum.
/// 2. A present, non-zero override replaces it.
/// 3. A manual entry replaces it if larger.
///
/// ```
/// use order_core::Cents;
/// use order_core::calculations::{ReshippingInput, resolve_reshipping_fee};
///
/// let input = ReshippingInput {
///     service_min_cost: Cents(500),
///     override_fee: None,
///     manual_entry: Some(Cents(700)),
/// };
/// assert_eq!(resolve_reshipping_fee(&input), Cents(700));
/// ```
pub fn resolve_reshipping_fee(input: &ReshippingInput) -> Cents {
    let mut fee = input.service_min_cost;

    if let Some(override_fee) = input.override_fee.filter(|f| *f != Cents::ZERO) {
        fee = override_fee;
    }

    if let Some(manual) = input.manual_entry {
        fee = fee.max(manual);
    }

    fee
}
