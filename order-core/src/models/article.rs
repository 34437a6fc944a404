use serde::{Deserialize, Serialize};

use crate::money::Cents;

/// One orderable line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub link: String,

    #[serde(default, deserialize_with = "super::null_as_default")]
    pub price: Cents,

    #[serde(default)]
    pub properties: String,

    #[serde(default, deserialize_with = "super::null_as_default")]
    pub quantity: i64,
}

impl Default for Article {
    fn default() -> Self {
        Self {
            link: String::new(),
            price: Cents::ZERO,
            properties: String::new(),
            quantity: 1,
        }
    }
}

impl Article {
    pub fn new(
        link: impl Into<String>,
        properties: impl Into<String>,
        quantity: i64,
        price: Cents,
    ) -> Self {
        Self {
            link: link.into(),
            price,
            properties: properties.into(),
            quantity,
        }
    }

    /// Whether the article contributes to the task subtotal.
    ///
    /// Both quantity and price must be positive. Anything else counts as
    /// "not entered yet" and is excluded.
    pub fn is_countable(&self) -> bool {
        self.quantity > 0 && self.price.is_positive()
    }

    /// Quantity × price, or `None` when the article is not countable (or the
    /// product overflows).
    pub fn line_total(&self) -> Option<Cents> {
        if self.is_countable() {
            self.price.checked_mul(self.quantity)
        } else {
            None
        }
    }
}

/// A named surcharge (positive) or discount (negative) on a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCost {
    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "super::null_as_default")]
    pub price: Cents,
}

impl AddCost {
    pub fn new(
        name: impl Into<String>,
        price: Cents,
    ) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}
