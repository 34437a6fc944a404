use serde::{Deserialize, Serialize};

use super::{AddCost, Article};
use crate::money::Cents;

/// Upper bound on the number of tasks in one order.
pub const MAX_TASKS: usize = 100;

/// A sub-order directed at a single merchant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Task {
    /// Blank until the order is submitted for the first time.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub merchant: String,

    #[serde(default, deserialize_with = "super::null_as_default")]
    pub shipping_fee: Cents,

    #[serde(default, deserialize_with = "super::null_as_default")]
    pub articles: Vec<Article>,

    #[serde(default, deserialize_with = "super::null_as_default")]
    pub add_costs: Vec<AddCost>,
}

impl Task {
    pub fn new(merchant: impl Into<String>) -> Self {
        Self {
            merchant: merchant.into(),
            ..Default::default()
        }
    }

    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}
