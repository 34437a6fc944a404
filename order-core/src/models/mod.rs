mod article;
mod catalog;
mod order;
mod task;

pub use article::{AddCost, Article};
pub use catalog::{ContactProtocol, ShippingCatalog, ShippingService};
pub use order::{ClientInfo, DeliveryMethod, Order};
pub use task::{MAX_TASKS, Task};

use serde::{Deserialize, Deserializer};

/// Deserializes `null` as the type's default value.
///
/// Browsers serialize `NaN` (an empty number field) as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
