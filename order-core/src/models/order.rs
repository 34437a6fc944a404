use serde::{Deserialize, Serialize};

use super::Task;
use crate::money::Cents;

/// How the goods reach the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Pickup,
    Shipping,
    Other,
}

impl DeliveryMethod {
    pub fn all() -> &'static [DeliveryMethod] {
        &[
            DeliveryMethod::Pickup,
            DeliveryMethod::Shipping,
            DeliveryMethod::Other,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Shipping => "shipping",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pickup" => Some(Self::Pickup),
            "shipping" => Some(Self::Shipping),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pickup => "Pickup",
            Self::Shipping => "Shipping",
            Self::Other => "Other",
        }
    }
}

/// Contact and delivery address fields entered by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientInfo {
    pub client_name: String,
    pub client_contact: String,
    pub client_contact_protocol: String,
    pub shipping_address_supplement: String,
    pub shipping_first_name: String,
    pub shipping_last_name: String,
    pub shipping_postcode: String,
    /// Id of the selected [`ShippingService`](super::ShippingService).
    pub shipping_service: String,
    pub shipping_street: String,
    pub shipping_street_number: String,
    pub shipping_town: String,
}

/// The complete form state: client data plus an ordered list of tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Order {
    #[serde(flatten)]
    pub client: ClientInfo,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_method: Option<DeliveryMethod>,

    /// Reshipping fee set by the store. Replaces the service minimum when non-zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reshipping_fee: Option<Cents>,

    #[serde(default, deserialize_with = "super::null_as_default")]
    pub tasks: Vec<Task>,
}

impl Order {
    pub fn is_shipping(&self) -> bool {
        self.delivery_method == Some(DeliveryMethod::Shipping)
    }
}
