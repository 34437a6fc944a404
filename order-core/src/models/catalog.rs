//! Selectable reference data: shipping services and contact protocols.
//!
//! A stored selection that is no longer offered (a deprecated id) is appended
//! to the list it belongs to, so existing orders keep resolving.

use serde::{Deserialize, Serialize};

use crate::money::Cents;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingService {
    pub id: String,
    pub name: String,
    /// Lower bound of the reshipping fee when this service is chosen.
    pub min_cost: Cents,
}

impl ShippingService {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        min_cost: Cents,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            min_cost,
        }
    }
}

/// The offered shipping services, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShippingCatalog(Vec<ShippingService>);

impl Default for ShippingCatalog {
    fn default() -> Self {
        Self(vec![
            ShippingService::new(
                "dhl-paket-analog",
                "DHL Paket (insured), analog postage: from 7,49 €",
                Cents(749),
            ),
            ShippingService::new(
                "dhl-paket-digital",
                "DHL Paket (insured), digital postage: from 5,94 €",
                Cents(594),
            ),
            ShippingService::new(
                "post-einschreiben-einwurf",
                "Deutsche Post Einschreiben Einwurf: from 3,81 €",
                Cents(381),
            ),
            ShippingService::new(
                "post-einschreiben-wert",
                "Deutsche Post Einschreiben Wert: from 6,31 €",
                Cents(631),
            ),
        ])
    }
}

impl ShippingCatalog {
    pub fn new(services: Vec<ShippingService>) -> Self {
        Self(services)
    }

    pub fn services(&self) -> &[ShippingService] {
        &self.0
    }

    pub fn find(
        &self,
        id: &str,
    ) -> Option<&ShippingService> {
        self.0.iter().find(|s| s.id == id)
    }

    /// Minimum reshipping cost of the service, zero for unknown ids.
    pub fn min_cost(
        &self,
        id: &str,
    ) -> Cents {
        self.find(id).map_or(Cents::ZERO, |s| s.min_cost)
    }

    /// The catalogue plus `selected` when it is not offered any more.
    pub fn with_selected(
        &self,
        selected: &str,
    ) -> Vec<ShippingService> {
        let mut services = self.0.clone();
        if !selected.is_empty() && self.find(selected).is_none() {
            services.push(ShippingService::new(selected, selected, Cents::ZERO));
        }
        services
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactProtocol {
    pub id: String,
    pub name: String,
}

impl ContactProtocol {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn defaults() -> Vec<ContactProtocol> {
        vec![
            ContactProtocol::new("email", "E-Mail"),
            ContactProtocol::new("xmpp-otr", "Jabber with OTR"),
            ContactProtocol::new("matrix", "Matrix"),
            ContactProtocol::new("signal", "Signal"),
        ]
    }

    /// The default protocols plus `selected` when it is not among them.
    pub fn with_selected(selected: &str) -> Vec<ContactProtocol> {
        let mut protocols = Self::defaults();
        if !selected.is_empty() && !protocols.iter().any(|p| p.id == selected) {
            protocols.push(ContactProtocol::new(selected, selected));
        }
        protocols
    }
}
