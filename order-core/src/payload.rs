//! The serialized form of an order.
//!
//! On submit the whole order tree is written into a single JSON string with
//! kebab-case keys:
//!
//! ```json
//! {
//!   "client-name": "…", "client-contact": "…", "client-contact-protocol": "…",
//!   "shipping-address-supplement": "…", "shipping-first-name": "…",
//!   "shipping-last-name": "…", "shipping-postcode": "…", "shipping-service": "…",
//!   "shipping-street": "…", "shipping-street-number": "…", "shipping-town": "…",
//!   "delivery-method": "shipping",
//!   "reshipping-fee": 749,
//!   "tasks": [{
//!     "id": "", "merchant": "…", "shipping-fee": 300,
//!     "articles": [{"link": "…", "price": 500, "properties": "…", "quantity": 2}],
//!     "add-costs": [{"name": "…", "price": -1000}]
//!   }]
//! }
//! ```
//!
//! `delivery-method` and `reshipping-fee` are omitted when unset. All amounts
//! are integer cents.

use thiserror::Error;
use tracing::debug;

use crate::ids::new_task_id;
use crate::models::{MAX_TASKS, Order};

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed order payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("too many tasks: {count} (at most {})", MAX_TASKS)]
    TooManyTasks { count: usize },
}

/// Serializes an order into the submit payload.
pub fn to_payload(order: &Order) -> Result<String, PayloadError> {
    Ok(serde_json::to_string(order)?)
}

/// Parses a submit payload.
///
/// Absent fields take their defaults and `null` amounts read as zero.
pub fn from_payload(payload: &str) -> Result<Order, PayloadError> {
    let order: Order = serde_json::from_str(payload)?;
    if order.tasks.len() > MAX_TASKS {
        return Err(PayloadError::TooManyTasks {
            count: order.tasks.len(),
        });
    }
    Ok(order)
}

/// Gives every task without an id a fresh one. Returns how many were assigned.
pub fn assign_missing_ids(order: &mut Order) -> usize {
    let mut assigned = 0;
    for task in order.tasks.iter_mut().filter(|t| !t.has_id()) {
        task.id = new_task_id();
        assigned += 1;
    }
    if assigned > 0 {
        debug!(assigned, "assigned task ids");
    }
    assigned
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::ids::is_task_id;
    use crate::models::{AddCost, Article, DeliveryMethod, Task};
    use crate::money::Cents;

    fn sample_order() -> Order {
        let mut order = Order::default();
        order.client.client_name = "Alice".to_string();
        order.client.shipping_service = "dhl-paket-digital".to_string();
        order.delivery_method = Some(DeliveryMethod::Shipping);
        order.tasks.push(Task {
            id: "ABCDEFGHKL".to_string(),
            merchant: "https://shop.example".to_string(),
            shipping_fee: Cents(300),
            articles: vec![
                Article::new("first", "red", 2, Cents(500)),
                Article::new("second", "", 1, Cents(1999)),
            ],
            add_costs: vec![AddCost::new("voucher", Cents(-1000))],
        });
        order
    }

    #[test]
    fn payload_uses_kebab_case_keys() {
        let value: serde_json::Value =
            serde_json::from_str(&to_payload(&sample_order()).unwrap()).unwrap();

        assert_eq!(value["client-name"], json!("Alice"));
        assert_eq!(value["delivery-method"], json!("shipping"));
        assert_eq!(value["tasks"][0]["shipping-fee"], json!(300));
        assert_eq!(value["tasks"][0]["add-costs"][0]["price"], json!(-1000));
        assert_eq!(value["tasks"][0]["articles"][1]["quantity"], json!(1));
    }

    #[test]
    fn payload_omits_unset_optional_fields() {
        let value: serde_json::Value =
            serde_json::from_str(&to_payload(&Order::default()).unwrap()).unwrap();

        assert!(value.get("delivery-method").is_none());
        assert!(value.get("reshipping-fee").is_none());
        assert_eq!(value["shipping-town"], json!(""));
        assert_eq!(value["tasks"], json!([]));
    }

    #[test]
    fn payload_round_trip_preserves_order_of_tasks_and_articles() {
        let mut order = sample_order();
        order.tasks.push(Task::new("https://other.example"));
        order.reshipping_fee = Some(Cents(749));

        let decoded = from_payload(&to_payload(&order).unwrap()).unwrap();

        assert_eq!(decoded, order);
    }

    #[test]
    fn from_payload_reads_null_amounts_as_zero() {
        let payload = r#"{
            "tasks": [{
                "id": "",
                "merchant": "m",
                "shipping-fee": null,
                "articles": [{"link": "l", "price": null, "properties": "", "quantity": null}],
                "add-costs": null
            }]
        }"#;

        let order = from_payload(payload).unwrap();

        assert_eq!(order.tasks[0].shipping_fee, Cents::ZERO);
        assert_eq!(order.tasks[0].articles[0].price, Cents::ZERO);
        assert_eq!(order.tasks[0].articles[0].quantity, 0);
        assert!(order.tasks[0].add_costs.is_empty());
    }

    #[test]
    fn from_payload_reads_null_reshipping_fee_as_absent() {
        let order = from_payload(r#"{"reshipping-fee": null, "tasks": []}"#).unwrap();

        assert_eq!(order.reshipping_fee, None);
    }

    #[test]
    fn from_payload_rejects_malformed_json() {
        assert!(matches!(
            from_payload("{\"tasks\": [").unwrap_err(),
            PayloadError::Json(_)
        ));
    }

    #[test]
    fn from_payload_rejects_unknown_delivery_method() {
        assert!(from_payload(r#"{"delivery-method": "teleport"}"#).is_err());
    }

    #[test]
    fn from_payload_rejects_too_many_tasks() {
        let tasks = vec![json!({"merchant": "m"}); MAX_TASKS + 1];
        let payload = json!({ "tasks": tasks }).to_string();

        assert!(matches!(
            from_payload(&payload).unwrap_err(),
            PayloadError::TooManyTasks { count } if count == MAX_TASKS + 1
        ));
    }

    #[test]
    fn assign_missing_ids_keeps_existing_ids() {
        let mut order = sample_order();
        order.tasks.push(Task::new("new"));
        order.tasks.push(Task {
            id: "   ".to_string(),
            ..Task::new("blank")
        });

        let assigned = assign_missing_ids(&mut order);

        assert_eq!(assigned, 2);
        assert_eq!(order.tasks[0].id, "ABCDEFGHKL");
        assert!(is_task_id(&order.tasks[1].id));
        assert!(is_task_id(&order.tasks[2].id));
    }
}
