//! Frontend-facing projections of the domain records. Field names and shapes
//! here are part of the wire contract with the existing frontends.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::{Booking, Category, OrderStatus, TrackingSnapshot};
use crate::status::{self, FrontendStatus};

/// Full order object for `getOrderStatus` (customer polling), camelCase.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusView {
    pub order_id: String,
    pub session_id: String,
    pub name: String,
    pub phone: String,
    pub food_type: String,
    pub quantity: u32,
    pub special_requests: String,
    pub delivery_location: String,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub rider_id: Option<String>,
    pub rider_name: Option<String>,
    pub estimated_delivery: Option<String>,
    pub delivery_status: crate::domain::DeliveryStatus,
}

impl From<&Booking> for OrderStatusView {
    fn from(b: &Booking) -> Self {
        Self {
            order_id: b.order_id.clone(),
            session_id: b.session_id.clone(),
            name: b.customer_name.clone(),
            phone: b.customer_phone.clone(),
            food_type: b.item_type.clone(),
            quantity: b.quantity,
            special_requests: b.special_requests.clone(),
            delivery_location: b.delivery_location.clone(),
            total_amount: b.total_amount,
            status: b.status,
            timestamp: b.created_at,
            rider_id: b.rider_id.clone(),
            rider_name: b.rider_name.clone(),
            estimated_delivery: b.estimated_delivery.clone(),
            delivery_status: b.delivery_status,
        }
    }
}

/// Tracking record as `deliveryProgress` in `getOrderStatus`, camelCase.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingView {
    pub order_id: String,
    pub session_id: String,
    pub status: crate::domain::DeliveryStatus,
    pub timestamp: DateTime<Utc>,
    pub rider_id: Option<String>,
    pub rider_location: Option<crate::domain::RiderLocation>,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl From<&TrackingSnapshot> for TrackingView {
    fn from(s: &TrackingSnapshot) -> Self {
        Self {
            order_id: s.order_id.clone(),
            session_id: s.session_id.clone(),
            status: s.status,
            timestamp: s.created_at,
            rider_id: s.rider_id.clone(),
            rider_location: s.rider_location,
            estimated_arrival: s.estimated_arrival,
            notes: s.notes.clone(),
            last_updated: s.last_updated,
        }
    }
}

/// Compact booking object for `get_booking_status` (rider dashboard polling).
#[derive(Debug, Serialize)]
pub struct BookingStatusView {
    pub order_id: String,
    pub status: FrontendStatus,
    pub rider_name: String,
    pub rider_phone: String,
}

impl From<&Booking> for BookingStatusView {
    fn from(b: &Booking) -> Self {
        Self {
            order_id: b.order_id.clone(),
            status: status::project(b.status, b.delivery_status),
            rider_name: b.rider_name.clone().unwrap_or_default(),
            rider_phone: b.rider_phone.clone().unwrap_or_default(),
        }
    }
}

/// Dashboard listing entry for `get_all_bookings`.
#[derive(Debug, Serialize)]
pub struct BookingSummary {
    pub order_id: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Projected status, with `delivered` renamed to `completed` for the
    /// dashboard vocabulary.
    pub status: String,
    pub rider_id: String,
    pub rider_name: String,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub booking_type: Category,
    pub customer_name: String,
    pub customer_phone: String,
    pub payment_status: String,
    pub payment_amount: f64,
    pub booking_details: Value,
}

/// Builds the dashboard entry, or None for cancelled bookings (the dashboard
/// hides them; the rows themselves are kept for audit).
pub fn booking_summary(b: &Booking) -> Option<BookingSummary> {
    let projected = status::project(b.status, b.delivery_status);
    if projected == FrontendStatus::Cancelled {
        return None;
    }
    let delivered = projected == FrontendStatus::Delivered;
    let status = if delivered {
        "completed".to_string()
    } else {
        projected.to_string()
    };
    Some(BookingSummary {
        order_id: b.order_id.clone(),
        created_at: Some(b.created_at),
        status,
        rider_id: b.rider_id.clone().unwrap_or_default(),
        rider_name: b.rider_name.clone().unwrap_or_default(),
        assigned_at: b.assigned_at,
        completed_at: delivered.then_some(b.created_at),
        booking_type: b.category,
        customer_name: b.customer_name.clone(),
        customer_phone: b.customer_phone.clone(),
        payment_status: if b.total_amount > 0.0 {
            "Not Yet Paid".to_string()
        } else {
            "Paid".to_string()
        },
        payment_amount: b.total_amount,
        booking_details: booking_details(b),
    })
}

/// Category-specific detail block, recovering structured fields from the
/// serialized special-requests blob. Parse failures keep the defaults.
fn booking_details(b: &Booking) -> Value {
    let mut details = json!({
        "itemIdentity": b.item_type,
        "quantity": b.quantity,
        "notes": b.special_requests,
        "pickupLocation": "",
        "deliveryLocation": b.delivery_location,
    });

    let Ok(Value::Object(blob)) = serde_json::from_str(&b.special_requests) else {
        return details;
    };
    let str_of = |key: &str| -> Option<&str> { blob.get(key).and_then(Value::as_str) };

    match b.category {
        Category::Laundry => {
            details["pickupLocation"] = json!(str_of("pickupLocation").unwrap_or(""));
            details["basketName"] = json!(str_of("basketName").unwrap_or(""));
            details["notes"] = json!(str_of("notes").unwrap_or(""));
        }
        Category::Food => {
            details["pickupLocation"] = json!(str_of("pickupLocation").unwrap_or(""));
            if let Some(notes) = str_of("notes") {
                details["notes"] = json!(notes);
            }
        }
        Category::Parcel => {
            details["pickupPerson"] = json!(str_of("pickupPerson").unwrap_or(""));
            if let Some(notes) = str_of("notes") {
                details["notes"] = json!(notes);
            }
        }
    }
    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeliveryStatus;

    fn booking(category: Category) -> Booking {
        Booking {
            order_id: "ORD-1".into(),
            session_id: "S1".into(),
            customer_name: "Alice".into(),
            customer_phone: "0917".into(),
            item_type: "Laundry".into(),
            quantity: 1,
            special_requests:
                r#"{"pickupLocation":"Dorm B","basketName":"Blue","notes":"gentle"}"#.into(),
            delivery_location: "Dorm A".into(),
            total_amount: 120.0,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            rider_id: None,
            rider_name: None,
            rider_phone: None,
            estimated_delivery: None,
            delivery_status: DeliveryStatus::WaitingForRider,
            assigned_at: None,
            category,
        }
    }

    #[test]
    fn laundry_details_parse_the_blob() {
        let summary = booking_summary(&booking(Category::Laundry)).unwrap();
        assert_eq!(summary.booking_details["pickupLocation"], "Dorm B");
        assert_eq!(summary.booking_details["basketName"], "Blue");
        assert_eq!(summary.booking_details["notes"], "gentle");
        assert_eq!(summary.status, "pending");
        assert_eq!(summary.payment_status, "Not Yet Paid");
    }

    #[test]
    fn cancelled_bookings_are_hidden_from_the_dashboard() {
        let mut b = booking(Category::Food);
        b.status = OrderStatus::Cancelled;
        assert!(booking_summary(&b).is_none());
    }

    #[test]
    fn delivered_shows_as_completed() {
        let mut b = booking(Category::Food);
        b.status = OrderStatus::Delivered;
        b.delivery_status = DeliveryStatus::Delivered;
        let summary = booking_summary(&b).unwrap();
        assert_eq!(summary.status, "completed");
        assert!(summary.completed_at.is_some());
    }

    #[test]
    fn unparsable_blob_keeps_defaults() {
        let mut b = booking(Category::Food);
        b.special_requests = "extra crispy please".into();
        let summary = booking_summary(&b).unwrap();
        assert_eq!(summary.booking_details["notes"], "extra crispy please");
        assert_eq!(summary.booking_details["pickupLocation"], "");
    }
}
