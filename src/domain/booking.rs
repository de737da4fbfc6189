use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Service category a booking belongs to. Determines which booking table the
/// row lives in and which structured special-request fields apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Parcel,
    Laundry,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Food, Category::Parcel, Category::Laundry];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Parcel => "parcel",
            Category::Laundry => "laundry",
        }
    }

    /// Table name for this category, matching the legacy sheet names.
    pub fn table_name(&self) -> &'static str {
        match self {
            Category::Food => "FoodBookings",
            Category::Parcel => "ParcelsBookings",
            Category::Laundry => "LaundryBookings",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "food" => Ok(Category::Food),
            "parcel" => Ok(Category::Parcel),
            "laundry" => Ok(Category::Laundry),
            other => Err(format!("Unknown booking category: {}", other)),
        }
    }
}

/// Coarse order lifecycle status (booking column 10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("Unknown order status: {}", other)),
        }
    }
}

/// Fine-grained delivery-side status (booking column 15, tracking column 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    WaitingForRider,
    RiderAssigned,
    OnTheWay,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::WaitingForRider => "waiting_for_rider",
            DeliveryStatus::RiderAssigned => "rider_assigned",
            DeliveryStatus::OnTheWay => "on_the_way",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting_for_rider" => Ok(DeliveryStatus::WaitingForRider),
            "rider_assigned" => Ok(DeliveryStatus::RiderAssigned),
            "on_the_way" => Ok(DeliveryStatus::OnTheWay),
            "delivered" => Ok(DeliveryStatus::Delivered),
            "cancelled" => Ok(DeliveryStatus::Cancelled),
            other => Err(format!("Unknown delivery status: {}", other)),
        }
    }
}

/// A booking row with named fields. The positional column layout exists only
/// at the store boundary (`store::rows`).
#[derive(Debug, Clone)]
pub struct Booking {
    pub order_id: String,
    pub session_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub item_type: String,
    pub quantity: u32,
    pub special_requests: String,
    pub delivery_location: String,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub rider_id: Option<String>,
    pub rider_name: Option<String>,
    pub rider_phone: Option<String>,
    pub estimated_delivery: Option<String>,
    pub delivery_status: DeliveryStatus,
    pub assigned_at: Option<DateTime<Utc>>,
    pub category: Category,
}

/// Payload for creating a new booking. Field aliasing between the two
/// frontend generations is resolved in the API layer before this is built.
#[derive(Debug, Clone)]
pub struct BookingSubmission {
    pub category: Category,
    pub session_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub item_type: String,
    pub quantity: u32,
    pub special_requests: String,
    pub delivery_location: String,
    pub total_amount: f64,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub order_id: String,
    pub status: OrderStatus,
    pub delivery_status: DeliveryStatus,
}

/// Rider identity attached to an order on assignment.
#[derive(Debug, Clone)]
pub struct RiderAssignment {
    pub order_id: String,
    pub rider_id: String,
    pub rider_name: String,
    pub rider_phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_and_rejects_unknown() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        assert_eq!("FOOD".parse::<Category>().unwrap(), Category::Food);
        assert!("groceries".parse::<Category>().is_err());
    }

    #[test]
    fn statuses_use_wire_strings() {
        assert_eq!(DeliveryStatus::WaitingForRider.as_str(), "waiting_for_rider");
        assert_eq!(
            "on_the_way".parse::<DeliveryStatus>().unwrap(),
            DeliveryStatus::OnTheWay
        );
        assert_eq!("confirmed".parse::<OrderStatus>().unwrap(), OrderStatus::Confirmed);
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
