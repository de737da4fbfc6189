//! Row codec: the one place that knows which field sits in which column.
//!
//! The column order mirrors the legacy data layout exactly, so rows written
//! by the previous backend decode without migration.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::{
    Booking, BookingSubmission, Category, ChatMessage, DeliveryStatus, NewMessage, OrderStatus,
    RiderLocation, SenderType, TrackingSnapshot,
};
use crate::store::Schema;

/// Booking table columns. New tables are created 15 wide; RIDER_PHONE and
/// ASSIGNED_AT are appended on first rider assignment.
pub mod booking_col {
    pub const ORDER_ID: usize = 0;
    pub const SESSION_ID: usize = 1;
    pub const NAME: usize = 2;
    pub const PHONE: usize = 3;
    pub const ITEM_TYPE: usize = 4;
    pub const QUANTITY: usize = 5;
    pub const SPECIAL_REQUESTS: usize = 6;
    pub const DELIVERY_LOCATION: usize = 7;
    pub const TOTAL_AMOUNT: usize = 8;
    pub const STATUS: usize = 9;
    pub const TIMESTAMP: usize = 10;
    pub const RIDER_ID: usize = 11;
    pub const RIDER_NAME: usize = 12;
    pub const ESTIMATED_DELIVERY: usize = 13;
    pub const DELIVERY_STATUS: usize = 14;
    pub const RIDER_PHONE: usize = 15;
    pub const ASSIGNED_AT: usize = 16;
}

pub mod tracking_col {
    pub const ORDER_ID: usize = 0;
    pub const SESSION_ID: usize = 1;
    pub const STATUS: usize = 2;
    pub const TIMESTAMP: usize = 3;
    pub const RIDER_ID: usize = 4;
    pub const RIDER_LOCATION: usize = 5;
    pub const ESTIMATED_ARRIVAL: usize = 6;
    pub const NOTES: usize = 7;
    pub const LAST_UPDATED: usize = 8;
}

pub mod message_col {
    pub const TIMESTAMP: usize = 0;
    pub const ORDER_ID: usize = 1;
    pub const SENDER_TYPE: usize = 2;
    pub const SENDER_ID: usize = 3;
    pub const TEXT: usize = 4;
}

pub const BOOKING_HEADERS: &[&str] = &[
    "OrderID",
    "SessionID",
    "Name",
    "Phone",
    "ItemType",
    "Quantity",
    "SpecialRequests",
    "DeliveryLocation",
    "TotalAmount",
    "Status",
    "Timestamp",
    "RiderID",
    "RiderName",
    "EstimatedDelivery",
    "DeliveryStatus",
];

pub const TRACKING_HEADERS: &[&str] = &[
    "OrderID",
    "SessionID",
    "Status",
    "Timestamp",
    "RiderID",
    "RiderLocation",
    "EstimatedArrival",
    "Notes",
    "LastUpdated",
];

pub const MESSAGE_HEADERS: &[&str] = &[
    "Timestamp",
    "OrderID",
    "SenderType",
    "SenderID",
    "MessageText",
];

pub fn booking_schema(category: Category) -> Schema {
    Schema {
        name: category.table_name(),
        headers: BOOKING_HEADERS,
    }
}

pub const TRACKING_SCHEMA: Schema = Schema {
    name: "Deliveries",
    headers: TRACKING_HEADERS,
};

pub const MESSAGE_SCHEMA: Schema = Schema {
    name: "Messages",
    headers: MESSAGE_HEADERS,
};

fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

/// Lenient timestamp decode: empty or unparsable cells become None.
pub fn parse_ts(cell: &str) -> Option<DateTime<Utc>> {
    if cell.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(cell) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(_) => {
            warn!(cell, "Unparsable timestamp cell");
            None
        }
    }
}

fn opt_cell(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

fn cell_or_empty(row: &[String], column: usize) -> &str {
    row.get(column).map(String::as_str).unwrap_or("")
}

/// Builds the 15-cell row for a fresh booking (columns 16-17 appear later).
pub fn new_booking_row(
    order_id: &str,
    submission: &BookingSubmission,
    now: DateTime<Utc>,
) -> Vec<String> {
    vec![
        order_id.to_string(),
        submission.session_id.clone(),
        submission.customer_name.clone(),
        submission.customer_phone.clone(),
        submission.item_type.clone(),
        submission.quantity.to_string(),
        submission.special_requests.clone(),
        submission.delivery_location.clone(),
        submission.total_amount.to_string(),
        OrderStatus::Pending.to_string(),
        encode_ts(now),
        String::new(), // rider id
        String::new(), // rider name
        String::new(), // estimated delivery
        DeliveryStatus::WaitingForRider.to_string(),
    ]
}

/// Decodes a booking row. Lenient like the legacy reader: malformed numeric
/// or status cells fall back to defaults instead of failing the scan.
pub fn decode_booking(category: Category, row: &[String]) -> Booking {
    Booking {
        order_id: cell_or_empty(row, booking_col::ORDER_ID).to_string(),
        session_id: cell_or_empty(row, booking_col::SESSION_ID).to_string(),
        customer_name: cell_or_empty(row, booking_col::NAME).to_string(),
        customer_phone: cell_or_empty(row, booking_col::PHONE).to_string(),
        item_type: cell_or_empty(row, booking_col::ITEM_TYPE).to_string(),
        quantity: cell_or_empty(row, booking_col::QUANTITY).parse().unwrap_or(1),
        special_requests: cell_or_empty(row, booking_col::SPECIAL_REQUESTS).to_string(),
        delivery_location: cell_or_empty(row, booking_col::DELIVERY_LOCATION).to_string(),
        total_amount: cell_or_empty(row, booking_col::TOTAL_AMOUNT)
            .parse()
            .unwrap_or(0.0),
        status: cell_or_empty(row, booking_col::STATUS)
            .parse()
            .unwrap_or(OrderStatus::Pending),
        created_at: parse_ts(cell_or_empty(row, booking_col::TIMESTAMP))
            .unwrap_or(DateTime::UNIX_EPOCH),
        rider_id: opt_cell(cell_or_empty(row, booking_col::RIDER_ID)),
        rider_name: opt_cell(cell_or_empty(row, booking_col::RIDER_NAME)),
        rider_phone: opt_cell(cell_or_empty(row, booking_col::RIDER_PHONE)),
        estimated_delivery: opt_cell(cell_or_empty(row, booking_col::ESTIMATED_DELIVERY)),
        delivery_status: cell_or_empty(row, booking_col::DELIVERY_STATUS)
            .parse()
            .unwrap_or(DeliveryStatus::WaitingForRider),
        assigned_at: parse_ts(cell_or_empty(row, booking_col::ASSIGNED_AT)),
        category,
    }
}

pub fn new_tracking_row(order_id: &str, session_id: &str, now: DateTime<Utc>) -> Vec<String> {
    vec![
        order_id.to_string(),
        session_id.to_string(),
        DeliveryStatus::WaitingForRider.to_string(),
        encode_ts(now),
        String::new(), // rider id
        String::new(), // rider location
        String::new(), // estimated arrival
        String::new(), // notes
        encode_ts(now),
    ]
}

pub fn decode_tracking(row: &[String]) -> TrackingSnapshot {
    let location_cell = cell_or_empty(row, tracking_col::RIDER_LOCATION);
    let rider_location: Option<RiderLocation> = if location_cell.is_empty() {
        None
    } else {
        match serde_json::from_str(location_cell) {
            Ok(loc) => Some(loc),
            Err(e) => {
                warn!(error = %e, "Unparsable rider location cell");
                None
            }
        }
    };
    TrackingSnapshot {
        order_id: cell_or_empty(row, tracking_col::ORDER_ID).to_string(),
        session_id: cell_or_empty(row, tracking_col::SESSION_ID).to_string(),
        status: cell_or_empty(row, tracking_col::STATUS)
            .parse()
            .unwrap_or(DeliveryStatus::WaitingForRider),
        created_at: parse_ts(cell_or_empty(row, tracking_col::TIMESTAMP))
            .unwrap_or(DateTime::UNIX_EPOCH),
        rider_id: opt_cell(cell_or_empty(row, tracking_col::RIDER_ID)),
        rider_location,
        estimated_arrival: parse_ts(cell_or_empty(row, tracking_col::ESTIMATED_ARRIVAL)),
        notes: opt_cell(cell_or_empty(row, tracking_col::NOTES)),
        last_updated: parse_ts(cell_or_empty(row, tracking_col::LAST_UPDATED))
            .unwrap_or(DateTime::UNIX_EPOCH),
    }
}

pub fn encode_rider_location(location: &RiderLocation) -> String {
    // Infallible for a plain lat/lng struct.
    serde_json::to_string(location).unwrap_or_default()
}

pub fn encode_timestamp(ts: DateTime<Utc>) -> String {
    encode_ts(ts)
}

pub fn new_message_row(message: &NewMessage, now: DateTime<Utc>) -> Vec<String> {
    vec![
        encode_ts(now),
        message.order_id.clone(),
        message.sender_type.to_string(),
        message.sender_id.clone(),
        message.text.clone(),
    ]
}

pub fn decode_message(row: &[String]) -> ChatMessage {
    ChatMessage {
        timestamp: parse_ts(cell_or_empty(row, message_col::TIMESTAMP))
            .unwrap_or(DateTime::UNIX_EPOCH),
        order_id: cell_or_empty(row, message_col::ORDER_ID).to_string(),
        sender_type: cell_or_empty(row, message_col::SENDER_TYPE)
            .parse()
            .unwrap_or(SenderType::Rider),
        sender_id: cell_or_empty(row, message_col::SENDER_ID).to_string(),
        text: cell_or_empty(row, message_col::TEXT).to_string(),
    }
}
