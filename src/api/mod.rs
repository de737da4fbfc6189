//! Request router: the single entry point for both frontend generations.
//!
//! POST carries an `action` field in the body; GET carries it as a query
//! parameter. Field aliases are normalized by [`request::Payload`] before
//! dispatch; every outcome becomes a structured [`response::ApiResponse`].

pub mod request;
pub mod response;
pub mod router;
pub mod views;

use chrono::Utc;
use serde_json::Value;
use tracing::{instrument, warn};

use crate::clients::{BookingClient, MessageClient, TrackingClient};
use crate::domain::{
    BookingSubmission, Category, DeliveryStatus, NewMessage, RiderAssignment, RiderLocation,
    SenderType, TrackingPatch,
};
use crate::error::BookingError;
use crate::status::progress_estimate;
use crate::store::rows::parse_ts;

use request::Payload;
use response::ApiResponse;
use views::{booking_summary, BookingStatusView, OrderStatusView, TrackingView};

/// Injected repository clients, constructed once per process.
#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingClient,
    pub tracking: TrackingClient,
    pub messages: MessageClient,
}

const ORDER_ID_ALIASES: &[&str] = &["orderId", "order_id"];

#[instrument(skip(state, payload))]
pub async fn dispatch_post(state: &AppState, payload: &Payload) -> ApiResponse {
    let Some(action) = payload.text(&["action"]) else {
        return ApiResponse::fail("Invalid action");
    };
    match action.as_str() {
        "submitBooking" => submit_booking(state, payload).await,
        "submit_booking" => submit_booking_compat(state, payload).await,
        "getOrderStatus" => get_order_status(state, payload).await,
        "assignRider" | "assign_rider" => assign_rider(state, payload).await,
        "updateDeliveryStatus" => update_delivery_status(state, payload).await,
        "confirmDelivery" => complete_booking(state, payload, "Delivery confirmed").await,
        "complete_booking" => complete_booking(state, payload, "Order completed").await,
        "send_message" => send_message(state, payload).await,
        "cancel_booking" => cancel_booking(state, payload).await,
        _ => ApiResponse::fail("Invalid action"),
    }
}

#[instrument(skip(state, params))]
pub async fn dispatch_get(state: &AppState, params: &Payload) -> ApiResponse {
    let Some(action) = params.text(&["action"]) else {
        return ApiResponse::fail("Missing action");
    };
    match action.as_str() {
        "get_all_bookings" => get_all_bookings(state, params).await,
        "get_booking_status" => get_booking_status(state, params).await,
        "get_delivery_status" => get_delivery_status(state, params).await,
        "get_messages" => get_messages(state, params).await,
        _ => ApiResponse::fail("Invalid GET action"),
    }
}

fn category_of(payload: &Payload) -> Category {
    payload
        .text(&["type"])
        .and_then(|t| t.parse().ok())
        .unwrap_or(Category::Food)
}

fn capitalized(category: Category) -> String {
    let s = category.as_str();
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Current-generation submit: canonical camelCase fields.
async fn submit_booking(state: &AppState, payload: &Payload) -> ApiResponse {
    let category = category_of(payload);
    let submission = BookingSubmission {
        category,
        session_id: payload.text(&["sessionId", "session_id"]).unwrap_or_default(),
        customer_name: payload.text(&["name"]).unwrap_or_default(),
        customer_phone: payload.text(&["phone"]).unwrap_or_default(),
        item_type: payload
            .text(&["foodType", "itemType"])
            .unwrap_or_else(|| capitalized(category)),
        quantity: payload.number(&["quantity"]).unwrap_or(1.0) as u32,
        special_requests: payload.text(&["specialRequests"]).unwrap_or_default(),
        delivery_location: payload.text(&["deliveryLocation"]).unwrap_or_default(),
        total_amount: payload.number(&["totalAmount"]).unwrap_or(0.0),
    };

    match state.bookings.submit(submission).await {
        Ok(receipt) => ApiResponse::ok("Booking submitted successfully")
            .with("orderId", &receipt.order_id)
            .with("status", receipt.status)
            .with("estimatedTime", "30-45 minutes")
            .with("deliveryStatus", receipt.delivery_status),
        Err(e) => ApiResponse::fail(format!("Failed to submit booking: {}", e)),
    }
}

/// Legacy submit: different field names, and the category-specific structured
/// extras are folded into the special-requests blob here.
async fn submit_booking_compat(state: &AppState, payload: &Payload) -> ApiResponse {
    let category = category_of(payload);
    let pickup = payload.text(&["pickupLocation"]).unwrap_or_default();
    let notes = payload.text(&["notes"]).unwrap_or_default();

    let special_requests = match category {
        Category::Laundry => serde_json::json!({
            "pickupLocation": pickup,
            "basketName": payload.text(&["basketName"]).unwrap_or_default(),
            "notes": notes,
        })
        .to_string(),
        Category::Food => serde_json::json!({
            "pickupLocation": pickup,
            "notes": notes,
        })
        .to_string(),
        Category::Parcel => serde_json::json!({
            "pickupPerson": payload.text(&["rider"]).unwrap_or_default(),
            "notes": notes,
        })
        .to_string(),
    };

    let submission = BookingSubmission {
        category,
        session_id: payload.text(&["sessionId", "session_id"]).unwrap_or_default(),
        customer_name: payload.text(&["customerName", "customer_name"]).unwrap_or_default(),
        customer_phone: payload
            .text(&["customerPhone", "customer_phone"])
            .unwrap_or_default(),
        item_type: payload
            .text(&["itemIdentity", "itemType"])
            .unwrap_or_else(|| capitalized(category)),
        quantity: payload.number(&["quantity"]).unwrap_or(1.0) as u32,
        special_requests,
        delivery_location: payload
            .text(&["deliveryLocation"])
            .unwrap_or_else(|| pickup.clone()),
        total_amount: payload.number(&["paymentCost"]).unwrap_or(0.0),
    };

    match state.bookings.submit(submission).await {
        Ok(receipt) => {
            ApiResponse::ok("Booking submitted successfully").with("order_id", &receipt.order_id)
        }
        Err(e) => ApiResponse::fail(format!("Failed to submit booking: {}", e)),
    }
}

/// Customer polling: latest booking for the session, with delivery progress
/// once a rider is attached.
async fn get_order_status(state: &AppState, payload: &Payload) -> ApiResponse {
    let Some(session_id) = payload.text(&["sessionId", "session_id"]) else {
        return ApiResponse::fail("Missing sessionId");
    };

    let booking = match state.bookings.latest_by_session(session_id).await {
        Ok(Some(booking)) => booking,
        Ok(None) => return ApiResponse::fail("No order found for this session"),
        Err(e) => return ApiResponse::fail(format!("Failed to get order status: {}", e)),
    };

    let delivery_progress: Option<TrackingView> = if booking.rider_id.is_some() {
        match state.tracking.get(booking.order_id.clone()).await {
            Ok(snapshot) => snapshot.as_ref().map(TrackingView::from),
            Err(e) => {
                warn!(error = %e, "Tracking lookup failed during status poll");
                None
            }
        }
    } else {
        None
    };

    ApiResponse::ok("Order status retrieved")
        .with("order", OrderStatusView::from(&booking))
        .with("deliveryProgress", delivery_progress)
        .with("lastUpdated", Utc::now())
}

async fn assign_rider(state: &AppState, payload: &Payload) -> ApiResponse {
    let Some(order_id) = payload.text(ORDER_ID_ALIASES) else {
        return ApiResponse::fail("Missing order_id");
    };
    let assignment = RiderAssignment {
        order_id,
        rider_id: payload.text(&["riderId", "rider_id"]).unwrap_or_default(),
        rider_name: payload.text(&["riderName", "rider_name"]).unwrap_or_default(),
        rider_phone: payload.text(&["riderPhone", "rider_phone"]).unwrap_or_default(),
    };

    match state.bookings.assign_rider(assignment).await {
        Ok(()) => ApiResponse::ok("Rider assigned successfully"),
        Err(BookingError::NotFound(_)) => ApiResponse::fail("Order not found"),
        Err(e) => ApiResponse::fail(format!("Failed to assign rider: {}", e)),
    }
}

async fn update_delivery_status(state: &AppState, payload: &Payload) -> ApiResponse {
    let Some(order_id) = payload.text(ORDER_ID_ALIASES) else {
        return ApiResponse::fail("Missing order_id");
    };
    let status: DeliveryStatus = match payload
        .text(&["deliveryStatus", "delivery_status", "status"])
        .map(|s| s.parse())
    {
        Some(Ok(status)) => status,
        Some(Err(e)) => return ApiResponse::fail(e),
        None => return ApiResponse::fail("Missing deliveryStatus"),
    };

    let rider_location: Option<RiderLocation> = payload
        .value(&["riderLocation", "rider_location"])
        .and_then(|v| match v {
            Value::String(s) => serde_json::from_str(s).ok(),
            other => serde_json::from_value(other.clone()).ok(),
        });
    let patch = TrackingPatch {
        rider_id: payload.text(&["riderId", "rider_id"]),
        rider_location,
        estimated_arrival: payload
            .text(&["estimatedArrival", "estimated_arrival"])
            .and_then(|s| parse_ts(&s)),
        notes: payload.text(&["notes"]),
    };

    match state.bookings.update_delivery(order_id, status, patch).await {
        Ok(()) => ApiResponse::ok("Delivery status updated"),
        Err(BookingError::NotFound(id)) => ApiResponse::fail(format!("Order not found: {}", id)),
        Err(e) => ApiResponse::fail(format!("Failed to update delivery status: {}", e)),
    }
}

async fn complete_booking(state: &AppState, payload: &Payload, done_message: &str) -> ApiResponse {
    let Some(order_id) = payload.text(ORDER_ID_ALIASES) else {
        return ApiResponse::fail("Missing order_id");
    };

    match state.bookings.complete(order_id.clone()).await {
        Ok(()) => ApiResponse::ok(done_message)
            .with("orderId", order_id)
            .with("deliveryStatus", DeliveryStatus::Delivered),
        Err(BookingError::NotFound(id)) => ApiResponse::fail(format!("Order not found: {}", id)),
        Err(e) => ApiResponse::fail(format!("Failed to complete booking: {}", e)),
    }
}

async fn send_message(state: &AppState, payload: &Payload) -> ApiResponse {
    let message = NewMessage {
        order_id: payload.text(ORDER_ID_ALIASES).unwrap_or_default(),
        sender_type: payload
            .text(&["sender_type", "senderType"])
            .and_then(|s| s.parse().ok())
            .unwrap_or(SenderType::Rider),
        sender_id: payload.text(&["sender_id", "senderId"]).unwrap_or_default(),
        text: payload.text(&["text"]).unwrap_or_default(),
    };

    match state.messages.send(message).await {
        Ok(()) => ApiResponse::ok("Message sent"),
        Err(e) => ApiResponse::fail(format!("Failed to send message: {}", e)),
    }
}

async fn cancel_booking(state: &AppState, payload: &Payload) -> ApiResponse {
    let Some(order_id) = payload.text(ORDER_ID_ALIASES) else {
        return ApiResponse::fail("Missing order_id");
    };

    match state.bookings.cancel(order_id.clone()).await {
        Ok(()) => ApiResponse::ok("Booking cancelled and removed from dashboard")
            .with("orderId", order_id)
            .with("status", "cancelled"),
        Err(BookingError::NotFound(id)) => ApiResponse::fail(format!("Order not found: {}", id)),
        Err(e) => ApiResponse::fail(format!("Failed to cancel booking: {}", e)),
    }
}

async fn get_all_bookings(state: &AppState, params: &Payload) -> ApiResponse {
    let type_param = params
        .text(&["type"])
        .unwrap_or_else(|| "all".to_string())
        .to_ascii_lowercase();
    let category = if type_param == "all" {
        None
    } else {
        match type_param.parse::<Category>() {
            Ok(category) => Some(category),
            // Unknown categories list as empty rather than failing, matching
            // what dashboards already expect.
            Err(_) => {
                warn!(type_param, "Unknown booking type in dashboard listing");
                return ApiResponse::ok("").with("bookings", Vec::<views::BookingSummary>::new());
            }
        }
    };

    match state.bookings.list(category).await {
        Ok(bookings) => {
            let summaries: Vec<_> = bookings.iter().filter_map(booking_summary).collect();
            ApiResponse::ok("").with("bookings", summaries)
        }
        Err(e) => ApiResponse::fail(format!("Failed to load bookings: {}", e)),
    }
}

async fn get_booking_status(state: &AppState, params: &Payload) -> ApiResponse {
    let Some(order_id) = params.text(ORDER_ID_ALIASES) else {
        return ApiResponse::fail("Missing order_id");
    };

    match state.bookings.find_by_order_id(order_id).await {
        Ok(Some(booking)) => {
            ApiResponse::ok("").with("booking", BookingStatusView::from(&booking))
        }
        Ok(None) => ApiResponse::fail("Order not found"),
        Err(e) => ApiResponse::fail(format!("Failed to get booking status: {}", e)),
    }
}

async fn get_delivery_status(state: &AppState, params: &Payload) -> ApiResponse {
    let Some(order_id) = params.text(ORDER_ID_ALIASES) else {
        return ApiResponse::fail("Missing order_id");
    };

    match state.tracking.get(order_id).await {
        Ok(Some(snapshot)) => {
            let estimate = progress_estimate(&snapshot, Utc::now());
            ApiResponse::ok("").with("delivery", estimate)
        }
        Ok(None) => ApiResponse::fail("No delivery record yet"),
        Err(e) => ApiResponse::fail(format!("Failed to get delivery status: {}", e)),
    }
}

async fn get_messages(state: &AppState, params: &Payload) -> ApiResponse {
    let Some(order_id) = params.text(ORDER_ID_ALIASES) else {
        return ApiResponse::fail("Missing order_id");
    };
    // An unparsable cursor falls back to the full history, like a bad Date
    // did upstream.
    let since = params.text(&["since"]).and_then(|s| parse_ts(&s));

    match state.messages.history(order_id, since).await {
        Ok(messages) => ApiResponse::ok("").with("messages", messages),
        Err(e) => ApiResponse::fail(format!("Failed to get messages: {}", e)),
    }
}
