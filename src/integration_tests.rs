//! End-to-end flows through the request router, with real services behind it.

use std::collections::HashMap;

use serde_json::json;

use crate::api::request::Payload;
use crate::api::response::ApiResponse;
use crate::api::{dispatch_get, dispatch_post, AppState};
use crate::app_system::DeliverySystem;

fn state() -> AppState {
    let system = DeliverySystem::new();
    AppState {
        bookings: system.booking_client.clone(),
        tracking: system.tracking_client.clone(),
        messages: system.message_client.clone(),
    }
}

async fn post(state: &AppState, body: serde_json::Value) -> ApiResponse {
    dispatch_post(state, &Payload::parse(&body.to_string())).await
}

async fn get(state: &AppState, pairs: &[(&str, &str)]) -> ApiResponse {
    let params: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    dispatch_get(state, &Payload::from_pairs(params)).await
}

#[tokio::test]
async fn full_order_lifecycle_through_the_router() {
    let state = state();

    // Submit through the legacy frontend shape.
    let response = post(
        &state,
        json!({
            "action": "submit_booking",
            "type": "food",
            "sessionId": "S1",
            "customerName": "Alice",
            "customerPhone": "0917",
            "itemIdentity": "Burger Meal",
            "quantity": 2,
            "pickupLocation": "Cafeteria",
            "notes": "extra ketchup",
            "paymentCost": 150,
        }),
    )
    .await;
    assert!(response.success, "submit failed: {}", response.message);
    let order_id = response.extra["order_id"].as_str().unwrap().to_string();
    assert!(order_id.starts_with("ORD-"));

    // Customer session poll sees the pending order.
    let response = post(&state, json!({"action": "getOrderStatus", "sessionId": "S1"})).await;
    assert!(response.success);
    let order = &response.extra["order"];
    assert_eq!(order["orderId"], order_id);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["deliveryStatus"], "waiting_for_rider");
    assert!(response.extra["deliveryProgress"].is_null());

    // Rider dashboard assigns with snake_case fields.
    let response = post(
        &state,
        json!({
            "action": "assign_rider",
            "order_id": order_id,
            "rider_id": "R001",
            "rider_name": "Jane",
            "rider_phone": "0999",
        }),
    )
    .await;
    assert!(response.success, "assign failed: {}", response.message);

    let response = get(&state, &[("action", "get_booking_status"), ("order_id", &order_id)]).await;
    assert!(response.success);
    assert_eq!(response.extra["booking"]["status"], "assigned");
    assert_eq!(response.extra["booking"]["rider_name"], "Jane");

    // Delivery progress reflects rider assignment.
    let response = get(&state, &[("action", "get_delivery_status"), ("order_id", &order_id)]).await;
    assert!(response.success);
    assert_eq!(response.extra["delivery"]["progress"], 40);

    // Rider marks the order on the way.
    let response = post(
        &state,
        json!({
            "action": "updateDeliveryStatus",
            "orderId": order_id,
            "deliveryStatus": "on_the_way",
            "riderLocation": {"lat": 14.6, "lng": 121.0},
        }),
    )
    .await;
    assert!(response.success, "update failed: {}", response.message);

    let response = get(&state, &[("action", "get_booking_status"), ("order_id", &order_id)]).await;
    assert_eq!(response.extra["booking"]["status"], "picked_up");
    let response = get(&state, &[("action", "get_delivery_status"), ("order_id", &order_id)]).await;
    assert_eq!(response.extra["delivery"]["progress"], 75);

    // Legacy completion flow.
    let response = post(&state, json!({"action": "complete_booking", "order_id": order_id})).await;
    assert!(response.success);
    assert_eq!(response.extra["deliveryStatus"], "delivered");

    let response = get(&state, &[("action", "get_booking_status"), ("order_id", &order_id)]).await;
    assert_eq!(response.extra["booking"]["status"], "delivered");
    let response = get(&state, &[("action", "get_delivery_status"), ("order_id", &order_id)]).await;
    assert_eq!(response.extra["delivery"]["progress"], 100);
}

#[tokio::test]
async fn cancelled_orders_disappear_from_the_dashboard_but_not_the_store() {
    let state = state();

    let response = post(
        &state,
        json!({
            "action": "submitBooking",
            "type": "parcel",
            "sessionId": "S2",
            "name": "Bob",
            "phone": "0918",
            "quantity": 1,
            "deliveryLocation": "Dorm C",
            "totalAmount": 80,
        }),
    )
    .await;
    assert!(response.success);
    let order_id = response.extra["orderId"].as_str().unwrap().to_string();

    let response = post(&state, json!({"action": "cancel_booking", "order_id": order_id})).await;
    assert!(response.success);
    assert_eq!(response.extra["status"], "cancelled");

    // Cancelling again still reports success and stays cancelled.
    let response = post(&state, json!({"action": "cancel_booking", "order_id": order_id})).await;
    assert!(response.success);

    let response = get(&state, &[("action", "get_all_bookings"), ("type", "parcel")]).await;
    assert!(response.success);
    assert_eq!(response.extra["bookings"].as_array().unwrap().len(), 0);

    let response = get(&state, &[("action", "get_booking_status"), ("order_id", &order_id)]).await;
    assert_eq!(response.extra["booking"]["status"], "cancelled");
}

#[tokio::test]
async fn messages_flow_with_since_cursor() {
    let state = state();

    let response = post(
        &state,
        json!({
            "action": "send_message",
            "order_id": "ORD-chat",
            "sender_type": "rider",
            "sender_id": "R001",
            "text": "On my way",
        }),
    )
    .await;
    assert!(response.success);

    let response = get(&state, &[("action", "get_messages"), ("order_id", "ORD-chat")]).await;
    let messages = response.extra["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    let cursor = messages[0]["timestamp"].as_str().unwrap().to_string();

    let response = post(
        &state,
        json!({
            "action": "send_message",
            "orderId": "ORD-chat",
            "senderType": "customer",
            "senderId": "S1",
            "text": "Thanks!",
        }),
    )
    .await;
    assert!(response.success);

    let response = get(
        &state,
        &[("action", "get_messages"), ("order_id", "ORD-chat"), ("since", &cursor)],
    )
    .await;
    let messages = response.extra["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "Thanks!");
    assert_eq!(messages[0]["sender_type"], "customer");

    // Missing text is a reported validation failure.
    let response = post(&state, json!({"action": "send_message", "order_id": "ORD-chat"})).await;
    assert!(!response.success);
}

#[tokio::test]
async fn form_encoded_bodies_and_bad_actions() {
    let state = state();

    let payload = Payload::parse("action=assign_rider&order_id=ORD-nope&rider_id=R001");
    let response = dispatch_post(&state, &payload).await;
    assert!(!response.success);
    assert_eq!(response.message, "Order not found");

    let response = post(&state, json!({"action": "warp_drive"})).await;
    assert!(!response.success);
    assert_eq!(response.message, "Invalid action");

    let response = get(&state, &[("action", "teleport")]).await;
    assert_eq!(response.message, "Invalid GET action");

    let response = get(&state, &[("order_id", "ORD-1")]).await;
    assert_eq!(response.message, "Missing action");
}

#[tokio::test]
async fn unknown_booking_type_lists_as_empty_success() {
    let state = state();

    let response = post(
        &state,
        json!({
            "action": "submitBooking",
            "type": "food",
            "sessionId": "S9",
            "name": "Cara",
            "phone": "0919",
        }),
    )
    .await;
    assert!(response.success);

    let response = get(&state, &[("action", "get_all_bookings"), ("type", "groceries")]).await;
    assert!(response.success);
    assert_eq!(response.extra["bookings"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn assignment_requires_an_order_id() {
    let state = state();
    let response = post(&state, json!({"action": "assignRider", "riderId": "R001"})).await;
    assert!(!response.success);
    assert_eq!(response.message, "Missing order_id");
}
