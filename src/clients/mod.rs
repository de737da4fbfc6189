use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

use crate::domain::{
    Booking, BookingSubmission, Category, ChatMessage, DeliveryStatus, NewMessage,
    RiderAssignment, SubmitReceipt, TrackingPatch, TrackingSnapshot,
};
use crate::error::{BookingError, MessageError, TrackingError};
use crate::messages::{BookingRequest, MessageRequest, TrackingRequest};

/// Generate client methods with oneshot channel boilerplate and automatic
/// tracing. Every service error enum carries an `ActorCommunicationError`
/// variant for channel failures.
macro_rules! client_method {
    ($client:ty => fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident, Error = $error_type:ty) => {
        impl $client {
            #[instrument(skip(self))]
            pub async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, $error_type> {
                debug!("Sending request");
                let (respond_to, response) = oneshot::channel();
                self.sender.send($request::$variant {
                    $($param,)*
                    respond_to,
                }).await.map_err(|_| <$error_type>::ActorCommunicationError("Actor closed".to_string()))?;

                response.await.map_err(|_| <$error_type>::ActorCommunicationError("Actor dropped".to_string()))?
            }
        }
    };
}

macro_rules! shutdown_method {
    ($client:ty, $request:ident) => {
        impl $client {
            #[instrument(skip(self))]
            pub async fn shutdown(&self) -> Result<(), String> {
                debug!("Sending shutdown request");
                self.sender
                    .send($request::Shutdown)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(())
            }
        }
    };
}

/// Client for the booking service (the order repository).
#[derive(Clone)]
pub struct BookingClient {
    sender: mpsc::Sender<BookingRequest>,
}

impl BookingClient {
    pub fn new(sender: mpsc::Sender<BookingRequest>) -> Self {
        Self { sender }
    }
}

client_method!(BookingClient => fn submit(submission: BookingSubmission) -> SubmitReceipt as BookingRequest::Submit, Error = BookingError);
client_method!(BookingClient => fn find_by_order_id(order_id: String) -> Option<Booking> as BookingRequest::FindByOrderId, Error = BookingError);
client_method!(BookingClient => fn latest_by_session(session_id: String) -> Option<Booking> as BookingRequest::LatestBySession, Error = BookingError);
client_method!(BookingClient => fn list(category: Option<Category>) -> Vec<Booking> as BookingRequest::List, Error = BookingError);
client_method!(BookingClient => fn assign_rider(assignment: RiderAssignment) -> () as BookingRequest::AssignRider, Error = BookingError);
client_method!(BookingClient => fn update_delivery(order_id: String, status: DeliveryStatus, patch: TrackingPatch) -> () as BookingRequest::UpdateDelivery, Error = BookingError);
client_method!(BookingClient => fn complete(order_id: String) -> () as BookingRequest::Complete, Error = BookingError);
client_method!(BookingClient => fn cancel(order_id: String) -> () as BookingRequest::Cancel, Error = BookingError);
shutdown_method!(BookingClient, BookingRequest);

// Test-only method for internal state inspection
#[cfg(test)]
client_method!(BookingClient => fn get_booking_count() -> usize as BookingRequest::GetBookingCount, Error = BookingError);

/// Client for the delivery tracking service.
#[derive(Clone)]
pub struct TrackingClient {
    sender: mpsc::Sender<TrackingRequest>,
}

impl TrackingClient {
    pub fn new(sender: mpsc::Sender<TrackingRequest>) -> Self {
        Self { sender }
    }
}

client_method!(TrackingClient => fn initialize(order_id: String, session_id: String) -> () as TrackingRequest::Initialize, Error = TrackingError);
client_method!(TrackingClient => fn update(order_id: String, status: DeliveryStatus, patch: TrackingPatch) -> () as TrackingRequest::Update, Error = TrackingError);
client_method!(TrackingClient => fn get(order_id: String) -> Option<TrackingSnapshot> as TrackingRequest::Get, Error = TrackingError);
shutdown_method!(TrackingClient, TrackingRequest);

/// Client for the rider/customer messaging service.
#[derive(Clone)]
pub struct MessageClient {
    sender: mpsc::Sender<MessageRequest>,
}

impl MessageClient {
    pub fn new(sender: mpsc::Sender<MessageRequest>) -> Self {
        Self { sender }
    }
}

client_method!(MessageClient => fn send(message: NewMessage) -> () as MessageRequest::Send, Error = MessageError);
client_method!(MessageClient => fn history(order_id: String, since: Option<DateTime<Utc>>) -> Vec<ChatMessage> as MessageRequest::History, Error = MessageError);
shutdown_method!(MessageClient, MessageRequest);
