use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::domain::{
    Booking, BookingSubmission, Category, ChatMessage, DeliveryStatus, NewMessage,
    RiderAssignment, SubmitReceipt, TrackingPatch, TrackingSnapshot,
};
use crate::error::{BookingError, MessageError, TrackingError};

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

/// Typed message enums for actor communication. Each variant includes
/// parameters and a oneshot channel for responses.

#[derive(Debug)]
pub enum BookingRequest {
    Submit {
        submission: BookingSubmission,
        respond_to: ServiceResponse<SubmitReceipt, BookingError>,
    },
    FindByOrderId {
        order_id: String,
        respond_to: ServiceResponse<Option<Booking>, BookingError>,
    },
    LatestBySession {
        session_id: String,
        respond_to: ServiceResponse<Option<Booking>, BookingError>,
    },
    List {
        category: Option<Category>,
        respond_to: ServiceResponse<Vec<Booking>, BookingError>,
    },
    AssignRider {
        assignment: RiderAssignment,
        respond_to: ServiceResponse<(), BookingError>,
    },
    UpdateDelivery {
        order_id: String,
        status: DeliveryStatus,
        patch: TrackingPatch,
        respond_to: ServiceResponse<(), BookingError>,
    },
    Complete {
        order_id: String,
        respond_to: ServiceResponse<(), BookingError>,
    },
    Cancel {
        order_id: String,
        respond_to: ServiceResponse<(), BookingError>,
    },
    Shutdown,
    #[cfg(test)]
    GetBookingCount {
        respond_to: ServiceResponse<usize, BookingError>,
    },
}

#[derive(Debug)]
pub enum TrackingRequest {
    Initialize {
        order_id: String,
        session_id: String,
        respond_to: ServiceResponse<(), TrackingError>,
    },
    Update {
        order_id: String,
        status: DeliveryStatus,
        patch: TrackingPatch,
        respond_to: ServiceResponse<(), TrackingError>,
    },
    Get {
        order_id: String,
        respond_to: ServiceResponse<Option<TrackingSnapshot>, TrackingError>,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum MessageRequest {
    Send {
        message: NewMessage,
        respond_to: ServiceResponse<(), MessageError>,
    },
    History {
        order_id: String,
        since: Option<DateTime<Utc>>,
        respond_to: ServiceResponse<Vec<ChatMessage>, MessageError>,
    },
    Shutdown,
}
