pub mod booking;
pub mod messaging;
pub mod tracking;

pub use booking::BookingService;
pub use messaging::MessageService;
pub use tracking::TrackingService;
