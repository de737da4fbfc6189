use tracing::{error, info, instrument};

use crate::actors::{BookingService, MessageService, TrackingService};
use crate::clients::{BookingClient, MessageClient, TrackingClient};

/// The main application system that starts all services, wires them
/// together, and handles shutdown.
pub struct DeliverySystem {
    pub booking_client: BookingClient,
    pub tracking_client: TrackingClient,
    pub message_client: MessageClient,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Default for DeliverySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliverySystem {
    /// Startup order: tracking first (bookings depend on it), then the
    /// booking service with the tracking client injected, then messaging.
    #[instrument(name = "delivery_system")]
    pub fn new() -> Self {
        let mut handles = Vec::new();

        info!("Starting delivery system");

        let (tracking_service, tracking_client) = TrackingService::new(32);
        handles.push(tokio::spawn(tracking_service.run()));

        let (booking_service, booking_client) = BookingService::new(32, tracking_client.clone());
        handles.push(tokio::spawn(booking_service.run()));

        let (message_service, message_client) = MessageService::new(32);
        handles.push(tokio::spawn(message_service.run()));

        info!("Delivery system started");

        Self {
            booking_client,
            tracking_client,
            message_client,
            handles,
        }
    }

    /// Shuts services down in dependency order (bookings before tracking) and
    /// waits for all tasks to finish. Errors are logged but shutdown
    /// continues to avoid hangs.
    #[instrument(skip(self))]
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down delivery system");

        let _ = self.booking_client.shutdown().await;
        let _ = self.message_client.shutdown().await;
        let _ = self.tracking_client.shutdown().await;

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = ?e, "Service shutdown error");
            }
        }

        info!("Delivery system shutdown complete");
        Ok(())
    }
}
