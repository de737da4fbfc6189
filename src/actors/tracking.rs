use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::clients::TrackingClient;
use crate::domain::{DeliveryStatus, TrackingPatch, TrackingSnapshot};
use crate::error::TrackingError;
use crate::messages::{ServiceResponse, TrackingRequest};
use crate::store::rows::{
    decode_tracking, encode_rider_location, encode_timestamp, new_tracking_row, tracking_col,
    TRACKING_SCHEMA,
};
use crate::store::Table;

/// Delivery tracking repository: one record per order id in the Deliveries
/// table, mutated in place on status transitions.
pub struct TrackingService {
    receiver: mpsc::Receiver<TrackingRequest>,
    deliveries: Table,
}

impl TrackingService {
    pub fn new(buffer_size: usize) -> (Self, TrackingClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            deliveries: Table::open(TRACKING_SCHEMA),
        };
        let client = TrackingClient::new(sender);
        (service, client)
    }

    #[instrument(name = "tracking_service", skip(self))]
    pub async fn run(mut self) {
        info!("TrackingService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                TrackingRequest::Initialize {
                    order_id,
                    session_id,
                    respond_to,
                } => {
                    self.handle_initialize(order_id, session_id, respond_to);
                }
                TrackingRequest::Update {
                    order_id,
                    status,
                    patch,
                    respond_to,
                } => {
                    self.handle_update(order_id, status, patch, respond_to);
                }
                TrackingRequest::Get { order_id, respond_to } => {
                    self.handle_get(order_id, respond_to);
                }
                TrackingRequest::Shutdown => {
                    info!("TrackingService shutting down");
                    break;
                }
            }
        }

        info!("TrackingService stopped");
    }

    /// Appends a fresh `waiting_for_rider` record. A record that already
    /// exists is left alone so the one-record-per-order invariant holds.
    #[instrument(fields(order_id = %order_id), skip(self, respond_to))]
    fn handle_initialize(
        &mut self,
        order_id: String,
        session_id: String,
        respond_to: ServiceResponse<(), TrackingError>,
    ) {
        debug!("Processing initialize request");

        if self.deliveries.find(tracking_col::ORDER_ID, &order_id).is_some() {
            debug!("Tracking record already exists, keeping it");
            let _ = respond_to.send(Ok(()));
            return;
        }

        self.deliveries
            .append(new_tracking_row(&order_id, &session_id, Utc::now()));
        info!("Tracking record initialized");
        let _ = respond_to.send(Ok(()));
    }

    /// Updates status and last-updated unconditionally; patch fields only when
    /// present. Silently a no-op when no record exists yet.
    #[instrument(fields(order_id = %order_id, status = %status), skip(self, patch, respond_to))]
    fn handle_update(
        &mut self,
        order_id: String,
        status: DeliveryStatus,
        patch: TrackingPatch,
        respond_to: ServiceResponse<(), TrackingError>,
    ) {
        debug!("Processing update request");

        let Some(row) = self.deliveries.find(tracking_col::ORDER_ID, &order_id) else {
            debug!("No tracking record yet, skipping update");
            let _ = respond_to.send(Ok(()));
            return;
        };

        let result = self.apply_update(row, status, patch);
        if result.is_ok() {
            info!("Tracking record updated");
        }
        let _ = respond_to.send(result);
    }

    fn apply_update(
        &mut self,
        row: usize,
        status: DeliveryStatus,
        patch: TrackingPatch,
    ) -> Result<(), TrackingError> {
        let now = Utc::now();
        self.deliveries
            .set_cell(row, tracking_col::STATUS, status.to_string())?;
        self.deliveries
            .set_cell(row, tracking_col::LAST_UPDATED, encode_timestamp(now))?;

        if let Some(rider_id) = patch.rider_id {
            self.deliveries.set_cell(row, tracking_col::RIDER_ID, rider_id)?;
        }
        if let Some(location) = patch.rider_location {
            self.deliveries.set_cell(
                row,
                tracking_col::RIDER_LOCATION,
                encode_rider_location(&location),
            )?;
        }
        if let Some(eta) = patch.estimated_arrival {
            self.deliveries
                .set_cell(row, tracking_col::ESTIMATED_ARRIVAL, encode_timestamp(eta))?;
        }
        if let Some(notes) = patch.notes {
            self.deliveries.set_cell(row, tracking_col::NOTES, notes)?;
        }
        Ok(())
    }

    #[instrument(fields(order_id = %order_id), skip(self, respond_to))]
    fn handle_get(
        &self,
        order_id: String,
        respond_to: ServiceResponse<Option<TrackingSnapshot>, TrackingError>,
    ) {
        debug!("Processing get request");

        let snapshot = self
            .deliveries
            .find(tracking_col::ORDER_ID, &order_id)
            .and_then(|row| self.deliveries.row(row))
            .map(decode_tracking);

        match &snapshot {
            Some(s) => debug!(status = %s.status, "Tracking record found"),
            None => debug!("Tracking record not found"),
        }

        let _ = respond_to.send(Ok(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiderLocation;

    async fn spawn() -> TrackingClient {
        let (service, client) = TrackingService::new(10);
        tokio::spawn(service.run());
        client
    }

    #[tokio::test]
    async fn initialize_then_get() {
        let client = spawn().await;
        client.initialize("ORD-1".into(), "S1".into()).await.unwrap();

        let snapshot = client.get("ORD-1".into()).await.unwrap().unwrap();
        assert_eq!(snapshot.status, DeliveryStatus::WaitingForRider);
        assert_eq!(snapshot.session_id, "S1");
        assert_eq!(snapshot.rider_id, None);
    }

    #[tokio::test]
    async fn initialize_twice_keeps_one_record() {
        let client = spawn().await;
        client.initialize("ORD-1".into(), "S1".into()).await.unwrap();
        client
            .update(
                "ORD-1".into(),
                DeliveryStatus::RiderAssigned,
                TrackingPatch {
                    rider_id: Some("R001".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        client.initialize("ORD-1".into(), "S1".into()).await.unwrap();

        let snapshot = client.get("ORD-1".into()).await.unwrap().unwrap();
        assert_eq!(snapshot.status, DeliveryStatus::RiderAssigned);
        assert_eq!(snapshot.rider_id.as_deref(), Some("R001"));
    }

    #[tokio::test]
    async fn partial_update_leaves_absent_fields_untouched() {
        let client = spawn().await;
        client.initialize("ORD-1".into(), "S1".into()).await.unwrap();
        client
            .update(
                "ORD-1".into(),
                DeliveryStatus::OnTheWay,
                TrackingPatch {
                    rider_id: Some("R001".into()),
                    rider_location: Some(RiderLocation { lat: 1.0, lng: 2.0 }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        // Second update patches nothing but the status.
        client
            .update(
                "ORD-1".into(),
                DeliveryStatus::Delivered,
                TrackingPatch::default(),
            )
            .await
            .unwrap();

        let snapshot = client.get("ORD-1".into()).await.unwrap().unwrap();
        assert_eq!(snapshot.status, DeliveryStatus::Delivered);
        assert_eq!(snapshot.rider_id.as_deref(), Some("R001"));
        assert!(snapshot.rider_location.is_some());
    }

    #[tokio::test]
    async fn update_without_record_is_a_silent_noop() {
        let client = spawn().await;
        client
            .update(
                "ORD-missing".into(),
                DeliveryStatus::OnTheWay,
                TrackingPatch::default(),
            )
            .await
            .unwrap();
        assert!(client.get("ORD-missing".into()).await.unwrap().is_none());
    }
}
