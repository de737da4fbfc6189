//! Background sweep: a simulation stand-in for a real dispatch/ETA engine.
//!
//! One pass auto-assigns a rider to bookings left pending too long and pushes
//! a fresh `on_the_way` ETA for confirmed bookings that already have one. The
//! assignment policy lives behind [`DispatchStrategy`] so it can be replaced
//! without touching the sweep itself.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::clients::BookingClient;
use crate::domain::{DeliveryStatus, OrderStatus, Rider, RiderAssignment, TrackingPatch};

/// Pluggable rider selection and ETA computation.
pub trait DispatchStrategy: Send + Sync {
    fn pick_rider(&self) -> Rider;
    fn estimated_arrival(&self, now: DateTime<Utc>) -> DateTime<Utc>;
}

/// Default simulation: a small fixed pool picked at random, 25-45 minute ETA.
pub struct RiderPool {
    riders: Vec<Rider>,
}

impl Default for RiderPool {
    fn default() -> Self {
        Self {
            riders: vec![
                Rider::new("R001", "John Doe", ""),
                Rider::new("R002", "Jane Smith", ""),
                Rider::new("R003", "Mike Johnson", ""),
            ],
        }
    }
}

impl DispatchStrategy for RiderPool {
    fn pick_rider(&self) -> Rider {
        let index = rand::thread_rng().gen_range(0..self.riders.len());
        self.riders[index].clone()
    }

    fn estimated_arrival(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let minutes = rand::thread_rng().gen_range(25..=45);
        now + Duration::minutes(minutes)
    }
}

pub struct Sweeper {
    bookings: BookingClient,
    strategy: Arc<dyn DispatchStrategy>,
    pending_threshold: Duration,
}

impl Sweeper {
    pub fn new(
        bookings: BookingClient,
        strategy: Arc<dyn DispatchStrategy>,
        pending_threshold: Duration,
    ) -> Self {
        Self {
            bookings,
            strategy,
            pending_threshold,
        }
    }

    /// Runs forever on an interval. A single task drives the loop, so one
    /// sweep can never overlap the next.
    pub async fn run(self, every: std::time::Duration) {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    #[instrument(name = "sweep", skip(self))]
    pub async fn sweep_once(&self) {
        let bookings = match self.bookings.list(None).await {
            Ok(bookings) => bookings,
            Err(e) => {
                warn!(error = %e, "Sweep could not list bookings");
                return;
            }
        };

        let now = Utc::now();
        for booking in bookings {
            match booking.status {
                OrderStatus::Pending
                    if booking.rider_id.is_none()
                        && now - booking.created_at > self.pending_threshold =>
                {
                    self.auto_assign(&booking.order_id).await;
                }
                OrderStatus::Confirmed if booking.rider_id.is_some() => {
                    self.refresh_eta(&booking.order_id, now).await;
                }
                _ => {}
            }
        }
    }

    async fn auto_assign(&self, order_id: &str) {
        let rider = self.strategy.pick_rider();
        info!(order_id, rider_id = %rider.id, "Auto-assigning rider to stale pending order");
        let assignment = RiderAssignment {
            order_id: order_id.to_string(),
            rider_id: rider.id,
            rider_name: rider.name,
            rider_phone: rider.phone,
        };
        if let Err(e) = self.bookings.assign_rider(assignment).await {
            warn!(order_id, error = %e, "Auto-assignment failed");
        }
    }

    async fn refresh_eta(&self, order_id: &str, now: DateTime<Utc>) {
        let eta = self.strategy.estimated_arrival(now);
        debug!(order_id, eta = %eta, "Refreshing delivery estimate");
        let patch = TrackingPatch {
            estimated_arrival: Some(eta),
            ..Default::default()
        };
        if let Err(e) = self
            .bookings
            .update_delivery(order_id.to_string(), DeliveryStatus::OnTheWay, patch)
            .await
        {
            warn!(order_id, error = %e, "Delivery estimate update failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::{BookingService, TrackingService};
    use crate::clients::TrackingClient;
    use crate::domain::{BookingSubmission, Category};

    struct FixedStrategy;

    impl DispatchStrategy for FixedStrategy {
        fn pick_rider(&self) -> Rider {
            Rider::new("R042", "Test Rider", "0900")
        }

        fn estimated_arrival(&self, now: DateTime<Utc>) -> DateTime<Utc> {
            now + Duration::minutes(30)
        }
    }

    async fn spawn() -> (BookingClient, TrackingClient) {
        let (tracking_service, tracking_client) = TrackingService::new(10);
        tokio::spawn(tracking_service.run());
        let (booking_service, booking_client) = BookingService::new(10, tracking_client.clone());
        tokio::spawn(booking_service.run());
        (booking_client, tracking_client)
    }

    fn submission() -> BookingSubmission {
        BookingSubmission {
            category: Category::Food,
            session_id: "S1".into(),
            customer_name: "Alice".into(),
            customer_phone: "0917".into(),
            item_type: "Burger".into(),
            quantity: 1,
            special_requests: String::new(),
            delivery_location: "Dorm A".into(),
            total_amount: 50.0,
        }
    }

    #[tokio::test]
    async fn sweep_assigns_then_advances_to_on_the_way() {
        let (bookings, tracking) = spawn().await;
        let receipt = bookings.submit(submission()).await.unwrap();

        // Zero threshold: every pending order is immediately stale.
        let sweeper = Sweeper::new(bookings.clone(), Arc::new(FixedStrategy), Duration::zero());

        sweeper.sweep_once().await;
        let booking = bookings
            .find_by_order_id(receipt.order_id.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(booking.status, OrderStatus::Confirmed);
        assert_eq!(booking.rider_id.as_deref(), Some("R042"));

        sweeper.sweep_once().await;
        let booking = bookings
            .find_by_order_id(receipt.order_id.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(booking.delivery_status, DeliveryStatus::OnTheWay);

        let snapshot = tracking.get(receipt.order_id).await.unwrap().unwrap();
        assert_eq!(snapshot.status, DeliveryStatus::OnTheWay);
        assert!(snapshot.estimated_arrival.is_some());
    }

    #[tokio::test]
    async fn sweep_leaves_fresh_pending_orders_alone() {
        let (bookings, _) = spawn().await;
        let receipt = bookings.submit(submission()).await.unwrap();

        let sweeper = Sweeper::new(
            bookings.clone(),
            Arc::new(FixedStrategy),
            Duration::minutes(5),
        );
        sweeper.sweep_once().await;

        let booking = bookings
            .find_by_order_id(receipt.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(booking.status, OrderStatus::Pending);
        assert_eq!(booking.rider_id, None);
    }

    #[tokio::test]
    async fn sweep_skips_terminal_orders() {
        let (bookings, _) = spawn().await;
        let receipt = bookings.submit(submission()).await.unwrap();
        bookings.cancel(receipt.order_id.clone()).await.unwrap();

        let sweeper = Sweeper::new(bookings.clone(), Arc::new(FixedStrategy), Duration::zero());
        sweeper.sweep_once().await;

        let booking = bookings
            .find_by_order_id(receipt.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(booking.status, OrderStatus::Cancelled);
        assert_eq!(booking.rider_id, None);
    }
}
