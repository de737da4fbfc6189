//! Status projection: collapses the internal (order status, delivery status)
//! pair into the single status enumeration the frontends consume, and turns a
//! tracking snapshot into a progress/ETA estimate.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{DeliveryStatus, OrderStatus, TrackingSnapshot};

/// Frontend-facing status keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontendStatus {
    Pending,
    Assigned,
    PickedUp,
    Delivered,
    Cancelled,
}

impl FrontendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrontendStatus::Pending => "pending",
            FrontendStatus::Assigned => "assigned",
            FrontendStatus::PickedUp => "picked_up",
            FrontendStatus::Delivered => "delivered",
            FrontendStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FrontendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Precedence is load-bearing: cancellation wins over everything, terminal
/// delivery wins over transit signals, and delivery-side signals outrank the
/// coarse order status otherwise.
pub fn project(order: OrderStatus, delivery: DeliveryStatus) -> FrontendStatus {
    if delivery == DeliveryStatus::Cancelled || order == OrderStatus::Cancelled {
        return FrontendStatus::Cancelled;
    }
    if delivery == DeliveryStatus::Delivered || order == OrderStatus::Delivered {
        return FrontendStatus::Delivered;
    }
    if delivery == DeliveryStatus::OnTheWay {
        return FrontendStatus::PickedUp;
    }
    if delivery == DeliveryStatus::RiderAssigned || order == OrderStatus::Confirmed {
        return FrontendStatus::Assigned;
    }
    FrontendStatus::Pending
}

/// Progress percentage and ETA derived from a tracking snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEstimate {
    pub progress: u8,
    pub eta: i64,
}

pub fn progress_estimate(snapshot: &TrackingSnapshot, now: DateTime<Utc>) -> ProgressEstimate {
    let progress = match snapshot.status {
        DeliveryStatus::WaitingForRider => 10,
        DeliveryStatus::RiderAssigned => 40,
        DeliveryStatus::OnTheWay => 75,
        DeliveryStatus::Delivered => 100,
        _ => 20,
    };

    let eta = match snapshot.estimated_arrival {
        // Nearest minute, floored at zero once the estimate has passed.
        Some(arrival) => {
            let minutes = (arrival - now).num_seconds() as f64 / 60.0;
            (minutes.round() as i64).max(0)
        }
        None if snapshot.status == DeliveryStatus::OnTheWay => 20,
        None => 30,
    };

    ProgressEstimate { progress, eta }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn projection_precedence() {
        use DeliveryStatus as D;
        use OrderStatus as O;

        assert_eq!(project(O::Pending, D::WaitingForRider), FrontendStatus::Pending);
        assert_eq!(project(O::Confirmed, D::RiderAssigned), FrontendStatus::Assigned);
        // Delivery-side signal alone is enough.
        assert_eq!(project(O::Pending, D::RiderAssigned), FrontendStatus::Assigned);
        assert_eq!(project(O::Pending, D::OnTheWay), FrontendStatus::PickedUp);
        assert_eq!(project(O::Confirmed, D::OnTheWay), FrontendStatus::PickedUp);
        // Either terminal field wins.
        assert_eq!(project(O::Pending, D::Delivered), FrontendStatus::Delivered);
        assert_eq!(project(O::Delivered, D::OnTheWay), FrontendStatus::Delivered);
        // Cancellation wins over all other signals.
        assert_eq!(project(O::Cancelled, D::OnTheWay), FrontendStatus::Cancelled);
        assert_eq!(project(O::Delivered, D::Cancelled), FrontendStatus::Cancelled);
    }

    fn snapshot(status: DeliveryStatus, eta: Option<DateTime<Utc>>) -> TrackingSnapshot {
        TrackingSnapshot {
            order_id: "ORD-1".into(),
            session_id: "S1".into(),
            status,
            created_at: Utc::now(),
            rider_id: None,
            rider_location: None,
            estimated_arrival: eta,
            notes: None,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn progress_percentages_per_status() {
        let now = Utc::now();
        let cases = [
            (DeliveryStatus::WaitingForRider, 10),
            (DeliveryStatus::RiderAssigned, 40),
            (DeliveryStatus::OnTheWay, 75),
            (DeliveryStatus::Delivered, 100),
            (DeliveryStatus::Cancelled, 20),
        ];
        for (status, expected) in cases {
            assert_eq!(progress_estimate(&snapshot(status, None), now).progress, expected);
        }
    }

    #[test]
    fn eta_from_stored_arrival_floored_at_zero() {
        let now = Utc::now();
        let soon = snapshot(DeliveryStatus::OnTheWay, Some(now + Duration::minutes(12)));
        assert_eq!(progress_estimate(&soon, now).eta, 12);

        let past = snapshot(DeliveryStatus::OnTheWay, Some(now - Duration::minutes(5)));
        assert_eq!(progress_estimate(&past, now).eta, 0);
    }

    #[test]
    fn eta_rounds_to_the_nearest_minute() {
        let now = Utc::now();
        // 12.6 minutes out reads as 13, 12.4 as 12.
        let up = snapshot(DeliveryStatus::OnTheWay, Some(now + Duration::seconds(756)));
        assert_eq!(progress_estimate(&up, now).eta, 13);
        let down = snapshot(DeliveryStatus::OnTheWay, Some(now + Duration::seconds(744)));
        assert_eq!(progress_estimate(&down, now).eta, 12);
    }

    #[test]
    fn eta_fallbacks_without_stored_arrival() {
        let now = Utc::now();
        assert_eq!(
            progress_estimate(&snapshot(DeliveryStatus::OnTheWay, None), now).eta,
            20
        );
        assert_eq!(
            progress_estimate(&snapshot(DeliveryStatus::RiderAssigned, None), now).eta,
            30
        );
    }
}
