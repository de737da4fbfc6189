use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DeliveryStatus;

/// Live rider position, stored serialized in tracking column 6.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiderLocation {
    pub lat: f64,
    pub lng: f64,
}

/// Partial update for a tracking record. Absent fields are left untouched,
/// never cleared.
#[derive(Debug, Clone, Default)]
pub struct TrackingPatch {
    pub rider_id: Option<String>,
    pub rider_location: Option<RiderLocation>,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Full delivery tracking record for one order.
#[derive(Debug, Clone)]
pub struct TrackingSnapshot {
    pub order_id: String,
    pub session_id: String,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    pub rider_id: Option<String>,
    pub rider_location: Option<RiderLocation>,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub last_updated: DateTime<Utc>,
}
