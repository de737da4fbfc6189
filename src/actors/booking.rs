use chrono::Utc;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::clients::{BookingClient, TrackingClient};
use crate::domain::{
    Booking, BookingSubmission, Category, DeliveryStatus, OrderStatus, RiderAssignment,
    SubmitReceipt, TrackingPatch,
};
use crate::error::BookingError;
use crate::messages::{BookingRequest, ServiceResponse};
use crate::store::rows::{
    booking_col, booking_schema, decode_booking, encode_timestamp, new_booking_row,
};
use crate::store::Table;

/// Order repository: owns the three category tables and coordinates the
/// best-effort tracking side effects through the tracking client.
pub struct BookingService {
    receiver: mpsc::Receiver<BookingRequest>,
    tables: Vec<(Category, Table)>,
    tracking: TrackingClient,
}

impl BookingService {
    pub fn new(buffer_size: usize, tracking: TrackingClient) -> (Self, BookingClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let tables = Category::ALL
            .into_iter()
            .map(|c| (c, Table::open(booking_schema(c))))
            .collect();
        let service = Self {
            receiver,
            tables,
            tracking,
        };
        let client = BookingClient::new(sender);
        (service, client)
    }

    #[instrument(name = "booking_service", skip(self))]
    pub async fn run(mut self) {
        info!("BookingService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                BookingRequest::Submit {
                    submission,
                    respond_to,
                } => {
                    self.handle_submit(submission, respond_to).await;
                }
                BookingRequest::FindByOrderId {
                    order_id,
                    respond_to,
                } => {
                    self.handle_find_by_order_id(order_id, respond_to);
                }
                BookingRequest::LatestBySession {
                    session_id,
                    respond_to,
                } => {
                    self.handle_latest_by_session(session_id, respond_to);
                }
                BookingRequest::List {
                    category,
                    respond_to,
                } => {
                    self.handle_list(category, respond_to);
                }
                BookingRequest::AssignRider {
                    assignment,
                    respond_to,
                } => {
                    self.handle_assign_rider(assignment, respond_to).await;
                }
                BookingRequest::UpdateDelivery {
                    order_id,
                    status,
                    patch,
                    respond_to,
                } => {
                    self.handle_update_delivery(order_id, status, patch, respond_to)
                        .await;
                }
                BookingRequest::Complete {
                    order_id,
                    respond_to,
                } => {
                    self.handle_complete(order_id, respond_to).await;
                }
                BookingRequest::Cancel {
                    order_id,
                    respond_to,
                } => {
                    self.handle_cancel(order_id, respond_to).await;
                }
                BookingRequest::Shutdown => {
                    info!("BookingService shutting down");
                    break;
                }
                #[cfg(test)]
                BookingRequest::GetBookingCount { respond_to } => {
                    let count = self.tables.iter().map(|(_, t)| t.len()).sum();
                    let _ = respond_to.send(Ok(count));
                }
            }
        }

        info!("BookingService stopped");
    }

    // Tables are built from Category::ALL in order, so indexing is total.
    fn table_index(category: Category) -> usize {
        match category {
            Category::Food => 0,
            Category::Parcel => 1,
            Category::Laundry => 2,
        }
    }

    fn table(&self, category: Category) -> &Table {
        &self.tables[Self::table_index(category)].1
    }

    fn table_mut(&mut self, category: Category) -> &mut Table {
        &mut self.tables[Self::table_index(category)].1
    }

    /// Generates `ORD-YYYYMMDD-HHMMSS-RRRR`; regenerates on the rare same-
    /// second suffix collision so ids stay unique across all three tables.
    fn generate_order_id(&self) -> String {
        loop {
            let now = Utc::now();
            let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
            let id = format!("ORD-{}-{:04}", now.format("%Y%m%d-%H%M%S"), suffix);
            if self.find_row(&id).is_none() {
                return id;
            }
        }
    }

    /// Linear scan across all three category tables, food first.
    fn find_row(&self, order_id: &str) -> Option<(Category, usize)> {
        for (category, table) in &self.tables {
            if let Some(row) = table.find(booking_col::ORDER_ID, order_id) {
                return Some((*category, row));
            }
        }
        None
    }

    fn decode_row(&self, category: Category, row: usize) -> Option<Booking> {
        self.table(category)
            .row(row)
            .map(|cells| decode_booking(category, cells))
    }

    #[instrument(
        fields(category = %submission.category, session_id = %submission.session_id),
        skip(self, submission, respond_to)
    )]
    async fn handle_submit(
        &mut self,
        submission: BookingSubmission,
        respond_to: ServiceResponse<SubmitReceipt, BookingError>,
    ) {
        debug!("Processing submit request");

        let order_id = self.generate_order_id();
        let now = Utc::now();
        let row = new_booking_row(&order_id, &submission, now);
        let session_id = submission.session_id.clone();
        self.table_mut(submission.category).append(row);

        info!(order_id = %order_id, "Booking submitted");
        let _ = respond_to.send(Ok(SubmitReceipt {
            order_id: order_id.clone(),
            status: OrderStatus::Pending,
            delivery_status: DeliveryStatus::WaitingForRider,
        }));

        // Best effort: tracking must never block a booking from succeeding.
        if let Err(e) = self.tracking.initialize(order_id, session_id).await {
            warn!(error = %e, "Tracking initialization failed");
        }
    }

    #[instrument(fields(order_id = %order_id), skip(self, respond_to))]
    fn handle_find_by_order_id(
        &self,
        order_id: String,
        respond_to: ServiceResponse<Option<Booking>, BookingError>,
    ) {
        debug!("Processing find_by_order_id request");

        let booking = self
            .find_row(&order_id)
            .and_then(|(category, row)| self.decode_row(category, row));

        match &booking {
            Some(b) => debug!(category = %b.category, status = %b.status, "Booking found"),
            None => debug!("Booking not found"),
        }

        let _ = respond_to.send(Ok(booking));
    }

    /// Most recently appended booking for a session, across all categories.
    #[instrument(fields(session_id = %session_id), skip(self, respond_to))]
    fn handle_latest_by_session(
        &self,
        session_id: String,
        respond_to: ServiceResponse<Option<Booking>, BookingError>,
    ) {
        debug!("Processing latest_by_session request");

        let mut latest: Option<Booking> = None;
        for (category, table) in &self.tables {
            if let Some(row) = table.rfind(booking_col::SESSION_ID, &session_id) {
                if let Some(booking) = table.row(row).map(|cells| decode_booking(*category, cells))
                {
                    let newer = latest
                        .as_ref()
                        .map(|l| booking.created_at >= l.created_at)
                        .unwrap_or(true);
                    if newer {
                        latest = Some(booking);
                    }
                }
            }
        }

        let _ = respond_to.send(Ok(latest));
    }

    #[instrument(skip(self, respond_to))]
    fn handle_list(
        &self,
        category: Option<Category>,
        respond_to: ServiceResponse<Vec<Booking>, BookingError>,
    ) {
        debug!("Processing list request");

        let bookings: Vec<Booking> = self
            .tables
            .iter()
            .filter(|(c, _)| category.map(|wanted| wanted == *c).unwrap_or(true))
            .flat_map(|(c, table)| table.rows().map(|cells| decode_booking(*c, cells)))
            .filter(|b| !b.order_id.is_empty())
            .collect();

        debug!(count = bookings.len(), "Listed bookings");
        let _ = respond_to.send(Ok(bookings));
    }

    #[instrument(
        fields(order_id = %assignment.order_id, rider_id = %assignment.rider_id),
        skip(self, assignment, respond_to)
    )]
    async fn handle_assign_rider(
        &mut self,
        assignment: RiderAssignment,
        respond_to: ServiceResponse<(), BookingError>,
    ) {
        debug!("Processing assign_rider request");

        let Some((category, row)) = self.find_row(&assignment.order_id) else {
            warn!("Order not found for rider assignment");
            let _ = respond_to.send(Err(BookingError::NotFound(assignment.order_id)));
            return;
        };

        let now = Utc::now();
        let table = self.table_mut(category);
        let result: Result<(), BookingError> = (|| {
            table.set_cell(row, booking_col::RIDER_PHONE, assignment.rider_phone.clone())?;
            table.set_cell(row, booking_col::RIDER_ID, assignment.rider_id.clone())?;
            table.set_cell(row, booking_col::RIDER_NAME, assignment.rider_name.clone())?;
            table.set_cell(row, booking_col::STATUS, OrderStatus::Confirmed.to_string())?;
            table.set_cell(row, booking_col::ASSIGNED_AT, encode_timestamp(now))?;
            Ok(())
        })();

        if let Err(e) = &result {
            error!(error = %e, "Rider assignment write failed");
            let _ = respond_to.send(result);
            return;
        }

        info!("Rider assigned");
        let _ = respond_to.send(Ok(()));

        let patch = TrackingPatch {
            rider_id: Some(assignment.rider_id),
            ..Default::default()
        };
        if let Err(e) = self
            .tracking
            .update(assignment.order_id, DeliveryStatus::RiderAssigned, patch)
            .await
        {
            warn!(error = %e, "Tracking update failed after rider assignment");
        }
    }

    #[instrument(fields(order_id = %order_id, status = %status), skip(self, patch, respond_to))]
    async fn handle_update_delivery(
        &mut self,
        order_id: String,
        status: DeliveryStatus,
        patch: TrackingPatch,
        respond_to: ServiceResponse<(), BookingError>,
    ) {
        debug!("Processing update_delivery request");

        let Some((category, row)) = self.find_row(&order_id) else {
            warn!("Order not found for delivery update");
            let _ = respond_to.send(Err(BookingError::NotFound(order_id)));
            return;
        };

        if let Err(e) =
            self.table_mut(category)
                .set_cell(row, booking_col::DELIVERY_STATUS, status.to_string())
        {
            error!(error = %e, "Delivery status write failed");
            let _ = respond_to.send(Err(e.into()));
            return;
        }

        info!("Delivery status updated");
        let _ = respond_to.send(Ok(()));

        if let Err(e) = self.tracking.update(order_id, status, patch).await {
            warn!(error = %e, "Tracking update failed after delivery update");
        }
    }

    #[instrument(fields(order_id = %order_id), skip(self, respond_to))]
    async fn handle_complete(
        &mut self,
        order_id: String,
        respond_to: ServiceResponse<(), BookingError>,
    ) {
        debug!("Processing complete request");

        let Some((category, row)) = self.find_row(&order_id) else {
            warn!("Order not found for completion");
            let _ = respond_to.send(Err(BookingError::NotFound(order_id)));
            return;
        };

        let session_id = self
            .table(category)
            .cell(row, booking_col::SESSION_ID)
            .unwrap_or("")
            .to_string();

        let table = self.table_mut(category);
        let result: Result<(), BookingError> = (|| {
            table.set_cell(row, booking_col::STATUS, OrderStatus::Delivered.to_string())?;
            table.set_cell(
                row,
                booking_col::DELIVERY_STATUS,
                DeliveryStatus::Delivered.to_string(),
            )?;
            Ok(())
        })();

        if let Err(e) = &result {
            error!(error = %e, "Completion write failed");
            let _ = respond_to.send(result);
            return;
        }

        info!("Order completed");
        let _ = respond_to.send(Ok(()));

        // Lazily create the tracking record if submission-time init was lost,
        // then record the delivered event.
        match self.tracking.get(order_id.clone()).await {
            Ok(None) => {
                if let Err(e) = self.tracking.initialize(order_id.clone(), session_id).await {
                    warn!(error = %e, "Lazy tracking initialization failed");
                }
            }
            Ok(Some(_)) => {}
            Err(e) => warn!(error = %e, "Tracking lookup failed during completion"),
        }
        if let Err(e) = self
            .tracking
            .update(order_id, DeliveryStatus::Delivered, TrackingPatch::default())
            .await
        {
            warn!(error = %e, "Tracking update failed after completion");
        }
    }

    #[instrument(fields(order_id = %order_id), skip(self, respond_to))]
    async fn handle_cancel(
        &mut self,
        order_id: String,
        respond_to: ServiceResponse<(), BookingError>,
    ) {
        debug!("Processing cancel request");

        let Some((category, row)) = self.find_row(&order_id) else {
            warn!("Order not found for cancellation");
            let _ = respond_to.send(Err(BookingError::NotFound(order_id)));
            return;
        };

        // The row is kept for audit history; cancellation is a status flag.
        let table = self.table_mut(category);
        let result: Result<(), BookingError> = (|| {
            table.set_cell(row, booking_col::STATUS, OrderStatus::Cancelled.to_string())?;
            table.set_cell(
                row,
                booking_col::DELIVERY_STATUS,
                DeliveryStatus::Cancelled.to_string(),
            )?;
            Ok(())
        })();

        if let Err(e) = &result {
            error!(error = %e, "Cancellation write failed");
            let _ = respond_to.send(result);
            return;
        }

        info!("Order cancelled");
        let _ = respond_to.send(Ok(()));

        if let Err(e) = self
            .tracking
            .update(order_id, DeliveryStatus::Cancelled, TrackingPatch::default())
            .await
        {
            warn!(error = %e, "Tracking update failed after cancellation");
        }
    }
}
