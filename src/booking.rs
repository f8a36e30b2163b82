// Booking of a selected appointment slot

use crate::client::Client;
use crate::error::Result;
use crate::operations::SET_APPOINTMENT;
use crate::render::Parameters;
use crate::sender::QflowSender;
use crate::template::{Template, TemplateStore};
use crate::unit_details::parse_local_date_time;
use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingConfirmation {
    pub process_id: i32,
    pub appointment: NaiveDateTime,
}

/// Pass/fail signal handed back to the web layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Confirmed(BookingConfirmation),
    Failed { reason: String },
}

// Each booking is sent at most once. Timeouts surface as failures and are
// never resent.
pub struct BookingService {
    sender: QflowSender,
    service_address: String,
    set_appointment: Arc<Template>,
}

impl BookingService {
    pub fn new(
        sender: QflowSender,
        templates: &TemplateStore,
        service_address: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            sender,
            service_address: service_address.into(),
            set_appointment: templates.load(SET_APPOINTMENT.template)?,
        })
    }

    pub async fn book_appointment(
        &self,
        client: &Client,
        appointment: NaiveDateTime,
    ) -> Result<BookingConfirmation> {
        let result = self.send_booking(client, appointment).await;

        match &result {
            Ok(confirmation) => info!(
                client_id = %client.client_id,
                appointment = %appointment,
                process_id = confirmation.process_id,
                "Appointment booked"
            ),
            Err(e) => error!(
                client_id = %client.client_id,
                appointment = %appointment,
                error = %e,
                "Appointment not booked"
            ),
        }
        result
    }

    /// Books the slot chosen in the booking form, given as an ISO local
    /// date-time string.
    pub async fn book_selected_appointment(
        &self,
        client: &Client,
        selected: &str,
    ) -> BookingOutcome {
        let appointment = match parse_local_date_time(selected) {
            Ok(appointment) => appointment,
            Err(e) => {
                error!(
                    client_id = %client.client_id,
                    appointment = selected,
                    error = %e,
                    "Appointment not booked"
                );
                return BookingOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        match self.book_appointment(client, appointment).await {
            Ok(confirmation) => BookingOutcome::Confirmed(confirmation),
            Err(e) => BookingOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    async fn send_booking(
        &self,
        client: &Client,
        appointment: NaiveDateTime,
    ) -> Result<BookingConfirmation> {
        let start_time = appointment.hour() * 60 + appointment.minute();
        let parameters = Parameters::from([
            ("customerId".to_string(), client.customer_id.clone()),
            ("serviceId".to_string(), client.service_id.clone()),
            (
                "appointmentTypeId".to_string(),
                client.appointment_type_id.clone(),
            ),
            (
                "appointmentDate".to_string(),
                appointment.format("%Y-%m-%d").to_string(),
            ),
            ("startTime".to_string(), start_time.to_string()),
        ]);

        let response = self
            .sender
            .send_request(&self.set_appointment, &parameters, &self.service_address)
            .await?;

        Ok(BookingConfirmation {
            process_id: response.get_int(SET_APPOINTMENT.process_id)?,
            appointment,
        })
    }
}
