// libs/appointment-cell/src/services/notify.rs
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::models::Appointment;

/// Client for the external notification service that delivers the meeting
/// email to the patient. Delivery is a side channel: callers treat failures
/// as log-and-continue, never as a reason to roll back the meeting itself.
pub struct MeetingNotifier {
    client: Client,
    base_url: String,
    api_token: String,
    sender: String,
    configured: bool,
}

impl MeetingNotifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.notify_service_url.clone(),
            api_token: config.notify_api_token.clone(),
            sender: config.notify_sender.clone(),
            configured: config.is_notifications_configured(),
        }
    }

    /// Ask the notification service to email the patient their meeting
    /// time and link. The service resolves the recipient address from the
    /// patient id.
    pub async fn send_meeting_email(&self, appointment: &Appointment) -> Result<()> {
        if !self.configured {
            return Err(anyhow!("notification service not configured"));
        }

        let meeting_time = appointment.meeting_time.as_deref().unwrap_or_default();
        let meeting_link = appointment.meeting_link.as_deref().unwrap_or_default();

        let url = format!("{}/v1/messages/email", self.base_url);

        let body = json!({
            "from": self.sender,
            "patientId": appointment.patient_id,
            "subject": format!(
                "Your video consultation with {} is scheduled",
                appointment.doctor_name
            ),
            "template": "meeting-scheduled",
            "data": {
                "appointmentId": appointment.appointment_id,
                "patientName": appointment.patient_name,
                "doctorName": appointment.doctor_name,
                "appointmentDate": appointment.appointment_date,
                "meetingTime": meeting_time,
                "meetingLink": meeting_link,
            }
        });

        debug!("Sending meeting email request to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "notification service returned {}: {}",
                status,
                error_text
            ));
        }

        info!(
            "Meeting email dispatched for appointment {}",
            appointment.appointment_id
        );
        Ok(())
    }
}
