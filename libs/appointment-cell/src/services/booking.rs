// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::store::StoreClient;

use crate::models::{
    Appointment, AppointmentError, AppointmentQueryParams, AppointmentStatus,
    BookAppointmentRequest, PaymentStatus, ScheduleMeetingRequest,
};
use crate::services::lifecycle::{consultation_unlocked, AppointmentLifecycleService};
use crate::services::notify::MeetingNotifier;

const APPOINTMENTS_TABLE: &str = "appointments";

pub struct AppointmentBookingService {
    store: Arc<StoreClient>,
    lifecycle_service: AppointmentLifecycleService,
    notifier: MeetingNotifier,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(StoreClient::new(config)),
            lifecycle_service: AppointmentLifecycleService::new(),
            notifier: MeetingNotifier::new(config),
        }
    }

    /// Book a new appointment. Starts pending and unpaid; no slot-conflict
    /// check is performed (double booking is allowed by the domain rules).
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        request.validate()?;

        info!(
            "Booking appointment for patient {} with doctor {}",
            request.patient_id, request.doctor_id
        );

        let id = Uuid::new_v4();
        let now = Utc::now();

        let appointment = Appointment {
            id,
            appointment_id: format!("TW-{}", &id.simple().to_string()[..8]),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            patient_name: request.patient_name,
            doctor_name: request.doctor_name,
            doctor_speciality: request.doctor_speciality,
            doctor_qualification: request.doctor_qualification,
            doctor_designation: request.doctor_designation,
            doctor_location: request.doctor_location,
            doctor_about: request.doctor_about,
            appointment_date: request.appointment_date,
            appointment_day: request.appointment_day,
            appointment_time: request.appointment_time,
            status: AppointmentStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_amount: 0,
            payment_date: None,
            meeting_scheduled: false,
            meeting_time: None,
            meeting_link: None,
            meeting_email_sent: false,
            created_at: now,
            updated_at: now,
        };

        let row = serde_json::to_value(&appointment)
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let result = self
            .store
            .insert(APPOINTMENTS_TABLE, row, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let stored = result.first().ok_or_else(|| {
            AppointmentError::DatabaseError("insert returned no rows".to_string())
        })?;

        let appointment = Self::parse_row(stored)?;
        info!("Appointment {} booked", appointment.appointment_id);
        Ok(appointment)
    }

    /// Fetch one appointment by id.
    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let result = self
            .store
            .select(
                APPOINTMENTS_TABLE,
                &format!("id=eq.{}", appointment_id),
                auth_token,
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        match result.first() {
            Some(row) => Self::parse_row(row),
            None => Err(AppointmentError::NotFound),
        }
    }

    /// List appointments for a patient and/or doctor, newest booking first.
    pub async fn list_appointments(
        &self,
        query: AppointmentQueryParams,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments with filters: {:?}", query);

        let mut query_parts = Vec::new();

        if let Some(patient_id) = query.patient_id {
            query_parts.push(format!("patientId=eq.{}", patient_id));
        }
        if let Some(doctor_id) = query.doctor_id {
            query_parts.push(format!("doctorId=eq.{}", doctor_id));
        }
        query_parts.push("order=createdAt.desc".to_string());

        let result = self
            .store
            .select(APPOINTMENTS_TABLE, &query_parts.join("&"), auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result.iter().map(Self::parse_row).collect()
    }

    /// Doctor resolution of a pending appointment. The `status=eq.pending`
    /// filter makes the guard check and the write a single store operation,
    /// so two racing transitions cannot both succeed.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.lifecycle_service
            .validate_status_transition(AppointmentStatus::Pending, new_status)?;

        let patch = json!({
            "status": new_status,
            "updatedAt": Utc::now(),
        });

        let rows = self
            .store
            .update_where(
                APPOINTMENTS_TABLE,
                &format!("id=eq.{}&status=eq.pending", appointment_id),
                patch,
                auth_token,
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        match rows.first() {
            Some(row) => {
                let appointment = Self::parse_row(row)?;
                info!(
                    "Appointment {} transitioned to {}",
                    appointment.appointment_id, new_status
                );
                Ok(appointment)
            }
            None => {
                // No pending row matched; read back to tell why.
                let current = self.get_appointment(appointment_id, auth_token).await?;
                Err(AppointmentError::InvalidTransition(current.status))
            }
        }
    }

    /// Patient payment. Only the exact consultation fee is accepted, and
    /// only while the appointment is unpaid; the `paymentStatus=eq.unpaid`
    /// filter closes the double-payment race.
    pub async fn record_payment(
        &self,
        appointment_id: Uuid,
        amount: i64,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        if amount != crate::models::CONSULTATION_FEE {
            return Err(AppointmentError::InvalidAmount(amount));
        }

        let patch = json!({
            "paymentStatus": PaymentStatus::Paid,
            "paymentAmount": amount,
            "paymentDate": Utc::now(),
            "updatedAt": Utc::now(),
        });

        let rows = self
            .store
            .update_where(
                APPOINTMENTS_TABLE,
                &format!("id=eq.{}&paymentStatus=eq.unpaid", appointment_id),
                patch,
                auth_token,
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        match rows.first() {
            Some(row) => {
                let appointment = Self::parse_row(row)?;
                info!("Appointment {} paid", appointment.appointment_id);
                Ok(appointment)
            }
            None => {
                let current = self.get_appointment(appointment_id, auth_token).await?;
                self.lifecycle_service
                    .validate_payment(current.payment_status, amount)?;
                Err(AppointmentError::DatabaseError(
                    "conditional payment update matched no rows".to_string(),
                ))
            }
        }
    }

    /// Patient cancellation, only while the appointment is still pending.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment: {}", appointment_id);

        let rows = self
            .store
            .delete_where(
                APPOINTMENTS_TABLE,
                &format!("id=eq.{}&status=eq.pending", appointment_id),
                auth_token,
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        match rows.first() {
            Some(row) => {
                let appointment = Self::parse_row(row)?;
                info!("Appointment {} cancelled", appointment.appointment_id);
                Ok(appointment)
            }
            None => {
                let current = self.get_appointment(appointment_id, auth_token).await?;
                if !self.lifecycle_service.can_cancel(current.status) {
                    return Err(AppointmentError::InvalidTransition(current.status));
                }
                Err(AppointmentError::DatabaseError(
                    "conditional delete matched no rows".to_string(),
                ))
            }
        }
    }

    /// Record the meeting time and link against a completed, paid
    /// appointment, then attempt the patient email. Email failure is logged
    /// and never rolls back the meeting; `meetingEmailSent` stays false so
    /// the dispatch can be retried out of band.
    pub async fn schedule_meeting(
        &self,
        request: ScheduleMeetingRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        if request.meeting_time.trim().is_empty() || request.meeting_link.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "meetingTime and meetingLink are required".to_string(),
            ));
        }

        let patch = json!({
            "meetingScheduled": true,
            "meetingTime": request.meeting_time,
            "meetingLink": request.meeting_link,
            "updatedAt": Utc::now(),
        });

        let rows = self
            .store
            .update_where(
                APPOINTMENTS_TABLE,
                &format!(
                    "id=eq.{}&status=eq.Done&paymentStatus=eq.paid&meetingScheduled=eq.false",
                    request.appointment_id
                ),
                patch,
                auth_token,
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = match rows.first() {
            Some(row) => row,
            None => {
                let current = self
                    .get_appointment(request.appointment_id, auth_token)
                    .await?;
                if !consultation_unlocked(&current) {
                    return Err(AppointmentError::PaymentRequired);
                }
                if current.meeting_scheduled {
                    return Err(AppointmentError::MeetingAlreadyScheduled);
                }
                return Err(AppointmentError::DatabaseError(
                    "conditional meeting update matched no rows".to_string(),
                ));
            }
        };

        let mut appointment = Self::parse_row(row)?;
        info!(
            "Meeting scheduled for appointment {}",
            appointment.appointment_id
        );

        match self.notifier.send_meeting_email(&appointment).await {
            Ok(()) => {
                appointment = self.mark_meeting_email_sent(&appointment, auth_token).await;
            }
            Err(e) => {
                warn!(
                    "Meeting email dispatch failed for appointment {}: {}",
                    appointment.appointment_id, e
                );
            }
        }

        Ok(appointment)
    }

    async fn mark_meeting_email_sent(
        &self,
        appointment: &Appointment,
        auth_token: &str,
    ) -> Appointment {
        let patch = json!({
            "meetingEmailSent": true,
            "updatedAt": Utc::now(),
        });

        match self
            .store
            .update_where(
                APPOINTMENTS_TABLE,
                &format!("id=eq.{}", appointment.id),
                patch,
                auth_token,
            )
            .await
        {
            Ok(rows) => rows
                .first()
                .and_then(|row| Self::parse_row(row).ok())
                .unwrap_or_else(|| appointment.clone()),
            Err(e) => {
                warn!(
                    "Failed to record meetingEmailSent for appointment {}: {}",
                    appointment.appointment_id, e
                );
                appointment.clone()
            }
        }
    }

    fn parse_row(row: &Value) -> Result<Appointment, AppointmentError> {
        serde_json::from_value(row.clone()).map_err(|e| {
            AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e))
        })
    }
}
