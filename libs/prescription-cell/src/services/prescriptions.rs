// libs/prescription-cell/src/services/prescriptions.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use appointment_cell::models::Appointment;
use appointment_cell::services::lifecycle::consultation_unlocked;
use shared_config::AppConfig;
use shared_database::store::StoreClient;

use crate::models::{Prescription, PrescriptionError, UpsertPrescriptionRequest};

const PRESCRIPTIONS_TABLE: &str = "prescriptions";
const APPOINTMENTS_TABLE: &str = "appointments";

pub struct PrescriptionService {
    store: Arc<StoreClient>,
}

impl PrescriptionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(StoreClient::new(config)),
        }
    }

    /// Create or replace the single prescription tied to an appointment.
    /// Gated on the appointment being Done and paid.
    pub async fn upsert(
        &self,
        request: UpsertPrescriptionRequest,
        auth_token: &str,
    ) -> Result<Prescription, PrescriptionError> {
        let appointment = self
            .fetch_appointment(request.appointment_id, auth_token)
            .await?;

        if !consultation_unlocked(&appointment) {
            return Err(PrescriptionError::PaymentRequired);
        }

        request.validate()?;

        let now = Utc::now();
        let existing = self
            .find_by_appointment(request.appointment_id, auth_token)
            .await?;

        match existing {
            Some(current) => {
                debug!(
                    "Replacing prescription {} for appointment {}",
                    current.id, request.appointment_id
                );

                let patch = json!({
                    "diagnosis": request.diagnosis,
                    "chiefComplaint": request.chief_complaint,
                    "medications": request.medications,
                    "generalInstructions": request.general_instructions,
                    "nextVisitDate": request.next_visit_date,
                    "updatedAt": now,
                });

                let rows = self
                    .store
                    .update_where(
                        PRESCRIPTIONS_TABLE,
                        &format!("id=eq.{}", current.id),
                        patch,
                        auth_token,
                    )
                    .await
                    .map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?;

                match rows.first() {
                    Some(row) => Self::parse_row(row),
                    None => Err(PrescriptionError::DatabaseError(
                        "prescription update matched no rows".to_string(),
                    )),
                }
            }
            None => {
                let prescription = Prescription {
                    id: Uuid::new_v4(),
                    appointment_id: appointment.id,
                    patient_id: appointment.patient_id,
                    doctor_id: appointment.doctor_id,
                    patient_name: appointment.patient_name.clone(),
                    doctor_name: appointment.doctor_name.clone(),
                    doctor_speciality: appointment.doctor_speciality.clone(),
                    diagnosis: request.diagnosis,
                    chief_complaint: request.chief_complaint,
                    medications: request.medications,
                    general_instructions: request.general_instructions,
                    next_visit_date: request.next_visit_date,
                    created_at: now,
                    updated_at: now,
                };

                let row = serde_json::to_value(&prescription)
                    .map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?;

                let result = self
                    .store
                    .insert(PRESCRIPTIONS_TABLE, row, auth_token)
                    .await
                    .map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?;

                let stored = result.first().ok_or_else(|| {
                    PrescriptionError::DatabaseError("insert returned no rows".to_string())
                })?;

                let prescription = Self::parse_row(stored)?;
                info!(
                    "Prescription {} written for appointment {}",
                    prescription.id, prescription.appointment_id
                );
                Ok(prescription)
            }
        }
    }

    /// Fetch the prescription for an appointment, if one has been written.
    pub async fn get_by_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Prescription, PrescriptionError> {
        self.find_by_appointment(appointment_id, auth_token)
            .await?
            .ok_or(PrescriptionError::NotFound)
    }

    async fn find_by_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Prescription>, PrescriptionError> {
        let result = self
            .store
            .select(
                PRESCRIPTIONS_TABLE,
                &format!("appointmentId=eq.{}", appointment_id),
                auth_token,
            )
            .await
            .map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?;

        result.first().map(Self::parse_row).transpose()
    }

    async fn fetch_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, PrescriptionError> {
        let result = self
            .store
            .select(
                APPOINTMENTS_TABLE,
                &format!("id=eq.{}", appointment_id),
                auth_token,
            )
            .await
            .map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?;

        let row = result
            .first()
            .ok_or(PrescriptionError::AppointmentNotFound)?;

        serde_json::from_value(row.clone()).map_err(|e| {
            PrescriptionError::DatabaseError(format!("Failed to parse appointment: {}", e))
        })
    }

    fn parse_row(row: &Value) -> Result<Prescription, PrescriptionError> {
        serde_json::from_value(row.clone()).map_err(|e| {
            PrescriptionError::DatabaseError(format!("Failed to parse prescription: {}", e))
        })
    }
}
