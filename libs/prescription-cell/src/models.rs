// libs/prescription-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,

    // Point-in-time snapshot copied from the appointment
    pub patient_name: String,
    pub doctor_name: String,
    pub doctor_speciality: String,

    pub diagnosis: String,
    pub chief_complaint: String,
    pub medications: Vec<Medication>,
    pub general_instructions: Option<String>,
    pub next_visit_date: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: Option<String>,
}

impl Medication {
    fn validate(&self, index: usize) -> Result<(), PrescriptionError> {
        let required = [
            ("name", &self.name),
            ("dosage", &self.dosage),
            ("frequency", &self.frequency),
            ("duration", &self.duration),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(PrescriptionError::ValidationError(format!(
                    "medication #{}: {} is required",
                    index + 1,
                    field
                )));
            }
        }

        Ok(())
    }
}

/// Body of `POST /api/prescriptions`. Upsert: a second write for the same
/// appointment replaces the first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertPrescriptionRequest {
    pub appointment_id: Uuid,
    pub diagnosis: String,
    pub chief_complaint: String,
    pub medications: Vec<Medication>,
    pub general_instructions: Option<String>,
    pub next_visit_date: Option<String>,
}

impl UpsertPrescriptionRequest {
    pub fn validate(&self) -> Result<(), PrescriptionError> {
        if self.diagnosis.trim().is_empty() {
            return Err(PrescriptionError::ValidationError(
                "diagnosis is required".to_string(),
            ));
        }
        if self.chief_complaint.trim().is_empty() {
            return Err(PrescriptionError::ValidationError(
                "chiefComplaint is required".to_string(),
            ));
        }
        if self.medications.is_empty() {
            return Err(PrescriptionError::ValidationError(
                "at least one medication is required".to_string(),
            ));
        }

        for (index, medication) in self.medications.iter().enumerate() {
            medication.validate(index)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionQueryParams {
    pub appointment_id: Uuid,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PrescriptionError {
    #[error("Prescription not found")]
    NotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Payment required before writing a prescription")]
    PaymentRequired,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
