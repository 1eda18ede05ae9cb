// libs/health-data-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-patient metric history document. Both histories are append-only
/// lists; entries are removed only by explicit delete-by-index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub bmi_history: Vec<BmiRecord>,
    pub bp_history: Vec<BpRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HealthData {
    pub fn new(patient_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            patient_id,
            bmi_history: Vec::new(),
            bp_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BmiRecord {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub bmi: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BpRecord {
    pub systolic: i32,
    pub diastolic: i32,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBmiRequest {
    pub height_cm: f64,
    pub weight_kg: f64,
}

impl AddBmiRequest {
    pub fn validate(&self) -> Result<(), HealthDataError> {
        if self.height_cm <= 0.0 {
            return Err(HealthDataError::ValidationError(
                "heightCm must be positive".to_string(),
            ));
        }
        if self.weight_kg <= 0.0 {
            return Err(HealthDataError::ValidationError(
                "weightKg must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bmi(&self) -> f64 {
        let height_m = self.height_cm / 100.0;
        self.weight_kg / (height_m * height_m)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBpRequest {
    pub systolic: i32,
    pub diastolic: i32,
}

impl AddBpRequest {
    pub fn validate(&self) -> Result<(), HealthDataError> {
        if self.systolic <= 0 || self.diastolic <= 0 {
            return Err(HealthDataError::ValidationError(
                "systolic and diastolic must be positive".to_string(),
            ));
        }
        if self.diastolic >= self.systolic {
            return Err(HealthDataError::ValidationError(
                "diastolic must be lower than systolic".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HealthDataQueryParams {
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HealthDataError {
    #[error("No record at index {0}")]
    RecordNotFound(usize),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
