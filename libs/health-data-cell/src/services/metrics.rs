// libs/health-data-cell/src/services/metrics.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::store::StoreClient;

use crate::models::{
    AddBmiRequest, AddBpRequest, BmiRecord, BpRecord, HealthData, HealthDataError,
};

const HEALTH_DATA_TABLE: &str = "health_data";

pub struct HealthDataService {
    store: Arc<StoreClient>,
}

impl HealthDataService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(StoreClient::new(config)),
        }
    }

    /// Fetch the patient's metric document, creating an empty one on first
    /// access.
    pub async fn get_or_create(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<HealthData, HealthDataError> {
        let result = self
            .store
            .select(
                HEALTH_DATA_TABLE,
                &format!("patientId=eq.{}", patient_id),
                auth_token,
            )
            .await
            .map_err(|e| HealthDataError::DatabaseError(e.to_string()))?;

        if let Some(row) = result.first() {
            return Self::parse_row(row);
        }

        debug!("No health data for patient {}, creating", patient_id);

        let data = HealthData::new(patient_id);
        let row = serde_json::to_value(&data)
            .map_err(|e| HealthDataError::DatabaseError(e.to_string()))?;

        let result = self
            .store
            .insert(HEALTH_DATA_TABLE, row, auth_token)
            .await
            .map_err(|e| HealthDataError::DatabaseError(e.to_string()))?;

        match result.first() {
            Some(row) => Self::parse_row(row),
            None => Err(HealthDataError::DatabaseError(
                "insert returned no rows".to_string(),
            )),
        }
    }

    pub async fn add_bmi(
        &self,
        patient_id: Uuid,
        request: AddBmiRequest,
        auth_token: &str,
    ) -> Result<HealthData, HealthDataError> {
        request.validate()?;

        let mut data = self.get_or_create(patient_id, auth_token).await?;

        data.bmi_history.push(BmiRecord {
            height_cm: request.height_cm,
            weight_kg: request.weight_kg,
            bmi: request.bmi(),
            recorded_at: Utc::now(),
        });

        self.save_histories(&data, auth_token).await
    }

    pub async fn add_bp(
        &self,
        patient_id: Uuid,
        request: AddBpRequest,
        auth_token: &str,
    ) -> Result<HealthData, HealthDataError> {
        request.validate()?;

        let mut data = self.get_or_create(patient_id, auth_token).await?;

        data.bp_history.push(BpRecord {
            systolic: request.systolic,
            diastolic: request.diastolic,
            recorded_at: Utc::now(),
        });

        self.save_histories(&data, auth_token).await
    }

    pub async fn delete_bmi(
        &self,
        patient_id: Uuid,
        index: usize,
        auth_token: &str,
    ) -> Result<HealthData, HealthDataError> {
        let mut data = self.get_or_create(patient_id, auth_token).await?;

        if index >= data.bmi_history.len() {
            return Err(HealthDataError::RecordNotFound(index));
        }
        data.bmi_history.remove(index);

        info!("Removed BMI record {} for patient {}", index, patient_id);
        self.save_histories(&data, auth_token).await
    }

    pub async fn delete_bp(
        &self,
        patient_id: Uuid,
        index: usize,
        auth_token: &str,
    ) -> Result<HealthData, HealthDataError> {
        let mut data = self.get_or_create(patient_id, auth_token).await?;

        if index >= data.bp_history.len() {
            return Err(HealthDataError::RecordNotFound(index));
        }
        data.bp_history.remove(index);

        info!("Removed BP record {} for patient {}", index, patient_id);
        self.save_histories(&data, auth_token).await
    }

    async fn save_histories(
        &self,
        data: &HealthData,
        auth_token: &str,
    ) -> Result<HealthData, HealthDataError> {
        let patch = json!({
            "bmiHistory": data.bmi_history,
            "bpHistory": data.bp_history,
            "updatedAt": Utc::now(),
        });

        let rows = self
            .store
            .update_where(
                HEALTH_DATA_TABLE,
                &format!("id=eq.{}", data.id),
                patch,
                auth_token,
            )
            .await
            .map_err(|e| HealthDataError::DatabaseError(e.to_string()))?;

        match rows.first() {
            Some(row) => Self::parse_row(row),
            None => Err(HealthDataError::DatabaseError(
                "health data update matched no rows".to_string(),
            )),
        }
    }

    fn parse_row(row: &Value) -> Result<HealthData, HealthDataError> {
        serde_json::from_value(row.clone()).map_err(|e| {
            HealthDataError::DatabaseError(format!("Failed to parse health data: {}", e))
        })
    }
}
