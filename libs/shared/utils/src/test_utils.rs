use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub store_url: String,
    pub store_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            store_url: "http://localhost:54321".to_string(),
            store_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointing at a wiremock store instance.
    pub fn for_mock_store(store_url: &str) -> Self {
        Self {
            store_url: store_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            store_url: self.store_url.clone(),
            store_anon_key: self.store_anon_key.clone(),
            store_jwt_secret: self.jwt_secret.clone(),
            notify_service_url: String::new(),
            notify_api_token: String::new(),
            notify_sender: "appointments@treatwell.health".to_string(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned store rows for wiremock-backed tests. Rows are in the wire shape
/// the cells store and read (camelCase documents).
pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn appointment_row(id: &str, patient_id: &str, doctor_id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "appointmentId": "TW-0f3a9c21",
            "patientId": patient_id,
            "doctorId": doctor_id,
            "patientName": "Test Patient",
            "doctorName": "Dr. Test",
            "doctorSpeciality": "Cardiology",
            "doctorQualification": "MBBS, FCPS",
            "doctorDesignation": "Consultant",
            "doctorLocation": "Dhaka Medical College Hospital",
            "doctorAbout": null,
            "appointmentDate": "15/08/2025",
            "appointmentDay": "Friday",
            "appointmentTime": "7:00 PM - 9:00 PM",
            "status": "pending",
            "paymentStatus": "unpaid",
            "paymentAmount": 0,
            "paymentDate": null,
            "meetingScheduled": false,
            "meetingTime": null,
            "meetingLink": null,
            "meetingEmailSent": false,
            "createdAt": "2025-08-01T10:00:00Z",
            "updatedAt": "2025-08-01T10:00:00Z"
        })
    }

    /// An appointment the doctor has completed and the patient has paid for,
    /// i.e. one that passes the payment gate.
    pub fn paid_done_appointment_row(
        id: &str,
        patient_id: &str,
        doctor_id: &str,
    ) -> serde_json::Value {
        let mut row = Self::appointment_row(id, patient_id, doctor_id);
        row["status"] = json!("Done");
        row["paymentStatus"] = json!("paid");
        row["paymentAmount"] = json!(1000);
        row["paymentDate"] = json!("2025-08-02T12:00:00Z");
        row
    }

    pub fn prescription_row(
        id: &str,
        appointment_id: &str,
        patient_id: &str,
        doctor_id: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "appointmentId": appointment_id,
            "patientId": patient_id,
            "doctorId": doctor_id,
            "patientName": "Test Patient",
            "doctorName": "Dr. Test",
            "doctorSpeciality": "Cardiology",
            "diagnosis": "Hypertension, stage 1",
            "chiefComplaint": "Recurring headaches",
            "medications": [
                {
                    "name": "Amlodipine",
                    "dosage": "5 mg",
                    "frequency": "Once daily",
                    "duration": "30 days",
                    "instructions": "Take after breakfast"
                }
            ],
            "generalInstructions": "Reduce salt intake",
            "nextVisitDate": "15/09/2025",
            "createdAt": "2025-08-02T12:30:00Z",
            "updatedAt": "2025-08-02T12:30:00Z"
        })
    }

    pub fn health_data_row(id: &str, patient_id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "patientId": patient_id,
            "bmiHistory": [
                {
                    "heightCm": 170.0,
                    "weightKg": 68.0,
                    "bmi": 23.5,
                    "recordedAt": "2025-07-15T08:00:00Z"
                }
            ],
            "bpHistory": [
                {
                    "systolic": 120,
                    "diastolic": 80,
                    "recordedAt": "2025-07-15T08:00:00Z"
                }
            ],
            "createdAt": "2025-07-15T08:00:00Z",
            "updatedAt": "2025-07-15T08:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "error": {
                "message": message,
                "code": code
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.store_url, "http://localhost:54321");
        assert_eq!(app_config.store_anon_key, "test-anon-key");
        assert!(!app_config.store_jwt_secret.is_empty());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("doc@example.com");
        assert_eq!(user.email, "doc@example.com");
        assert_eq!(user.role, "doctor");

        let user_model = user.to_user();
        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.role, Some(user.role.clone()));
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let secret = "test-secret";
        let token = JwtTestUtils::create_test_token(&user, secret, Some(1));

        assert!(token.contains('.'));
        assert_eq!(token.split('.').count(), 3);
    }
}
