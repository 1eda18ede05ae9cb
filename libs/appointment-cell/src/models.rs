// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Fixed consultation fee. A payment is accepted only at exactly this
/// amount, in full, once.
pub const CONSULTATION_FEE: i64 = 1000;

/// Wire format for `appointmentDate`.
pub const APPOINTMENT_DATE_FORMAT: &str = "%d/%m/%Y";

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    /// Human-facing booking code shown on receipts, e.g. `TW-0f3a9c21`.
    pub appointment_id: String,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,

    // Snapshot of both parties taken at booking time. Profile edits after
    // booking do not rewrite history.
    pub patient_name: String,
    pub doctor_name: String,
    pub doctor_speciality: String,
    pub doctor_qualification: String,
    pub doctor_designation: String,
    pub doctor_location: String,
    pub doctor_about: Option<String>,

    /// `DD/MM/YYYY`, stored and returned exactly as booked.
    pub appointment_date: String,
    /// Weekday label, free text.
    pub appointment_day: String,
    /// Slot label, free text (e.g. "7:00 PM - 9:00 PM").
    pub appointment_time: String,

    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub payment_amount: i64,
    pub payment_date: Option<DateTime<Utc>>,

    pub meeting_scheduled: bool,
    pub meeting_time: Option<String>,
    pub meeting_link: Option<String>,
    pub meeting_email_sent: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Consultation status. Canonical literals on the wire are `pending`,
/// `Done` and `Declined`; parsing is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentStatus {
    Pending,
    Done,
    Declined,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Done => "Done",
            AppointmentStatus::Declined => "Declined",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pending") {
            Ok(AppointmentStatus::Pending)
        } else if s.eq_ignore_ascii_case("done") {
            Ok(AppointmentStatus::Done)
        } else if s.eq_ignore_ascii_case("declined") {
            Ok(AppointmentStatus::Declined)
        } else {
            Err(format!("unknown appointment status: {}", s))
        }
    }
}

impl Serialize for AppointmentStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppointmentStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Payment state. `unpaid` / `paid` on the wire, case-insensitive on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("unpaid") {
            Ok(PaymentStatus::Unpaid)
        } else if s.eq_ignore_ascii_case("paid") {
            Ok(PaymentStatus::Paid)
        } else {
            Err(format!("unknown payment status: {}", s))
        }
    }
}

impl Serialize for PaymentStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PaymentStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_name: String,
    pub doctor_name: String,
    pub doctor_speciality: String,
    pub doctor_qualification: String,
    pub doctor_designation: String,
    pub doctor_location: String,
    pub doctor_about: Option<String>,
    pub appointment_date: String,
    pub appointment_day: String,
    pub appointment_time: String,
}

impl BookAppointmentRequest {
    pub fn validate(&self) -> Result<(), AppointmentError> {
        let required = [
            ("patientName", &self.patient_name),
            ("doctorName", &self.doctor_name),
            ("doctorSpeciality", &self.doctor_speciality),
            ("doctorQualification", &self.doctor_qualification),
            ("doctorDesignation", &self.doctor_designation),
            ("doctorLocation", &self.doctor_location),
            ("appointmentDate", &self.appointment_date),
            ("appointmentDay", &self.appointment_day),
            ("appointmentTime", &self.appointment_time),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AppointmentError::ValidationError(format!(
                    "{} is required",
                    field
                )));
            }
        }

        if NaiveDate::parse_from_str(&self.appointment_date, APPOINTMENT_DATE_FORMAT).is_err() {
            return Err(AppointmentError::ValidationError(format!(
                "appointmentDate must be DD/MM/YYYY, got '{}'",
                self.appointment_date
            )));
        }

        Ok(())
    }
}

/// Body of `PATCH /api/appointments/{id}`. Exactly one concern per request:
/// a doctor status transition, or a patient payment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub payment_amount: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMeetingRequest {
    pub appointment_id: Uuid,
    pub meeting_time: String,
    pub meeting_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQueryParams {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment cannot change state from status: {0}")]
    InvalidTransition(AppointmentStatus),

    #[error("Payment amount must be exactly {CONSULTATION_FEE}, got {0}")]
    InvalidAmount(i64),

    #[error("Appointment already paid")]
    AlreadyPaid,

    #[error("Payment required before this action")]
    PaymentRequired,

    #[error("Meeting already scheduled for this appointment")]
    MeetingAlreadyScheduled,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
