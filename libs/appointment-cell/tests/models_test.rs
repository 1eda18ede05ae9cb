use serde_json::json;
use uuid::Uuid;

use appointment_cell::models::{
    AppointmentStatus, BookAppointmentRequest, PaymentStatus, UpdateAppointmentRequest,
};
use assert_matches::assert_matches;
use appointment_cell::models::AppointmentError;

fn booking_request() -> BookAppointmentRequest {
    serde_json::from_value(json!({
        "patientId": Uuid::new_v4(),
        "doctorId": Uuid::new_v4(),
        "patientName": "Test Patient",
        "doctorName": "Dr. Test",
        "doctorSpeciality": "Cardiology",
        "doctorQualification": "MBBS, FCPS",
        "doctorDesignation": "Consultant",
        "doctorLocation": "Dhaka Medical College Hospital",
        "appointmentDate": "15/08/2025",
        "appointmentDay": "Friday",
        "appointmentTime": "7:00 PM - 9:00 PM"
    }))
    .expect("valid booking request")
}

#[test]
fn status_parsing_is_case_insensitive() {
    for input in ["pending", "Pending", "PENDING"] {
        let status: AppointmentStatus = serde_json::from_value(json!(input)).unwrap();
        assert_eq!(status, AppointmentStatus::Pending);
    }
    for input in ["Done", "done", "DONE"] {
        let status: AppointmentStatus = serde_json::from_value(json!(input)).unwrap();
        assert_eq!(status, AppointmentStatus::Done);
    }
    for input in ["Declined", "declined"] {
        let status: AppointmentStatus = serde_json::from_value(json!(input)).unwrap();
        assert_eq!(status, AppointmentStatus::Declined);
    }

    assert!(serde_json::from_value::<AppointmentStatus>(json!("cancelled")).is_err());
}

#[test]
fn status_serializes_to_canonical_literals() {
    assert_eq!(
        serde_json::to_value(AppointmentStatus::Pending).unwrap(),
        json!("pending")
    );
    assert_eq!(
        serde_json::to_value(AppointmentStatus::Done).unwrap(),
        json!("Done")
    );
    assert_eq!(
        serde_json::to_value(AppointmentStatus::Declined).unwrap(),
        json!("Declined")
    );
}

#[test]
fn payment_status_round_trips() {
    for (input, expected) in [
        ("unpaid", PaymentStatus::Unpaid),
        ("UNPAID", PaymentStatus::Unpaid),
        ("paid", PaymentStatus::Paid),
        ("Paid", PaymentStatus::Paid),
    ] {
        let status: PaymentStatus = serde_json::from_value(json!(input)).unwrap();
        assert_eq!(status, expected);
    }

    assert_eq!(
        serde_json::to_value(PaymentStatus::Unpaid).unwrap(),
        json!("unpaid")
    );
    assert_eq!(
        serde_json::to_value(PaymentStatus::Paid).unwrap(),
        json!("paid")
    );
}

#[test]
fn booking_request_validates() {
    assert!(booking_request().validate().is_ok());
}

#[test]
fn booking_request_rejects_blank_fields() {
    let mut request = booking_request();
    request.patient_name = "   ".to_string();

    assert_matches!(
        request.validate(),
        Err(AppointmentError::ValidationError(msg)) if msg.contains("patientName")
    );
}

#[test]
fn booking_request_rejects_bad_dates() {
    for bad in ["2025-08-15", "15/13/2025", "32/01/2025", "Friday", ""] {
        let mut request = booking_request();
        request.appointment_date = bad.to_string();

        assert_matches!(
            request.validate(),
            Err(AppointmentError::ValidationError(_)),
            "date '{}' should be rejected",
            bad
        );
    }
}

#[test]
fn update_request_fields_are_optional() {
    let empty: UpdateAppointmentRequest = serde_json::from_value(json!({})).unwrap();
    assert!(empty.status.is_none());
    assert!(empty.payment_status.is_none());
    assert!(empty.payment_amount.is_none());

    let payment: UpdateAppointmentRequest =
        serde_json::from_value(json!({"paymentStatus": "paid", "paymentAmount": 1000})).unwrap();
    assert_eq!(payment.payment_status, Some(PaymentStatus::Paid));
    assert_eq!(payment.payment_amount, Some(1000));
}
