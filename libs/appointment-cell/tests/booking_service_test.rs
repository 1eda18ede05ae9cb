use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{
    AppointmentError, AppointmentQueryParams, AppointmentStatus, BookAppointmentRequest,
    PaymentStatus, ScheduleMeetingRequest, CONSULTATION_FEE,
};
use appointment_cell::services::booking::AppointmentBookingService;
use assert_matches::assert_matches;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

const TOKEN: &str = "test-token";

fn service_for(mock_server: &MockServer) -> AppointmentBookingService {
    let config = TestConfig::for_mock_store(&mock_server.uri()).to_app_config();
    AppointmentBookingService::new(&config)
}

fn booking_request(patient_id: Uuid, doctor_id: Uuid) -> BookAppointmentRequest {
    serde_json::from_value(json!({
        "patientId": patient_id,
        "doctorId": doctor_id,
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
    .unwrap()
}

#[tokio::test]
async fn booking_initializes_pending_and_unpaid() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &id.to_string(),
                &patient_id.to_string(),
                &doctor_id.to_string()
            )
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    let appointment = service
        .book_appointment(booking_request(patient_id, doctor_id), TOKEN)
        .await
        .expect("booking should succeed");

    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert_eq!(appointment.payment_status, PaymentStatus::Unpaid);
    assert_eq!(appointment.payment_amount, 0);
    assert!(!appointment.meeting_scheduled);
    // The date strings come back exactly as booked
    assert_eq!(appointment.appointment_date, "15/08/2025");
    assert_eq!(appointment.appointment_day, "Friday");
}

#[tokio::test]
async fn booking_rejects_malformed_dates_before_the_store() {
    let mock_server = MockServer::start().await;
    let service = service_for(&mock_server);

    let mut request = booking_request(Uuid::new_v4(), Uuid::new_v4());
    request.appointment_date = "2025-08-15".to_string();

    let result = service.book_appointment(request, TOKEN).await;

    assert_matches!(result, Err(AppointmentError::ValidationError(_)));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_appointment_reports_not_found() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    assert_matches!(
        service.get_appointment(id, TOKEN).await,
        Err(AppointmentError::NotFound)
    );
}

#[tokio::test]
async fn listing_filters_by_patient_and_sorts_by_creation() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patientId", format!("eq.{}", patient_id)))
        .and(query_param("order", "createdAt.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &patient_id.to_string(),
                &doctor_id.to_string()
            ),
            MockStoreResponses::paid_done_appointment_row(
                &Uuid::new_v4().to_string(),
                &patient_id.to_string(),
                &doctor_id.to_string()
            ),
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    let query = AppointmentQueryParams {
        patient_id: Some(patient_id),
        doctor_id: None,
    };

    let appointments = service.list_appointments(query, TOKEN).await.unwrap();
    assert_eq!(appointments.len(), 2);
}

#[tokio::test]
async fn doctor_can_mark_pending_appointment_done() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    let mut done_row =
        MockStoreResponses::appointment_row(&id.to_string(), &patient_id.to_string(), &doctor_id.to_string());
    done_row["status"] = json!("Done");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(query_param("status", "eq.pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([done_row])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    let appointment = service
        .update_status(id, AppointmentStatus::Done, TOKEN)
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Done);
}

#[tokio::test]
async fn transition_to_pending_is_rejected_without_a_store_call() {
    let mock_server = MockServer::start().await;
    let service = service_for(&mock_server);

    let result = service
        .update_status(Uuid::new_v4(), AppointmentStatus::Pending, TOKEN)
        .await;

    assert_matches!(
        result,
        Err(AppointmentError::InvalidTransition(AppointmentStatus::Pending))
    );
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn resolved_appointment_cannot_transition_again() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    // Conditional update misses: no pending row with this id
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(query_param("status", "eq.pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let mut done_row =
        MockStoreResponses::appointment_row(&id.to_string(), &patient_id.to_string(), &doctor_id.to_string());
    done_row["status"] = json!("Done");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([done_row])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    assert_matches!(
        service
            .update_status(id, AppointmentStatus::Declined, TOKEN)
            .await,
        Err(AppointmentError::InvalidTransition(AppointmentStatus::Done))
    );
}

#[tokio::test]
async fn cas_miss_on_unknown_id_reports_not_found() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    assert_matches!(
        service.update_status(id, AppointmentStatus::Done, TOKEN).await,
        Err(AppointmentError::NotFound)
    );
}

#[tokio::test]
async fn payment_requires_the_exact_fee() {
    let mock_server = MockServer::start().await;
    let service = service_for(&mock_server);

    for amount in [0, 500, 999, 1001, 10000] {
        let result = service.record_payment(Uuid::new_v4(), amount, TOKEN).await;
        assert_matches!(
            result,
            Err(AppointmentError::InvalidAmount(a)) if a == amount
        );
    }
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn payment_succeeds_once_with_the_fixed_fee() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(query_param("paymentStatus", "eq.unpaid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::paid_done_appointment_row(
                &id.to_string(),
                &patient_id.to_string(),
                &doctor_id.to_string()
            )
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    let appointment = service
        .record_payment(id, CONSULTATION_FEE, TOKEN)
        .await
        .unwrap();

    assert_eq!(appointment.payment_status, PaymentStatus::Paid);
    assert_eq!(appointment.payment_amount, CONSULTATION_FEE);
    assert!(appointment.payment_date.is_some());
}

#[tokio::test]
async fn paying_an_already_paid_appointment_fails() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::paid_done_appointment_row(
                &id.to_string(),
                &patient_id.to_string(),
                &doctor_id.to_string()
            )
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    assert_matches!(
        service.record_payment(id, CONSULTATION_FEE, TOKEN).await,
        Err(AppointmentError::AlreadyPaid)
    );
}

#[tokio::test]
async fn pending_appointment_can_be_cancelled() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(query_param("status", "eq.pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &id.to_string(),
                &patient_id.to_string(),
                &doctor_id.to_string()
            )
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    let cancelled = service.cancel_appointment(id, TOKEN).await.unwrap();
    assert_eq!(cancelled.id, id);
}

#[tokio::test]
async fn resolved_appointment_cannot_be_cancelled() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let mut done_row =
        MockStoreResponses::appointment_row(&id.to_string(), &patient_id.to_string(), &doctor_id.to_string());
    done_row["status"] = json!("Done");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([done_row])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    assert_matches!(
        service.cancel_appointment(id, TOKEN).await,
        Err(AppointmentError::InvalidTransition(AppointmentStatus::Done))
    );
}

#[tokio::test]
async fn meeting_cannot_be_scheduled_before_payment() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let mut done_unpaid =
        MockStoreResponses::appointment_row(&id.to_string(), &patient_id.to_string(), &doctor_id.to_string());
    done_unpaid["status"] = json!("Done");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([done_unpaid])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    let request = ScheduleMeetingRequest {
        appointment_id: id,
        meeting_time: "8:00 PM".to_string(),
        meeting_link: "https://meet.example.com/tw-abc".to_string(),
    };

    assert_matches!(
        service.schedule_meeting(request, TOKEN).await,
        Err(AppointmentError::PaymentRequired)
    );
}

#[tokio::test]
async fn meeting_is_scheduled_against_a_paid_done_appointment() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    let mut meeting_row = MockStoreResponses::paid_done_appointment_row(
        &id.to_string(),
        &patient_id.to_string(),
        &doctor_id.to_string(),
    );
    meeting_row["meetingScheduled"] = json!(true);
    meeting_row["meetingTime"] = json!("8:00 PM");
    meeting_row["meetingLink"] = json!("https://meet.example.com/tw-abc");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(query_param("status", "eq.Done"))
        .and(query_param("paymentStatus", "eq.paid"))
        .and(query_param("meetingScheduled", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([meeting_row])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    let request = ScheduleMeetingRequest {
        appointment_id: id,
        meeting_time: "8:00 PM".to_string(),
        meeting_link: "https://meet.example.com/tw-abc".to_string(),
    };

    let appointment = service.schedule_meeting(request, TOKEN).await.unwrap();

    assert!(appointment.meeting_scheduled);
    assert_eq!(appointment.meeting_time.as_deref(), Some("8:00 PM"));
    assert_eq!(
        appointment.meeting_link.as_deref(),
        Some("https://meet.example.com/tw-abc")
    );
    // Notification service is unconfigured in tests: the meeting stands,
    // the email send is skipped and stays unrecorded.
    assert!(!appointment.meeting_email_sent);
}

#[tokio::test]
async fn meeting_cannot_be_scheduled_twice() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let mut scheduled = MockStoreResponses::paid_done_appointment_row(
        &id.to_string(),
        &patient_id.to_string(),
        &doctor_id.to_string(),
    );
    scheduled["meetingScheduled"] = json!(true);
    scheduled["meetingTime"] = json!("8:00 PM");
    scheduled["meetingLink"] = json!("https://meet.example.com/tw-abc");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([scheduled])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    let request = ScheduleMeetingRequest {
        appointment_id: id,
        meeting_time: "9:00 PM".to_string(),
        meeting_link: "https://meet.example.com/tw-def".to_string(),
    };

    assert_matches!(
        service.schedule_meeting(request, TOKEN).await,
        Err(AppointmentError::MeetingAlreadyScheduled)
    );
}

#[tokio::test]
async fn meeting_requires_time_and_link() {
    let mock_server = MockServer::start().await;
    let service = service_for(&mock_server);

    let request = ScheduleMeetingRequest {
        appointment_id: Uuid::new_v4(),
        meeting_time: " ".to_string(),
        meeting_link: "https://meet.example.com/tw-abc".to_string(),
    };

    assert_matches!(
        service.schedule_meeting(request, TOKEN).await,
        Err(AppointmentError::ValidationError(_))
    );
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
