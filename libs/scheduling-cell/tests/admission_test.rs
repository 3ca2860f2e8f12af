// libs/scheduling-cell/tests/admission_test.rs
//
// Admission scheduler tests: the full book-a-slot flow against a mock
// PostgREST store, including the race window where the store's uniqueness
// constraint is the final arbiter.

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::error::SchedulingError;
use scheduling_cell::models::{AdmissionStatus, CreateAdmissionRequest};
use scheduling_cell::services::admission::AdmissionSchedulerService;
use shared_config::AppConfig;

fn t(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
}

struct TestSetup {
    server: MockServer,
    scheduler: AdmissionSchedulerService,
    doctor_id: Uuid,
    patient_id: Uuid,
}

impl TestSetup {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let config = AppConfig {
            database_url: server.uri(),
            database_api_key: "test-key".to_string(),
            port: 0,
        };
        let scheduler = AdmissionSchedulerService::new(&config);

        Self {
            server,
            scheduler,
            doctor_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
        }
    }

    /// Catalog fixtures for a bookable Monday: one 08:00-09:00 shift, a
    /// 30-minute exam type, no closures, no existing admissions.
    async fn mount_open_monday(&self) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/exam_types"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![serde_json::json!({
                "id": Uuid::new_v4(),
                "code": "consult",
                "name": "General consultation",
                "duration_minutes": 30,
                "active": true
            })]))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/non_working_days"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/shifts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![serde_json::json!({
                "id": Uuid::new_v4(),
                "doctor_id": self.doctor_id,
                "day_of_week": 1,
                "start_time": "08:00:00",
                "end_time": "09:00:00",
                "active": true
            })]))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/admissions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
            .mount(&self.server)
            .await;
    }

    fn request_at(&self, start_time: NaiveTime) -> CreateAdmissionRequest {
        CreateAdmissionRequest {
            patient_id: self.patient_id,
            doctor_id: Some(self.doctor_id),
            exam_type: "consult".to_string(),
            date: monday(),
            start_time,
            notes: None,
        }
    }

    fn admission_row(&self, status: &str) -> serde_json::Value {
        serde_json::json!({
            "id": Uuid::new_v4(),
            "patient_id": self.patient_id,
            "doctor_id": self.doctor_id,
            "exam_type_code": "consult",
            "scheduled_at": "2025-06-16T08:15:00Z",
            "status": status,
            "notes": null,
            "created_at": "2025-06-10T10:00:00Z",
            "updated_at": "2025-06-10T10:00:00Z"
        })
    }
}

#[tokio::test]
async fn create_admission_books_an_offered_slot() {
    let setup = TestSetup::new().await;
    setup.mount_open_monday().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/admissions"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(vec![setup.admission_row("scheduled")]),
        )
        .mount(&setup.server)
        .await;

    let admission = setup
        .scheduler
        .create_admission(setup.request_at(t("08:15")))
        .await
        .unwrap();

    assert_eq!(admission.status, AdmissionStatus::Scheduled);
    assert_eq!(
        admission.scheduled_at,
        Utc.with_ymd_and_hms(2025, 6, 16, 8, 15, 0).unwrap()
    );
}

#[tokio::test]
async fn create_admission_rejects_a_slot_the_engine_does_not_offer() {
    let setup = TestSetup::new().await;
    setup.mount_open_monday().await;

    // 08:45 + 30min runs past the 09:00 shift end
    let result = setup
        .scheduler
        .create_admission(setup.request_at(t("08:45")))
        .await;

    assert_matches!(result, Err(SchedulingError::SlotUnavailable(_)));
}

#[tokio::test]
async fn create_admission_maps_storage_conflict_to_slot_taken() {
    let setup = TestSetup::new().await;
    setup.mount_open_monday().await;

    // Another caller won the race: the uniqueness constraint fires
    Mock::given(method("POST"))
        .and(path("/rest/v1/admissions"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key value"))
        .mount(&setup.server)
        .await;

    let result = setup
        .scheduler
        .create_admission(setup.request_at(t("08:15")))
        .await;

    assert_matches!(result, Err(SchedulingError::SlotTaken(_)));
}

#[tokio::test]
async fn cancel_admission_transitions_to_cancelled() {
    let setup = TestSetup::new().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/admissions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(vec![setup.admission_row("cancelled")]),
        )
        .mount(&setup.server)
        .await;

    let admission = setup
        .scheduler
        .cancel_admission(Uuid::new_v4())
        .await
        .unwrap();

    assert_eq!(admission.status, AdmissionStatus::Cancelled);
}

#[tokio::test]
async fn cancel_unknown_admission_is_not_found() {
    let setup = TestSetup::new().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/admissions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&setup.server)
        .await;

    let result = setup.scheduler.cancel_admission(Uuid::new_v4()).await;

    assert_matches!(result, Err(SchedulingError::NotFound(_)));
}
