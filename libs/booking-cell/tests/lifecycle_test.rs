use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use tokio_test::assert_ok;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::*;
use shared_api_client::QueueApiClient;
use shared_models::{BookingStatus, ClientError, MutationOutcome};
use shared_utils::test_utils::{MockQueueResponses, RecordingConfirmer, TestConfig};

struct Harness {
    server: MockServer,
    store: Arc<MemoryRecoveryStore>,
    confirmer: Arc<RecordingConfirmer>,
    controller: BookingLifecycleController,
}

async fn setup_with(confirmer: RecordingConfirmer) -> Harness {
    let server = MockServer::start().await;
    let config = TestConfig::with_base_url(format!("{}/api", server.uri())).to_client_config();
    let api = Arc::new(QueueApiClient::new(&config).expect("client should build"));
    let store = Arc::new(MemoryRecoveryStore::new());
    let confirmer = Arc::new(confirmer);

    let controller = BookingLifecycleController::new(
        api,
        store.clone(),
        confirmer.clone(),
        &config,
    );

    Harness {
        server,
        store,
        confirmer,
        controller,
    }
}

async fn setup() -> Harness {
    setup_with(RecordingConfirmer::accepting()).await
}

async fn mount_detail(server: &MockServer, id: &str, status: &str, position: Option<u32>) {
    Mock::given(method("GET"))
        .and(path(format!("/api/bookings/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockQueueResponses::booking_detail(id, "Alice", status, position),
        ))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_with_blank_name_makes_no_request() {
    let h = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/bookings"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&h.server)
        .await;

    let err = h.controller.create("   ").await.unwrap_err();
    assert_eq!(err, ClientError::Validation("Please enter your name.".to_string()));
    assert_eq!(h.controller.form().error.as_deref(), Some("Please enter your name."));
    assert_eq!(h.store.load(), None);
}

#[tokio::test]
async fn test_create_remembers_booking_id() {
    let h = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/bookings"))
        .and(body_json(serde_json::json!({ "patientName": "Alice" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(MockQueueResponses::booking_created("a1b2c3d4", "Alice")),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    h.controller.set_patient_name(" Alice ");
    let id = assert_ok!(h.controller.create(" Alice ").await);

    assert_eq!(id, "a1b2c3d4");
    assert_eq!(h.store.load().as_deref(), Some("a1b2c3d4"));

    let form = h.controller.form();
    assert!(form.patient_name.is_empty());
    assert!(!form.submitting);
    assert!(form.message.unwrap().contains("a1b2c3d4"));
    assert_eq!(form.last_booking_id.as_deref(), Some("a1b2c3d4"));
}

#[tokio::test]
async fn test_create_failure_shows_server_message() {
    let h = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/bookings"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(MockQueueResponses::message("Clinic is closed for today")),
        )
        .mount(&h.server)
        .await;

    let err = h.controller.create("Alice").await.unwrap_err();
    assert_matches!(err, ClientError::Server { status: 500, .. });
    assert_eq!(h.controller.form().error.as_deref(), Some("Clinic is closed for today"));
    assert_eq!(h.store.load(), None);
}

#[tokio::test]
async fn test_open_status_view_prefills_without_fetching() {
    let h = setup().await;
    h.store.save("a1b2c3d4");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    assert_eq!(h.controller.open_status_view().as_deref(), Some("a1b2c3d4"));
    let view = h.controller.status();
    assert_eq!(view.input, "a1b2c3d4");
    assert!(view.checked_id.is_none());
}

#[tokio::test]
async fn test_lookup_done_forgets_remembered_id() {
    let h = setup().await;
    h.store.save("a1b2c3d4");
    mount_detail(&h.server, "a1b2c3d4", "Done", None).await;

    let outcome = assert_ok!(h.controller.lookup("a1b2c3d4").await);
    assert_matches!(outcome, LookupOutcome::Current(ref b) if b.status == BookingStatus::Done);
    assert_eq!(h.store.load(), None);
    assert!(!h.controller.status().can_cancel());
}

#[tokio::test]
async fn test_lookup_of_another_terminal_booking_keeps_remembered_id() {
    let h = setup().await;
    h.store.save("a1b2c3d4");
    mount_detail(&h.server, "zz99yy88", "Cancelled", None).await;

    assert_ok!(h.controller.lookup("zz99yy88").await);
    assert_eq!(h.store.load().as_deref(), Some("a1b2c3d4"));
}

#[tokio::test]
async fn test_lookup_not_found_clears_detail() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/bookings/nope0000"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(MockQueueResponses::message("Booking not found.")),
        )
        .mount(&h.server)
        .await;

    let err = h.controller.lookup("nope0000").await.unwrap_err();
    assert!(err.is_not_found());

    let view = h.controller.status();
    assert!(view.detail.is_none());
    assert!(!view.loading);
    assert_eq!(view.error.as_deref(), Some("Booking not found."));
}

#[tokio::test]
async fn test_blank_lookup_is_rejected_locally() {
    let h = setup().await;

    let err = h.controller.lookup("  ").await.unwrap_err();
    assert_eq!(err, ClientError::Validation("Please enter your Booking ID.".to_string()));
    assert!(h.controller.status().visible_detail().is_none());
    assert!(h.server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_stale_lookup_never_overwrites_newer_one() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/bookings/XYZ123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockQueueResponses::booking_detail("XYZ123", "Xavier", "Waiting", Some(2)))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&h.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/bookings/ABC999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockQueueResponses::booking_detail("ABC999", "Alice", "Waiting", Some(1)),
        ))
        .mount(&h.server)
        .await;

    let slow = h.controller.lookup("XYZ123");
    let fast = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.controller.lookup("ABC999").await
    };
    let (slow, fast) = futures::join!(slow, fast);

    assert_eq!(assert_ok!(slow), LookupOutcome::Superseded);
    assert_matches!(assert_ok!(fast), LookupOutcome::Current(ref b) if b.booking_id == "ABC999");

    let view = h.controller.status();
    assert_eq!(view.checked_id.as_deref(), Some("ABC999"));
    assert_eq!(view.visible_detail().map(|b| b.patient_name.as_str()), Some("Alice"));
    assert!(!view.loading);
}

#[tokio::test]
async fn test_cancel_is_applied_before_any_poll() {
    let h = setup().await;
    h.store.save("a1b2c3d4");
    mount_detail(&h.server, "a1b2c3d4", "Waiting", Some(2)).await;

    Mock::given(method("DELETE"))
        .and(path("/api/bookings/a1b2c3d4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockQueueResponses::message("Booking cancelled successfully.")),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    assert_ok!(h.controller.lookup("a1b2c3d4").await);
    let outcome = assert_ok!(h.controller.cancel("a1b2c3d4").await);
    assert_matches!(outcome, MutationOutcome::Applied { .. });

    let view = h.controller.status();
    let detail = view.visible_detail().expect("detail stays visible");
    assert_eq!(detail.status, BookingStatus::Cancelled);
    assert_eq!(detail.position, None);
    assert_eq!(view.message.as_deref(), Some("Booking cancelled successfully."));
    assert_eq!(h.store.load(), None);

    assert_eq!(
        h.confirmer.prompts(),
        vec!["Are you sure you want to cancel the booking for Alice (ID: a1b2c3d4)?".to_string()]
    );

    // Only the one lookup hit the detail endpoint.
    let gets = h
        .server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    assert_eq!(gets, 1);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(h.controller.status().message.is_none());
}

#[tokio::test]
async fn test_declined_cancel_makes_no_request() {
    let h = setup_with(RecordingConfirmer::declining()).await;
    mount_detail(&h.server, "a1b2c3d4", "Waiting", Some(1)).await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    assert_ok!(h.controller.lookup("a1b2c3d4").await);
    let outcome = assert_ok!(h.controller.cancel("a1b2c3d4").await);

    assert_eq!(outcome, MutationOutcome::Declined);
    let view = h.controller.status();
    assert_eq!(view.visible_detail().map(|b| b.status), Some(BookingStatus::Waiting));
}

#[tokio::test]
async fn test_cancel_requires_displayed_waiting_booking() {
    let h = setup().await;
    mount_detail(&h.server, "a1b2c3d4", "Done", None).await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    // Nothing displayed yet.
    assert_matches!(
        h.controller.cancel("a1b2c3d4").await,
        Err(ClientError::InvalidState(_))
    );

    assert_ok!(h.controller.lookup("a1b2c3d4").await);
    assert_matches!(
        h.controller.cancel("a1b2c3d4").await,
        Err(ClientError::InvalidState(_))
    );
    assert!(h.confirmer.prompts().is_empty());
}

#[tokio::test]
async fn test_failed_cancel_leaves_detail_unchanged() {
    let h = setup().await;
    h.store.save("a1b2c3d4");
    mount_detail(&h.server, "a1b2c3d4", "Waiting", Some(1)).await;

    Mock::given(method("DELETE"))
        .and(path("/api/bookings/a1b2c3d4"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(MockQueueResponses::message("Booking can no longer be cancelled")),
        )
        .mount(&h.server)
        .await;

    assert_ok!(h.controller.lookup("a1b2c3d4").await);
    let err = h.controller.cancel("a1b2c3d4").await.unwrap_err();
    assert_matches!(err, ClientError::Server { status: 400, .. });

    let view = h.controller.status();
    assert_eq!(view.visible_detail().map(|b| b.status), Some(BookingStatus::Waiting));
    assert_eq!(view.error.as_deref(), Some("Booking can no longer be cancelled"));
    assert!(!view.cancelling);
    assert_eq!(h.store.load().as_deref(), Some("a1b2c3d4"));
}

#[tokio::test]
async fn test_cancel_is_dropped_when_view_changes_during_prompt() {
    let h = setup_with(RecordingConfirmer::accepting_after(Duration::from_millis(200))).await;
    mount_detail(&h.server, "a1b2c3d4", "Waiting", Some(1)).await;
    mount_detail(&h.server, "zz99yy88", "Waiting", Some(2)).await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    assert_ok!(h.controller.lookup("a1b2c3d4").await);

    let cancel = h.controller.cancel("a1b2c3d4");
    let switch = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.controller.lookup("zz99yy88").await
    };
    let (cancel, switch) = futures::join!(cancel, switch);

    assert_matches!(cancel, Err(ClientError::InvalidState(_)));
    assert_ok!(switch);

    let view = h.controller.status();
    let detail = view.visible_detail().expect("new lookup is shown");
    assert_eq!(detail.booking_id, "zz99yy88");
    assert_eq!(detail.status, BookingStatus::Waiting);
    assert!(!view.cancelling);
}

#[tokio::test]
async fn test_concurrent_cancels_send_one_request() {
    let h = setup_with(RecordingConfirmer::accepting_after(Duration::from_millis(100))).await;
    mount_detail(&h.server, "a1b2c3d4", "Waiting", Some(1)).await;

    Mock::given(method("DELETE"))
        .and(path("/api/bookings/a1b2c3d4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockQueueResponses::message("Booking cancelled successfully."))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    assert_ok!(h.controller.lookup("a1b2c3d4").await);

    let (first, second) = futures::join!(
        h.controller.cancel("a1b2c3d4"),
        h.controller.cancel("a1b2c3d4")
    );

    // Both prompts were open together; only the first to confirm goes out.
    assert_matches!(first, Ok(MutationOutcome::Applied { .. }));
    assert_matches!(second, Err(ClientError::InvalidState(_)));
    assert_eq!(h.confirmer.prompts().len(), 2);
}
