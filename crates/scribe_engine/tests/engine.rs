use std::time::{Duration, Instant};

use scribe_core::{BookVariant, Identity, Language, SessionStatus, GENERIC_FAILURE_MESSAGE};
use scribe_engine::{ClientSettings, EngineHandle, RunningOwners, SessionController};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine_for(server: &MockServer) -> EngineHandle {
    let settings = ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    };
    EngineHandle::new(settings).expect("engine")
}

/// Pumps events until the session leaves `Running` or the deadline passes.
fn drive_to_terminal(controller: &mut SessionController<EngineHandle>) -> Vec<u8> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut progress = Vec::new();
    while controller.status() == SessionStatus::Running && Instant::now() < deadline {
        if controller.pump() == 0 {
            std::thread::sleep(Duration::from_millis(10));
        }
        progress.push(controller.session().progress_percent());
    }
    progress
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_runs_a_generation_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generateBookMed"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![7u8; 2048], "application/pdf"))
        .mount(&server)
        .await;

    let mut controller =
        SessionController::new(Identity::new("uid-9"), engine_for(&server), RunningOwners::new());
    controller
        .submit("A detective story", BookVariant::Medium, Language::English)
        .expect("accepted");

    let trace = tokio::task::block_in_place(|| drive_to_terminal(&mut controller));
    assert!(trace.windows(2).all(|pair| pair[0] <= pair[1]));

    let view = controller.view();
    assert_eq!(view.status, SessionStatus::Succeeded);
    assert_eq!(view.progress_percent, 100);
    let artifact = view.result_artifact.expect("artifact");
    assert_eq!(artifact.file_name, "A_detective_story.pdf");
    let blobs = controller.dispatcher().blobs().clone();
    assert_eq!(blobs.get(&artifact.url).map(|b| b.len()), Some(2048));

    controller.reset();
    assert!(blobs.get(&artifact.url).is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_failure_lands_in_failed_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generateBookSmall"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let mut controller =
        SessionController::new(Identity::new("uid-9"), engine_for(&server), RunningOwners::new());
    controller
        .submit("A detective story", BookVariant::Short, Language::English)
        .expect("accepted");
    tokio::task::block_in_place(|| drive_to_terminal(&mut controller));

    assert_eq!(controller.status(), SessionStatus::Failed);
    assert_eq!(
        controller.view().last_error.as_deref(),
        Some(GENERIC_FAILURE_MESSAGE)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_notifies_service_and_discards_the_late_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generateBookLong"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(200))
                .set_body_raw("%PDF", "application/pdf"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/cancelGeneration"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller =
        SessionController::new(Identity::new("uid-9"), engine_for(&server), RunningOwners::new());
    controller
        .submit("A detective story", BookVariant::Long, Language::English)
        .expect("accepted");
    assert!(controller.cancel());
    assert_eq!(controller.status(), SessionStatus::Cancelled);
    let cancelled = controller.session().clone();

    let blobs = controller.dispatcher().blobs().clone();
    tokio::task::block_in_place(|| {
        let deadline = Instant::now() + Duration::from_secs(3);
        // The late document arrives, is ignored, and its blob is released.
        while Instant::now() < deadline {
            controller.pump();
            std::thread::sleep(Duration::from_millis(20));
        }
    });
    assert_eq!(controller.session(), &cancelled);
    assert!(blobs.is_empty());
}
