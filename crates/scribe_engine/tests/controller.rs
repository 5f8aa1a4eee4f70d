use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use pretty_assertions::assert_eq;
use scribe_core::{
    BookVariant, GenerationRequest, GenerationToken, Identity, Language, ResultArtifact,
    SessionStatus, SubmitError, CANCELLED_MESSAGE, GENERIC_FAILURE_MESSAGE,
};
use scribe_engine::{
    FailureKind, GeneratedArtifact, JobDispatcher, JobEvent, RunningOwners, SessionController,
    TransportError,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scribe_logging::initialize_for_tests);
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Dispatch(GenerationToken, GenerationRequest),
    Cancel(String),
    Release(String),
}

#[derive(Clone, Default)]
struct RecordingDispatcher {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl RecordingDispatcher {
    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn dispatched_prompts(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Dispatch(_, request) => Some(request.prompt_text().to_string()),
                _ => None,
            })
            .collect()
    }
}

impl JobDispatcher for RecordingDispatcher {
    fn dispatch(&self, token: GenerationToken, request: GenerationRequest) {
        self.calls.borrow_mut().push(Call::Dispatch(token, request));
    }

    fn request_cancel(&self, owner_id: &str) {
        self.calls
            .borrow_mut()
            .push(Call::Cancel(owner_id.to_string()));
    }

    fn release_artifact(&self, url: &str) {
        self.calls.borrow_mut().push(Call::Release(url.to_string()));
    }
}

fn controller(
    owners: RunningOwners,
) -> (SessionController<RecordingDispatcher>, RecordingDispatcher) {
    let dispatcher = RecordingDispatcher::default();
    let identity = Identity {
        id: "uid-1".to_string(),
        display_name: Some("Ada".to_string()),
        email: None,
        avatar_url: None,
    };
    (
        SessionController::new(identity, dispatcher.clone(), owners),
        dispatcher,
    )
}

fn completed(token: GenerationToken, url: &str, file_name: &str) -> JobEvent {
    JobEvent::Completed {
        token,
        result: Ok(GeneratedArtifact {
            url: url.to_string(),
            file_name: file_name.to_string(),
            byte_len: 1024,
        }),
    }
}

#[test]
fn detective_story_scenario() {
    init_logging();
    let (mut controller, dispatcher) = controller(RunningOwners::new());

    let token = controller
        .submit("A detective story", BookVariant::Medium, Language::English)
        .expect("accepted");
    assert_eq!(controller.status(), SessionStatus::Running);
    assert_eq!(
        dispatcher.dispatched_prompts(),
        vec!["A detective story (write this content in English)".to_string()]
    );

    let mut trace = Vec::new();
    for percent in [10, 45, 80] {
        controller.handle_event(JobEvent::Progress { token, percent });
        trace.push(controller.session().progress_percent());
    }
    assert_eq!(trace, vec![10, 45, 80]);

    controller.handle_event(completed(token, "blob:1", "A_detective_story.pdf"));
    let view = controller.view();
    assert_eq!(view.status, SessionStatus::Succeeded);
    assert_eq!(view.progress_percent, 100);
    assert_eq!(
        view.result_artifact,
        Some(ResultArtifact {
            url: "blob:1".to_string(),
            file_name: "A_detective_story.pdf".to_string(),
        })
    );
    assert_eq!(view.last_error, None);
}

#[test]
fn empty_prompt_never_reaches_the_job_client() {
    init_logging();
    let (mut controller, dispatcher) = controller(RunningOwners::new());

    assert_eq!(
        controller.submit("", BookVariant::Short, Language::English),
        Err(SubmitError::Validation)
    );
    assert_eq!(
        controller.submit("  \n ", BookVariant::Short, Language::English),
        Err(SubmitError::Validation)
    );
    assert_eq!(controller.status(), SessionStatus::Idle);
    assert!(dispatcher.calls().is_empty());
    assert!(!controller.consume_dirty());
}

#[test]
fn second_submit_while_running_is_rejected() {
    init_logging();
    let (mut controller, dispatcher) = controller(RunningOwners::new());
    controller
        .submit("first", BookVariant::Long, Language::Amharic)
        .expect("accepted");
    let before = controller.session().clone();

    assert_eq!(
        controller.submit("second", BookVariant::Long, Language::Amharic),
        Err(SubmitError::ConcurrencyViolation)
    );
    assert_eq!(controller.session(), &before);
    assert_eq!(dispatcher.dispatched_prompts().len(), 1);
    assert_eq!(
        dispatcher.dispatched_prompts()[0],
        "first (write this content in Amharic)"
    );
}

#[test]
fn one_running_job_per_identity_across_controllers() {
    init_logging();
    let owners = RunningOwners::new();
    let (mut first, _) = controller(owners.clone());
    let (mut second, second_dispatcher) = controller(owners.clone());

    let token = first
        .submit("first", BookVariant::Medium, Language::English)
        .expect("accepted");
    assert!(owners.is_running("uid-1"));
    assert_eq!(
        second.submit("second", BookVariant::Medium, Language::English),
        Err(SubmitError::ConcurrencyViolation)
    );
    assert_eq!(second.status(), SessionStatus::Idle);
    assert!(second_dispatcher.calls().is_empty());

    first.handle_event(completed(token, "blob:1", "first.pdf"));
    assert!(!owners.is_running("uid-1"));
    second
        .submit("second", BookVariant::Medium, Language::English)
        .expect("accepted once the first finished");
}

#[test]
fn cancel_is_immediate_and_late_events_are_discarded() {
    init_logging();
    let owners = RunningOwners::new();
    let (mut controller, dispatcher) = controller(owners.clone());
    let token = controller
        .submit("A detective story", BookVariant::Medium, Language::English)
        .expect("accepted");

    assert!(controller.cancel());
    let view = controller.view();
    assert_eq!(view.status, SessionStatus::Cancelled);
    assert_eq!(view.progress_percent, 0);
    assert_eq!(view.last_error.as_deref(), Some(CANCELLED_MESSAGE));
    assert!(!owners.is_running("uid-1"));
    assert_eq!(dispatcher.calls().last(), Some(&Call::Cancel("uid-1".to_string())));

    let cancelled = controller.session().clone();
    controller.handle_event(JobEvent::Progress { token, percent: 70 });
    controller.handle_event(completed(token, "blob:5", "late.pdf"));
    assert_eq!(controller.session(), &cancelled);
    assert_eq!(dispatcher.calls().last(), Some(&Call::Release("blob:5".to_string())));

    assert!(!controller.cancel());
}

#[test]
fn transport_failure_is_reported_generically() {
    init_logging();
    let (mut controller, _) = controller(RunningOwners::new());
    let token = controller
        .submit("A detective story", BookVariant::Medium, Language::English)
        .expect("accepted");

    controller.handle_event(JobEvent::Completed {
        token,
        result: Err(TransportError {
            kind: FailureKind::Network,
            message: "error sending request for url (https://internal.example/api)".to_string(),
        }),
    });
    assert_eq!(controller.status(), SessionStatus::Failed);
    assert_eq!(
        controller.view().last_error.as_deref(),
        Some(GENERIC_FAILURE_MESSAGE)
    );
}

#[test]
fn dropping_the_controller_releases_the_displayed_artifact() {
    init_logging();
    let owners = RunningOwners::new();
    let (mut controller, dispatcher) = controller(owners.clone());
    let token = controller
        .submit("a story", BookVariant::Short, Language::English)
        .expect("accepted");
    controller.handle_event(completed(token, "blob:2", "a_story.pdf"));

    drop(controller);
    assert_eq!(dispatcher.calls().last(), Some(&Call::Release("blob:2".to_string())));
    assert!(!owners.is_running("uid-1"));
}

#[test]
fn dropping_a_running_controller_frees_the_owner() {
    init_logging();
    let owners = RunningOwners::new();
    let (mut controller, _) = controller(owners.clone());
    controller
        .submit("a story", BookVariant::Short, Language::English)
        .expect("accepted");
    assert!(owners.is_running("uid-1"));

    drop(controller);
    assert!(!owners.is_running("uid-1"));
}
