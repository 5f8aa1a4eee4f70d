use std::sync::{Mutex, Once};

use log::{Level, LevelFilter, Log, Metadata, Record};
use scribe_core::{BookVariant, GenerationRequest, GenerationToken, Identity, Language};
use scribe_engine::{
    FailureKind, JobDispatcher, JobEvent, RunningOwners, SessionController, TransportError,
};

static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&CaptureLogger).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

fn records_mentioning(needle: &str) -> Vec<(Level, String)> {
    RECORDS
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, message)| message.contains(needle))
        .cloned()
        .collect()
}

struct SilentDispatcher;

impl JobDispatcher for SilentDispatcher {
    fn dispatch(&self, _token: GenerationToken, _request: GenerationRequest) {}
    fn request_cancel(&self, _owner_id: &str) {}
    fn release_artifact(&self, _url: &str) {}
}

fn owner() -> Identity {
    Identity {
        id: "uid-stale".to_string(),
        display_name: None,
        email: None,
        avatar_url: None,
    }
}

fn unreachable_backend() -> TransportError {
    TransportError {
        kind: FailureKind::Network,
        message: "backend-went-away".to_string(),
    }
}

#[test]
fn failure_after_cancel_is_not_logged_as_an_error() {
    capture_logs();
    let mut controller = SessionController::new(owner(), SilentDispatcher, RunningOwners::new());
    let token = controller
        .submit("A detective story", BookVariant::Short, Language::English)
        .expect("submit");
    assert!(controller.cancel());

    controller.handle_event(JobEvent::Completed {
        token,
        result: Err(unreachable_backend()),
    });

    let records = records_mentioning("backend-went-away");
    assert!(!records.is_empty());
    assert!(records.iter().all(|(level, _)| *level == Level::Debug));
}

#[test]
fn failure_of_the_running_job_is_logged_as_an_error() {
    capture_logs();
    let identity = Identity {
        id: "uid-live".to_string(),
        ..owner()
    };
    let mut controller = SessionController::new(identity, SilentDispatcher, RunningOwners::new());
    let token = controller
        .submit("A history of bridges", BookVariant::Short, Language::English)
        .expect("submit");

    controller.handle_event(JobEvent::Completed {
        token,
        result: Err(TransportError {
            kind: FailureKind::Timeout,
            message: "live-job-timeout".to_string(),
        }),
    });

    let records = records_mentioning("live-job-timeout");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].0, Level::Error);
}
