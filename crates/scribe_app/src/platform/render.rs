use std::io::{self, Write};

use scribe_core::{SessionStatus, SessionViewModel};

const BAR_WIDTH: usize = 30;

/// One terminal status line for the current view.
pub(crate) fn status_line(view: &SessionViewModel) -> String {
    match view.status {
        SessionStatus::Running => {
            let filled = usize::from(view.progress_percent.min(100)) * BAR_WIDTH / 100;
            format!(
                "[{}{}] {:>3}%",
                "#".repeat(filled),
                ".".repeat(BAR_WIDTH - filled),
                view.progress_percent
            )
        }
        _ => view.summary(),
    }
}

/// Redraws the status line in place on stderr.
pub(crate) fn render(view: &SessionViewModel) {
    let mut stderr = io::stderr().lock();
    let _ = write!(stderr, "\r{}", status_line(view));
    if view.status.is_terminal() {
        let _ = writeln!(stderr);
    }
    let _ = stderr.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_view_draws_a_bar() {
        let view = SessionViewModel {
            status: SessionStatus::Running,
            progress_percent: 50,
            ..SessionViewModel::default()
        };
        assert_eq!(
            status_line(&view),
            format!("[{}{}]  50%", "#".repeat(15), ".".repeat(15))
        );
    }

    #[test]
    fn terminal_views_show_the_summary() {
        let view = SessionViewModel {
            status: SessionStatus::Cancelled,
            last_error: Some("cancelled by user".to_string()),
            ..SessionViewModel::default()
        };
        assert_eq!(status_line(&view), "cancelled by user");
    }
}
