use std::cell::RefCell;
use std::io::{self, BufRead, IsTerminal, Write};

use async_trait::async_trait;
use readlog_core::{ConfirmRequest, Feedback, Severity};
use tracing::{info, warn};

/// Toasts go to stderr; confirmations are asked on the terminal.
pub struct TerminalFeedback {
    assume_yes: bool,
    shown: RefCell<Vec<(Severity, String)>>,
}

impl TerminalFeedback {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            shown: RefCell::new(Vec::new()),
        }
    }

    /// Whether any error toast was shown.
    pub fn saw_error(&self) -> bool {
        self.shown
            .borrow()
            .iter()
            .any(|(severity, _)| *severity == Severity::Error)
    }

    pub fn last_message(&self) -> Option<String> {
        self.shown.borrow().last().map(|(_, message)| message.clone())
    }
}

/// `y`/`yes`, case-insensitive; everything else declines.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait(?Send)]
impl Feedback for TerminalFeedback {
    fn toast(&self, message: &str, severity: Severity) {
        eprintln!("{} {message}", severity.icon());
        self.shown.borrow_mut().push((severity, message.to_string()));
    }

    async fn confirm(&self, request: ConfirmRequest) -> bool {
        if self.assume_yes {
            info!(title = %request.title, "confirmed by --yes");
            return true;
        }
        if !io::stdin().is_terminal() {
            warn!(title = %request.title, "no terminal to confirm on; declining");
            eprintln!("{}: declined (pass --yes to confirm non-interactively)", request.title);
            return false;
        }

        eprint!(
            "{}\n{}\n{}? [y/N] ",
            request.title, request.message, request.confirm_label
        );
        let _ = io::stderr().flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(error) => {
                warn!(error = %error, "failed reading confirmation");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_yes_confirms() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative(" YES "));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("yep"));
    }

    #[test]
    fn assume_yes_skips_the_prompt() {
        let feedback = TerminalFeedback::new(true);
        let answer =
            tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime")
                .block_on(feedback.confirm(ConfirmRequest::default()));
        assert!(answer);
    }

    #[test]
    fn remembers_error_toasts() {
        let feedback = TerminalFeedback::new(false);
        feedback.toast("Reading log created successfully", Severity::Success);
        assert!(!feedback.saw_error());
        feedback.toast("Failed to delete reading log", Severity::Error);
        assert!(feedback.saw_error());
        assert_eq!(
            feedback.last_message().as_deref(),
            Some("Failed to delete reading log")
        );
    }
}
