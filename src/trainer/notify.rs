//! Messages addressed to the user
//!
//! Over UCI the trainer has no channel to the player besides the moves it
//! plays, so review feedback goes through a separate [`Notifier`]. The
//! default one prints to stderr, which GUIs usually show in their engine log.

use std::cell::RefCell;
use std::io::Write;

/// Sink for user-facing messages
pub trait Notifier {
    fn send(&self, message: &str);
}

/// Writes each message as a line on stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn send(&self, message: &str) {
        let mut stderr = std::io::stderr().lock();
        // a closed stderr leaves nobody to tell
        let _ = writeln!(stderr, "{message}");
    }
}

/// Keeps every message in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: RefCell<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// Return and forget the messages received so far
    pub fn take(&self) -> Vec<String> {
        self.messages.take()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_take() {
        let notifier = RecordingNotifier::new();
        notifier.send("one");
        notifier.send("two");
        assert_eq!(notifier.messages(), vec!["one", "two"]);
        assert_eq!(notifier.take(), vec!["one", "two"]);
        assert!(notifier.messages().is_empty());
    }
}
