/// Blocking user-visible alert dialogs

pub trait Alerter: Send + Sync {
    /// Show `message` and return once the user dismissed it
    fn alert(&self, message: &str);
}

impl<A: Alerter + ?Sized> Alerter for std::sync::Arc<A> {
    fn alert(&self, message: &str) {
        (**self).alert(message)
    }
}

/// Drops every alert
pub struct NoopAlerter;

impl NoopAlerter {
    pub fn new() -> Self {
        NoopAlerter
    }
}

impl Default for NoopAlerter {
    fn default() -> Self {
        Self::new()
    }
}

impl Alerter for NoopAlerter {
    fn alert(&self, _message: &str) {}
}

/// Keeps shown messages in memory so tests can assert on them
pub struct RecordingAlerter {
    messages: std::sync::Mutex<Vec<String>>,
}

impl RecordingAlerter {
    pub fn new() -> Self {
        RecordingAlerter { messages: std::sync::Mutex::new(Vec::new()) }
    }

    /// Drain the messages shown so far
    pub fn take_messages(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap())
    }
}

impl Default for RecordingAlerter {
    fn default() -> Self {
        Self::new()
    }
}

impl Alerter for RecordingAlerter {
    fn alert(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Terminal alert: writes the message to stderr
pub struct StderrAlerter;

impl Alerter for StderrAlerter {
    fn alert(&self, message: &str) {
        eprintln!("alert: {}", message);
    }
}
