// src/progress.rs
/// Lightweight progress reporting used by long-running operations (convert/process).
/// Frontends implement this to surface status to users.
pub trait Progress {
    /// Called at the start with the total number of items (if known).
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One capture file was read.
    fn item_done(&mut self, _name: &str, _records: usize) {}

    /// One capture file was skipped.
    fn item_skipped(&mut self, _name: &str, _reason: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// Prints status lines to stderr.
pub struct ConsoleProgress {
    total: usize,
    done: usize,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self { total: 0, done: 0 }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
    }

    fn log(&mut self, msg: &str) {
        eprintln!("{msg}");
    }

    fn item_done(&mut self, name: &str, records: usize) {
        self.done += 1;
        eprintln!("[{}/{}] {name}: {records} journeys", self.done, self.total);
    }

    fn item_skipped(&mut self, name: &str, reason: &str) {
        self.done += 1;
        eprintln!("[{}/{}] {name}: skipped ({reason})", self.done, self.total);
    }
}
