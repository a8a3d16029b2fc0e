//! Recovery configuration.

/// Configuration for a recovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryConfig {
    /// Characters wrapping every log line.
    pub delimiters: (char, char),

    /// Run the whole pass but never write to the store.
    pub dry_run: bool,

    /// Flush the store once the pass completes.
    pub flush_on_complete: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            delimiters: ('<', '>'),
            dry_run: false,
            flush_on_complete: true,
        }
    }
}

impl RecoveryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the line wrapper characters.
    #[must_use]
    pub const fn delimiters(mut self, open: char, close: char) -> Self {
        self.delimiters = (open, close);
        self
    }

    /// Sets whether to skip all store writes.
    #[must_use]
    pub const fn dry_run(mut self, value: bool) -> Self {
        self.dry_run = value;
        self
    }

    /// Sets whether to flush the store at the end of the pass.
    #[must_use]
    pub const fn flush_on_complete(mut self, value: bool) -> Self {
        self.flush_on_complete = value;
        self
    }
}
