/// Execution limits applied by the interpreter.
///
/// The default imposes no limits: a program runs until it finishes or fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Maximum number of statements and loop iterations executed per run.
    pub step_limit: Option<u64>,
    /// Maximum number of elements a single `range(...)` call may produce.
    pub range_limit: Option<usize>,
    /// Maximum length of a string or list built by `+` or `*`.
    pub sequence_limit: Option<usize>,
}

impl RunConfig {
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn with_range_limit(mut self, limit: usize) -> Self {
        self.range_limit = Some(limit);
        self
    }

    pub fn with_sequence_limit(mut self, limit: usize) -> Self {
        self.sequence_limit = Some(limit);
        self
    }
}
