use std::process::ExitCode;

/// Exit status of a pmw run.
///
/// - `Success` (0): run completed, was aborted on request, or was interrupted
///   after saving progress
/// - `Error` (2): run could not start (config unreadable, setup failed)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// Run completed, or stopped after saving progress.
    Success,
    /// Run could not start.
    Error,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Error => 2,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}
