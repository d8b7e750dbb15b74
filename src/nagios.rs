use std::fmt;
use std::process::ExitCode;

/// Plugin return codes understood by Nagios-compatible supervisors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NagiosStatus {
    Ok,
    /// Reserved. No check in this crate emits it.
    Warning,
    Critical,
    Unknown,
}

impl NagiosStatus {
    pub const fn code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
            Self::Unknown => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for NagiosStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Final verdict of one check run: a single stdout line plus the exit code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub status: NagiosStatus,
    pub message: String,
}

impl Report {
    pub fn new(status: NagiosStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(NagiosStatus::Ok, message)
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self::new(NagiosStatus::Critical, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(NagiosStatus::Unknown, message)
    }

    /// Message flattened to one line, the way supervisors read plugin output
    pub fn line(&self) -> String {
        self.message
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status.code())
    }
}
