/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use super::types::Handle;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category of a failure reported by the host suspend/resume operation
///
/// The host may report codes this crate does not know; they are kept as
/// `Other` rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    OpenFile,
    OpenSocket,
    OpenPipe,
    Other(i32),
}

impl FailureCode {
    pub const GENERIC: i32 = 0;
    pub const FILE: i32 = 1;
    pub const SOCKET: i32 = 2;
    pub const PIPE: i32 = 3;

    /// Decode the host's numeric failure code
    pub fn from_code(code: i32) -> Self {
        match code {
            Self::FILE => FailureCode::OpenFile,
            Self::SOCKET => FailureCode::OpenSocket,
            Self::PIPE => FailureCode::OpenPipe,
            other => FailureCode::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            FailureCode::OpenFile => Self::FILE,
            FailureCode::OpenSocket => Self::SOCKET,
            FailureCode::OpenPipe => Self::PIPE,
            FailureCode::Other(code) => *code,
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCode::OpenFile => write!(f, "open file"),
            FailureCode::OpenSocket => write!(f, "open socket"),
            FailureCode::OpenPipe => write!(f, "open pipe"),
            FailureCode::Other(code) => write!(f, "open resource (code {})", code),
        }
    }
}

/// A single failure cause collected during a notification pass
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum Failure {
    #[error("Resource {resource} failed: {reason}")]
    #[diagnostic(
        code(crac::resource_failed),
        help("The resource could not suspend or resume cleanly. Inspect its own logs.")
    )]
    Resource { resource: String, reason: String },

    #[error("Host reported {kind} still held at checkpoint: {message}")]
    #[diagnostic(
        code(crac::handle_still_open),
        help("Close the handle in beforeCheckpoint or claim it so it can be restored.")
    )]
    HostHandle { kind: FailureCode, message: String },

    #[error("Notification was interrupted")]
    #[diagnostic(code(crac::interrupted))]
    Interrupted,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Restore(#[from] RestoreError),

    #[error("Replaying restored arguments failed: {0}")]
    #[diagnostic(code(crac::replay_failed))]
    Replay(String),

    #[error("Recursive checkpoint is not allowed")]
    #[diagnostic(
        code(crac::recursive_session),
        help("A resource must not request a checkpoint from inside its own notification.")
    )]
    Recursive,

    #[error("Checkpoint/restore is not configured")]
    #[diagnostic(code(crac::not_configured))]
    NotConfigured,

    #[error("Unknown checkpoint/restore result: {0}")]
    #[diagnostic(code(crac::unknown_status))]
    UnknownStatus(i32),

    #[error("{0}")]
    Other(String),
}

impl Failure {
    /// Failure attributed to a named resource
    pub fn resource(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Failure::Resource {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Free-form failure
    pub fn other(message: impl Into<String>) -> Self {
        Failure::Other(message.into())
    }

    /// Categorized host failure
    pub fn host(kind: FailureCode, message: impl Into<String>) -> Self {
        Failure::HostHandle {
            kind,
            message: message.into(),
        }
    }
}

/// Aggregate raised while still running in the original instance
///
/// Checkpoint or restore did not complete end-to-end.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Diagnostic)]
#[error("Checkpoint failed with {} cause(s)", .causes.len())]
#[diagnostic(
    code(crac::checkpoint_failed),
    help("Execution continues in the original instance. See the nested causes.")
)]
pub struct CheckpointError {
    causes: Vec<Failure>,
}

/// Aggregate raised in the resumed instance
///
/// The underlying suspend/resume succeeded but post-restore notification failed.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Diagnostic)]
#[error("Restore failed with {} cause(s)", .causes.len())]
#[diagnostic(
    code(crac::restore_failed),
    help("Execution continues in the restored instance. See the nested causes.")
)]
pub struct RestoreError {
    causes: Vec<Failure>,
}

macro_rules! aggregate_accessors {
    ($ty:ty) => {
        impl $ty {
            pub fn new() -> Self {
                Self { causes: Vec::new() }
            }

            pub fn with_causes(causes: Vec<Failure>) -> Self {
                Self { causes }
            }

            #[inline]
            pub fn causes(&self) -> &[Failure] {
                &self.causes
            }

            pub fn into_causes(self) -> Vec<Failure> {
                self.causes
            }

            pub fn add_cause(&mut self, cause: Failure) {
                self.causes.push(cause);
            }

            #[inline]
            pub fn len(&self) -> usize {
                self.causes.len()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.causes.is_empty()
            }

            /// Multi-line rendering of the aggregate and its causes
            pub fn report(&self) -> String {
                let mut out = self.to_string();
                for (i, cause) in self.causes.iter().enumerate() {
                    out.push_str(&format!("\n  [{}] {}", i + 1, cause));
                }
                out
            }
        }
    };
}

aggregate_accessors!(CheckpointError);
aggregate_accessors!(RestoreError);

/// Outcome of a whole checkpoint/restore session
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SessionError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Restore(#[from] RestoreError),

    #[error("Checkpoint/restore is not supported")]
    #[diagnostic(
        code(crac::unsupported),
        help("No checkpoint engine capability is present. No resource was notified.")
    )]
    Unsupported,

    #[error("Recursive checkpoint is not allowed")]
    #[diagnostic(
        code(crac::recursive_session),
        help("A resource must not request a checkpoint from inside its own notification.")
    )]
    Recursive,
}

impl From<SessionError> for Failure {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Checkpoint(e) => Failure::Checkpoint(e),
            SessionError::Restore(e) => Failure::Restore(e),
            SessionError::Unsupported => Failure::NotConfigured,
            SessionError::Recursive => Failure::Recursive,
        }
    }
}

/// Session result type
pub type SessionResult<T> = Result<T, SessionError>;

/// Handle claim errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ClaimError {
    #[error("{handle} was already claimed by {owner}")]
    #[diagnostic(
        code(crac::already_claimed),
        help("Each handle may be claimed once per checkpoint window. Use claim_weak for shared handles.")
    )]
    AlreadyClaimed { handle: Handle, owner: String },
}

pub type ClaimResult<T> = Result<T, ClaimError>;
