/*!
 * Engine Types
 * Request and response exchanged with the host suspend/resume operation
 */

use crate::core::errors::{Failure, FailureCode};
use crate::core::limits::{ENGINE_STATUS_ERROR, ENGINE_STATUS_OK, ENGINE_STATUS_UNSUPPORTED};
use crate::core::types::Handle;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token of a host diagnostic stream (e.g. a management command's
/// output) forwarded to the engine untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiagnosticStream(pub u64);

/// Status returned by the host operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    /// Restored (or dry run completed) successfully
    Ok,
    /// Failed; categorized causes follow
    Error,
    /// No checkpoint capability present
    Unsupported,
    /// Status this crate does not know
    Unknown(i32),
}

impl EngineStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            ENGINE_STATUS_OK => EngineStatus::Ok,
            ENGINE_STATUS_ERROR => EngineStatus::Error,
            ENGINE_STATUS_UNSUPPORTED => EngineStatus::Unsupported,
            other => EngineStatus::Unknown(other),
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        matches!(self, EngineStatus::Ok)
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineStatus::Ok => write!(f, "ok"),
            EngineStatus::Error => write!(f, "error"),
            EngineStatus::Unsupported => write!(f, "unsupported"),
            EngineStatus::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// One categorized failure reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostFailure {
    pub code: FailureCode,
    pub message: String,
}

impl HostFailure {
    pub fn new(code: FailureCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn to_failure(&self) -> Failure {
        Failure::host(self.code, self.message.clone())
    }
}

/// Arguments of one suspend/resume call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    /// The before-checkpoint side already failed; take the no-op path
    pub dry_run: bool,
    /// Handles claimed during this window
    pub claimed_handles: Vec<Handle>,
    pub diagnostics: Option<DiagnosticStream>,
}

/// Result of one suspend/resume call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResponse {
    pub status: EngineStatus,
    /// Replacement program arguments, space separated
    pub new_arguments: Option<String>,
    /// Replacement properties as `key=value` strings
    pub new_properties: Option<Vec<String>>,
    pub failures: Vec<HostFailure>,
}

impl EngineResponse {
    /// Bare response carrying only a status
    pub fn new(status: EngineStatus) -> Self {
        Self {
            status,
            new_arguments: None,
            new_properties: None,
            failures: Vec::new(),
        }
    }

    /// Successful restore without replacement arguments or properties
    pub fn ok() -> Self {
        Self::new(EngineStatus::Ok)
    }

    pub fn error(failures: Vec<HostFailure>) -> Self {
        Self {
            failures,
            ..Self::new(EngineStatus::Error)
        }
    }

    pub fn unsupported() -> Self {
        Self::new(EngineStatus::Unsupported)
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.new_arguments = Some(arguments.into());
        self
    }

    #[must_use]
    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.new_properties = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    /// Build from the host's raw bundle with parallel code/message arrays
    ///
    /// Unpaired trailing entries are dropped with a warning.
    pub fn from_raw(
        status: i32,
        new_arguments: Option<String>,
        new_properties: Option<Vec<String>>,
        codes: &[i32],
        messages: &[String],
    ) -> Self {
        if codes.len() != messages.len() {
            warn!(
                "Host reported {} failure code(s) but {} message(s)",
                codes.len(),
                messages.len()
            );
        }
        let failures = codes
            .iter()
            .zip(messages)
            .map(|(code, message)| HostFailure::new(FailureCode::from_code(*code), message.clone()))
            .collect();
        Self {
            status: EngineStatus::from_code(status),
            new_arguments,
            new_properties,
            failures,
        }
    }

    #[inline]
    pub fn status(&self) -> EngineStatus {
        self.status
    }
}
