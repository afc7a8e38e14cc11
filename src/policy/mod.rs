/*!
 * Resource Policies
 * Per-resource actions loaded from a numbered properties file
 *
 * ```text
 * policy.1=FD
 * policy.1.id=5
 * policy.1.action=IGNORE
 * ```
 *
 * Entries are read for n = 1, 2, ... until the first missing `policy.<n>`.
 */

mod properties;

pub use properties::Properties;

use crate::core::limits::{POLICY_FIRST_INDEX, POLICY_PREFIX};
use crate::core::types::{Handle, RawHandle};
use ahash::HashMap;
use log::{debug, info, warn};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Kind of resource a policy applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    /// Open file descriptor, keyed by descriptor number
    #[serde(rename = "FD")]
    FileDescriptor,
}

impl FromStr for PolicyKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "FD" => Ok(PolicyKind::FileDescriptor),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::FileDescriptor => write!(f, "FD"),
        }
    }
}

/// What to do with a resource still open at checkpoint time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyAction {
    /// Report it as a checkpoint failure
    #[default]
    Throw,
    /// Leave it alone
    Ignore,
}

impl FromStr for PolicyAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "THROW" => Ok(PolicyAction::Throw),
            "IGNORE" => Ok(PolicyAction::Ignore),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyAction::Throw => write!(f, "THROW"),
            PolicyAction::Ignore => write!(f, "IGNORE"),
        }
    }
}

/// Policy loading errors
#[derive(Error, Debug, Diagnostic)]
pub enum PolicyError {
    #[error("Failed to read policy file {path}: {source}")]
    #[diagnostic(code(crac::policy::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Policy {index} is missing {field}")]
    #[diagnostic(
        code(crac::policy::missing_field),
        help("Every policy.<n> entry needs policy.<n>.id and policy.<n>.action.")
    )]
    MissingField { index: usize, field: &'static str },

    #[error("Policy {index} has invalid id {value:?}")]
    #[diagnostic(code(crac::policy::invalid_id))]
    InvalidId { index: usize, value: String },

    #[error("Policy {index} has invalid action {value:?}")]
    #[diagnostic(code(crac::policy::invalid_action), help("Expected THROW or IGNORE."))]
    InvalidAction { index: usize, value: String },

    #[error("Policy for {kind} id {id} is already defined")]
    #[diagnostic(code(crac::policy::duplicate))]
    Duplicate { kind: PolicyKind, id: RawHandle },
}

pub type PolicyResult<T> = Result<T, PolicyError>;

/// Loaded resource policies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePolicies {
    file_descriptors: HashMap<RawHandle, PolicyAction>,
}

impl ResourcePolicies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse policies from properties text
    pub fn parse(input: &str) -> PolicyResult<Self> {
        let props = Properties::parse(input);
        let mut policies = Self::new();

        let mut index = POLICY_FIRST_INDEX;
        while let Some(kind) = props.get(&format!("{}{}", POLICY_PREFIX, index)) {
            match kind.parse::<PolicyKind>() {
                Ok(kind) => policies.add(&props, index, kind)?,
                Err(()) => warn!("Skipping policy {} with unknown kind {:?}", index, kind),
            }
            index += 1;
        }

        Ok(policies)
    }

    /// Load policies from a file; a missing file means no policies
    pub fn load(path: impl AsRef<Path>) -> PolicyResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("Policy file {} does not exist", path.display());
            return Ok(Self::new());
        }

        let input = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let policies = Self::parse(&input)?;
        info!("Loaded {} resource policies from {}", policies.len(), path.display());
        Ok(policies)
    }

    fn add(&mut self, props: &Properties, index: usize, kind: PolicyKind) -> PolicyResult<()> {
        let field = |name: &'static str| {
            props
                .get(&format!("{}{}.{}", POLICY_PREFIX, index, name))
                .ok_or(PolicyError::MissingField { index, field: name })
        };

        let raw_id = field("id")?;
        let id = raw_id.trim().parse::<RawHandle>().map_err(|_| PolicyError::InvalidId {
            index,
            value: raw_id.to_string(),
        })?;

        let raw_action = field("action")?;
        let action = raw_action
            .parse::<PolicyAction>()
            .map_err(|()| PolicyError::InvalidAction {
                index,
                value: raw_action.to_string(),
            })?;

        match kind {
            PolicyKind::FileDescriptor => {
                if self.file_descriptors.insert(id, action).is_some() {
                    return Err(PolicyError::Duplicate { kind, id });
                }
            }
        }
        debug!("Resource policy {} id={} action={}", kind, id, action);
        Ok(())
    }

    /// Action for the resource `id` of `kind`, `Throw` when unset
    pub fn action(&self, kind: PolicyKind, id: RawHandle) -> PolicyAction {
        match kind {
            PolicyKind::FileDescriptor => self
                .file_descriptors
                .get(&id)
                .copied()
                .unwrap_or_default(),
        }
    }

    pub fn fd_action(&self, handle: Handle) -> PolicyAction {
        self.action(PolicyKind::FileDescriptor, handle.raw())
    }

    pub fn len(&self) -> usize {
        self.file_descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_descriptors.is_empty()
    }
}
