/*!
 * Coordinator Configuration
 *
 * Runtime configuration for a checkpoint/restore coordinator
 */

use crate::core::limits::{ENV_RESOURCE_POLICIES, ENV_RESTORE_ORDER, ENV_TRACE_STARTUP_TIME};
use crate::core::types::RestoreOrder;
use crate::policy::{PolicyError, ResourcePolicies};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}, expected {expected}")]
    #[diagnostic(code(crac::config::invalid_value))]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Policy(#[from] PolicyError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Restore order of ordered and priority contexts
    pub restore_order: RestoreOrder,
    /// Emit `STARTUPTIME` trace lines around restore
    pub trace_startup_time: bool,
    /// Resource-policy file, if any
    pub policy_file: Option<PathBuf>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinatorConfig {
    pub const fn new() -> Self {
        Self {
            restore_order: RestoreOrder::Reverse,
            trace_startup_time: false,
            policy_file: None,
        }
    }

    /// Configuration for measuring restore latency
    pub const fn startup_traced() -> Self {
        Self {
            restore_order: RestoreOrder::Reverse,
            trace_startup_time: true,
            policy_file: None,
        }
    }

    /// Read configuration from the environment, defaulting unset variables
    ///
    /// - CRAC_RESTORE_ORDER: `reverse` or `forward`
    /// - CRAC_TRACE_STARTUP_TIME: boolean
    /// - CRAC_RESOURCE_POLICIES: path of the policy file
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::new();

        if let Some(value) = env_var(ENV_RESTORE_ORDER) {
            config.restore_order = value.parse::<RestoreOrder>().map_err(|_| ConfigError::InvalidValue {
                var: ENV_RESTORE_ORDER,
                value: value.clone(),
                expected: "reverse or forward",
            })?;
        }

        if let Some(value) = env_var(ENV_TRACE_STARTUP_TIME) {
            config.trace_startup_time = parse_bool(&value).ok_or(ConfigError::InvalidValue {
                var: ENV_TRACE_STARTUP_TIME,
                value,
                expected: "a boolean",
            })?;
        }

        config.policy_file = env_var(ENV_RESOURCE_POLICIES).map(PathBuf::from);
        Ok(config)
    }

    #[must_use]
    pub fn with_restore_order(mut self, order: RestoreOrder) -> Self {
        self.restore_order = order;
        self
    }

    #[must_use]
    pub fn with_trace_startup_time(mut self, enabled: bool) -> Self {
        self.trace_startup_time = enabled;
        self
    }

    #[must_use]
    pub fn with_policy_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.policy_file = Some(path.into());
        self
    }

    /// Load the configured policy file, or no policies if none is set
    pub fn load_policies(&self) -> ConfigResult<ResourcePolicies> {
        match &self.policy_file {
            Some(path) => Ok(ResourcePolicies::load(path)?),
            None => Ok(ResourcePolicies::new()),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
