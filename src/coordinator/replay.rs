/*!
 * Post-Restore Replay
 * Replacement arguments and properties handed over after a restore
 */

use crate::core::errors::Failure;
use serde::{Deserialize, Serialize};

/// Arguments and properties the restored instance should adopt
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RestoreReplay {
    /// New program arguments, program name first
    pub arguments: Vec<String>,
    /// New properties in the order the host reported them
    pub properties: Vec<(String, String)>,
}

impl RestoreReplay {
    /// Build from the host's raw values, `None` if both are empty
    pub fn from_raw(arguments: Option<&str>, properties: Option<&[String]>) -> Option<Self> {
        let replay = Self {
            arguments: arguments.map(split_arguments).unwrap_or_default(),
            properties: properties
                .map(|props| props.iter().map(|p| split_property(p)).collect())
                .unwrap_or_default(),
        };
        if replay.is_empty() {
            None
        } else {
            Some(replay)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty() && self.properties.is_empty()
    }

    /// Program to re-enter, if new arguments were given
    pub fn program(&self) -> Option<&str> {
        self.arguments.first().map(String::as_str)
    }

    /// Arguments after the program name
    pub fn program_arguments(&self) -> &[String] {
        self.arguments.get(1..).unwrap_or(&[])
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Space separated; empty pieces are dropped
fn split_arguments(raw: &str) -> Vec<String> {
    raw.split(' ')
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split once on `=`; a missing value is empty
fn split_property(raw: &str) -> (String, String) {
    match raw.split_once('=') {
        Some((key, value)) => (key.to_string(), value.to_string()),
        None => (raw.to_string(), String::new()),
    }
}

/// Collaborator that applies a [`RestoreReplay`]
///
/// Called strictly after the after-restore pass. A returned failure becomes
/// a restore cause.
pub trait ReplayHandler: Send + Sync {
    fn replay(&self, replay: &RestoreReplay) -> Result<(), Failure>;
}

impl<F> ReplayHandler for F
where
    F: Fn(&RestoreReplay) -> Result<(), Failure> + Send + Sync,
{
    fn replay(&self, replay: &RestoreReplay) -> Result<(), Failure> {
        self(replay)
    }
}
