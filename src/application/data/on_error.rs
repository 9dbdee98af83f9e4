use clap::ValueEnum;

use crate::mirror::FailurePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OnError {
    /// Stop the pass at the first entry that cannot be mirrored
    #[default]
    Abort,
    /// Skip failing entries and report them when the pass ends
    Continue,
}

impl OnError {
    pub fn to_failure_policy(self) -> FailurePolicy {
        match self {
            OnError::Abort => FailurePolicy::Abort,
            OnError::Continue => FailurePolicy::Continue,
        }
    }

    /// Parses the value used in configuration files.
    pub fn from_config_value(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}
