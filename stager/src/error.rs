use std::{io, path::PathBuf, time::Duration};

use crate::{DevicePhase, PayloadRole};

/// Bridge call that failed during a stage transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferStep {
    Stage,
    Continue,
}

impl std::fmt::Display for TransferStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferStep::Stage => write!(f, "stage"),
            TransferStep::Continue => write!(f, "continue"),
        }
    }
}

#[derive(Debug)]
pub enum BridgeError {
    Io(io::Error),
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BridgeError::Io(err) => Some(err),
        }
    }
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::Io(err) => {
                write!(f, "could not run device bridge: {}", err)
            }
        }
    }
}

impl From<io::Error> for BridgeError {
    fn from(err: io::Error) -> Self {
        BridgeError::Io(err)
    }
}

#[derive(Debug)]
pub enum ProvisionError {
    DependencyMissing(PathBuf),
    DeviceNotFound(DevicePhase),
    PayloadUnavailable {
        role: PayloadRole,
        path: PathBuf,
        source: io::Error,
    },
    TransferFailed {
        role: PayloadRole,
        step: TransferStep,
        reason: String,
    },
    ReenumerationTimeout {
        elapsed: Duration,
        polls: u32,
    },
    InvalidConfig(String),
}

impl std::error::Error for ProvisionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProvisionError::PayloadUnavailable { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisionError::DependencyMissing(path) => write!(
                f,
                "Device bridge {} not found, please install it manually",
                path.display()
            ),
            ProvisionError::DeviceNotFound(DevicePhase::Absent) => {
                write!(f, "No device detected")
            }
            ProvisionError::DeviceNotFound(phase) => {
                write!(f, "No compatible device detected (phase: {phase})")
            }
            ProvisionError::PayloadUnavailable { role, path, source } => {
                write!(
                    f,
                    "Cannot read {} payload {}: {}",
                    role,
                    path.display(),
                    source
                )
            }
            ProvisionError::TransferFailed { role, step, reason } => {
                write!(f, "{role} transfer failed at `{step}`: {reason}")
            }
            ProvisionError::ReenumerationTimeout { elapsed, polls } => {
                write!(
                    f,
                    "Timeout: device did not re-enumerate in staged-boot mode \
                     within {:.1}s ({} polls)",
                    elapsed.as_secs_f64(),
                    polls
                )
            }
            ProvisionError::InvalidConfig(msg) => {
                write!(f, "Invalid configuration: {msg}")
            }
        }
    }
}
