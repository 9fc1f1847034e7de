use std::fmt::Display;

use stager::{BridgeError, ProvisionError};

pub enum CliError {
    Provision(ProvisionError),
    Bridge(BridgeError),
}

impl From<ProvisionError> for CliError {
    fn from(value: ProvisionError) -> Self {
        CliError::Provision(value)
    }
}

impl From<BridgeError> for CliError {
    fn from(value: BridgeError) -> Self {
        CliError::Bridge(value)
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Provision(err) => write!(f, "{err}"),
            CliError::Bridge(err) => write!(f, "Bridge error: {err}"),
        }
    }
}
