use std::{
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
};

use log::debug;

use crate::error::BridgeError;

pub const DEFAULT_BRIDGE_PATH: &str = "/usr/bin/fastboot";

/// Exit status of a side-effecting bridge call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeStatus {
    code: Option<i32>,
}

impl BridgeStatus {
    pub fn from_code(code: i32) -> Self {
        BridgeStatus { code: Some(code) }
    }

    /// Status of a process that was terminated without an exit code
    pub fn terminated() -> Self {
        BridgeStatus { code: None }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }
}

impl From<ExitStatus> for BridgeStatus {
    fn from(status: ExitStatus) -> Self {
        BridgeStatus {
            code: status.code(),
        }
    }
}

impl std::fmt::Display for BridgeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Capabilities of the external tool driving the device
///
/// Every call is synchronous. Implementations must not retry: retry and
/// failure policy belongs to the caller.
pub trait DeviceBridge {
    /// Raw textual device listing
    fn list_devices(&self) -> Result<String, BridgeError>;

    /// Stage a binary blob into device memory
    fn stage(&self, path: &Path) -> Result<BridgeStatus, BridgeError>;

    /// Instruct the device to boot the staged blob
    fn continue_boot(&self) -> Result<BridgeStatus, BridgeError>;
}

impl<B: DeviceBridge + ?Sized> DeviceBridge for &B {
    fn list_devices(&self) -> Result<String, BridgeError> {
        (**self).list_devices()
    }

    fn stage(&self, path: &Path) -> Result<BridgeStatus, BridgeError> {
        (**self).stage(path)
    }

    fn continue_boot(&self) -> Result<BridgeStatus, BridgeError> {
        (**self).continue_boot()
    }
}

/// [DeviceBridge] backed by the `fastboot` command line tool
///
/// Each call spawns one `fastboot` process and waits for it to exit.
#[derive(Clone, Debug)]
pub struct FastbootBridge {
    program: PathBuf,
}

impl FastbootBridge {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        FastbootBridge {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, subcommand: &str) -> Command {
        debug!("Running `{} {}`", self.program.display(), subcommand);
        let mut cmd = Command::new(&self.program);
        cmd.arg(subcommand);
        cmd
    }
}

impl Default for FastbootBridge {
    fn default() -> Self {
        FastbootBridge::new(DEFAULT_BRIDGE_PATH)
    }
}

impl DeviceBridge for FastbootBridge {
    fn list_devices(&self) -> Result<String, BridgeError> {
        let output = self
            .command("devices")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()?;
        let listing = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("Device listing: {:?}", listing);
        Ok(listing)
    }

    fn stage(&self, path: &Path) -> Result<BridgeStatus, BridgeError> {
        let status = self.command("stage").arg(path).status()?;
        debug!("`stage` finished with {}", BridgeStatus::from(status));
        Ok(status.into())
    }

    fn continue_boot(&self) -> Result<BridgeStatus, BridgeError> {
        let status = self.command("continue").status()?;
        debug!("`continue` finished with {}", BridgeStatus::from(status));
        Ok(status.into())
    }
}
