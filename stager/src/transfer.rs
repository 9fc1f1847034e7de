use log::{info, warn};

use crate::{
    BridgeError, BridgeStatus, DeviceBridge, Payload, PayloadRole,
    ProvisionError, TransferStep,
};

/// What to do when a `stage` or `continue` call reports a failure
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransferPolicy {
    /// Abort the transfer with [ProvisionError::TransferFailed]
    #[default]
    Strict,
    /// Log the failure and carry on; the device may still reach the
    /// next phase.
    Lenient,
}

/// Stage a payload and tell the device to boot it
///
/// Once `continue` has been issued the device state change cannot be
/// undone. Callers re-detect the phase instead of assuming success.
pub struct StageTransfer<B> {
    bridge: B,
    policy: TransferPolicy,
}

impl<B: DeviceBridge> StageTransfer<B> {
    pub fn new(bridge: B, policy: TransferPolicy) -> Self {
        StageTransfer { bridge, policy }
    }

    pub fn transfer(&self, payload: &Payload) -> Result<(), ProvisionError> {
        payload.check()?;

        info!(
            "Staging {} payload {}",
            payload.role(),
            payload.path().display()
        );
        let staged = self.bridge.stage(payload.path());
        self.settle(payload.role(), TransferStep::Stage, staged)?;

        info!("Continuing boot");
        let continued = self.bridge.continue_boot();
        self.settle(payload.role(), TransferStep::Continue, continued)
    }

    fn settle(
        &self,
        role: PayloadRole,
        step: TransferStep,
        result: Result<BridgeStatus, BridgeError>,
    ) -> Result<(), ProvisionError> {
        let reason = match result {
            Ok(status) if status.success() => return Ok(()),
            Ok(status) => status.to_string(),
            Err(err) => err.to_string(),
        };
        match self.policy {
            TransferPolicy::Strict => {
                Err(ProvisionError::TransferFailed { role, step, reason })
            }
            TransferPolicy::Lenient => {
                warn!("{role} `{step}` failed ({reason}), continuing anyway");
                Ok(())
            }
        }
    }
}
