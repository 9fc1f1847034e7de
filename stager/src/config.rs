use std::{path::PathBuf, time::Duration};

use crate::{
    DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, IdentityMarkers, Payload,
    PayloadRole, ProvisionError, TransferPolicy,
};

pub const DEFAULT_FIRST_STAGE_PATH: &str = "/usr/share/rv2rk/FSBL.bin";
pub const DEFAULT_SECOND_STAGE_PATH: &str = "/usr/share/rv2rk/u-boot.itb";

/// Settings of a provisioning run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvisionConfig {
    pub first_stage_path: PathBuf,
    pub second_stage_path: PathBuf,
    /// How long to wait for the device to re-enumerate in staged-boot mode
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub transfer_policy: TransferPolicy,
    pub markers: IdentityMarkers,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        ProvisionConfig {
            first_stage_path: DEFAULT_FIRST_STAGE_PATH.into(),
            second_stage_path: DEFAULT_SECOND_STAGE_PATH.into(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            transfer_policy: TransferPolicy::default(),
            markers: IdentityMarkers::default(),
        }
    }
}

impl ProvisionConfig {
    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.poll_interval.is_zero() {
            return Err(ProvisionError::InvalidConfig(
                "poll interval must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn first_stage(&self) -> Payload {
        Payload::new(PayloadRole::FirstStage, &self.first_stage_path)
    }

    pub fn second_stage(&self) -> Payload {
        Payload::new(PayloadRole::SecondStage, &self.second_stage_path)
    }

    /// Upper bound of device polls while waiting for re-enumeration
    pub fn max_polls(&self) -> u32 {
        if self.poll_interval.is_zero() {
            return u32::MAX;
        }
        let polls = self
            .timeout
            .as_nanos()
            .div_ceil(self.poll_interval.as_nanos());
        u32::try_from(polls).unwrap_or(u32::MAX)
    }
}
