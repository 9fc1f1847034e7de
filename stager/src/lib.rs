//! Staged bootloader provisioning based on an external device bridge
//!
//! Brings a device from its minimal first-stage USB bootloader (DFU) into a
//! staged second-stage boot firmware. The device is never driven directly:
//! every access goes through a [DeviceBridge], by default the `fastboot`
//! command line tool ([FastbootBridge]).
//!
//! The sequence is:
//! 1. detect the current [DevicePhase] from the bridge device listing,
//! 2. in DFU mode, stage the first-stage payload and continue booting,
//! 3. wait (bounded) for the device to re-enumerate in staged-boot mode,
//! 4. stage the second-stage payload and continue booting.
//!
//! A device already running the staged-boot firmware skips steps 2 and 3.
//!
//! # Example
//!
//! ```no_run
//! use stager::{Controller, FastbootBridge, ProvisionConfig, SystemClock};
//!
//! let bridge = FastbootBridge::default();
//! let config = ProvisionConfig::default();
//! let result = Controller::new(bridge, SystemClock, config)
//!     .and_then(|mut controller| controller.run());
//! match result {
//!     Ok(outcome) => println!("Done: {outcome}"),
//!     Err(e) => println!("Error: {e}"),
//! }
//! ```

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

mod bridge;
mod config;
mod controller;
mod dependency;
mod error;
mod payload;
mod phase;
mod transfer;
mod waiter;

#[cfg(test)]
mod testing;

use std::time::Duration;

// Re-exports
pub use bridge::{
    BridgeStatus, DEFAULT_BRIDGE_PATH, DeviceBridge, FastbootBridge,
};
pub use config::{
    DEFAULT_FIRST_STAGE_PATH, DEFAULT_SECOND_STAGE_PATH, ProvisionConfig,
};
pub use controller::{Attempt, Controller, Outcome, State};
pub use dependency::{
    InstallCommand, ToolStatus, ensure_tool, tool_available,
};
pub use error::{BridgeError, ProvisionError, TransferStep};
pub use payload::{Payload, PayloadRole};
pub use phase::{
    DEFAULT_DFU_MARKER, DEFAULT_STAGED_BOOT_MARKER, DevicePhase,
    IdentityMarkers, ListedDevice, PhaseDetector, Snapshot, parse_listing,
};
pub use transfer::{StageTransfer, TransferPolicy};
pub use waiter::{Clock, ReenumerationWaiter, SystemClock, WaitResult};
