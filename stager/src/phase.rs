use std::sync::LazyLock;

use log::{debug, warn};
use nonempty::{NonEmpty, nonempty};
use regex::Regex;

use crate::{BridgeError, DeviceBridge};

pub const DEFAULT_DFU_MARKER: &str = "dfu-device";
pub const DEFAULT_STAGED_BOOT_MARKER: &str = "Android Fastboot";

static LISTING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+(\S.*?)\s*$").unwrap());

/// Boot phase of the attached device
///
/// Only valid at the time it was detected: the device may change phase at
/// any moment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DevicePhase {
    Absent,
    Dfu,
    StagedBoot,
    Unknown,
}

impl std::fmt::Display for DevicePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DevicePhase::Absent => write!(f, "absent"),
            DevicePhase::Dfu => write!(f, "DFU"),
            DevicePhase::StagedBoot => write!(f, "staged boot"),
            DevicePhase::Unknown => write!(f, "unknown"),
        }
    }
}

/// Substrings identifying each phase in the bridge device listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityMarkers {
    pub dfu: NonEmpty<String>,
    pub staged_boot: NonEmpty<String>,
}

impl Default for IdentityMarkers {
    fn default() -> Self {
        IdentityMarkers {
            dfu: nonempty![DEFAULT_DFU_MARKER.into()],
            staged_boot: nonempty![DEFAULT_STAGED_BOOT_MARKER.into()],
        }
    }
}

impl IdentityMarkers {
    /// Classify a raw device listing
    ///
    /// A staged-boot match takes precedence over a DFU match. Blank output
    /// means no device is attached; anything else unmatched is
    /// [DevicePhase::Unknown].
    pub fn classify(&self, listing: &str) -> DevicePhase {
        let contains_any = |markers: &NonEmpty<String>| {
            markers.iter().any(|m| listing.contains(m.as_str()))
        };

        if listing.trim().is_empty() {
            DevicePhase::Absent
        } else if contains_any(&self.staged_boot) {
            DevicePhase::StagedBoot
        } else if contains_any(&self.dfu) {
            DevicePhase::Dfu
        } else {
            DevicePhase::Unknown
        }
    }
}

/// One line of the bridge device listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListedDevice {
    pub serial: String,
    pub identity: String,
}

/// Split a device listing into `serial` / `identity` entries
///
/// Lines without an identity column are skipped.
pub fn parse_listing(listing: &str) -> Vec<ListedDevice> {
    listing
        .lines()
        .filter_map(|line| {
            let captures = LISTING_LINE.captures(line)?;
            Some(ListedDevice {
                serial: captures[1].into(),
                identity: captures[2].into(),
            })
        })
        .collect()
}

/// Phase and listing entries from a single bridge call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub phase: DevicePhase,
    pub devices: Vec<ListedDevice>,
}

pub struct PhaseDetector<B> {
    bridge: B,
    markers: IdentityMarkers,
}

impl<B: DeviceBridge> PhaseDetector<B> {
    pub fn new(bridge: B, markers: IdentityMarkers) -> Self {
        PhaseDetector { bridge, markers }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn markers(&self) -> &IdentityMarkers {
        &self.markers
    }

    /// Query the bridge once and classify the current phase
    ///
    /// Never retries. A bridge that cannot be run yields
    /// [DevicePhase::Unknown].
    pub fn detect(&self) -> DevicePhase {
        match self.bridge.list_devices() {
            Ok(listing) => self.classify(&listing),
            Err(err) => {
                warn!("Device listing failed: {err}");
                DevicePhase::Unknown
            }
        }
    }

    /// Like [PhaseDetector::detect], keeping the parsed listing
    pub fn snapshot(&self) -> Result<Snapshot, BridgeError> {
        let listing = self.bridge.list_devices()?;
        Ok(Snapshot {
            phase: self.classify(&listing),
            devices: parse_listing(&listing),
        })
    }

    fn classify(&self, listing: &str) -> DevicePhase {
        let phase = self.markers.classify(listing);
        debug!("Detected device phase: {phase}");
        phase
    }
}
