use stager::{
    DevicePhase, FastbootBridge, IdentityMarkers, PhaseDetector,
    ProvisionError,
};

use crate::CliError;

pub(crate) fn detect_phase(
    bridge: FastbootBridge,
    markers: IdentityMarkers,
) -> Result<(), CliError> {
    let snapshot = PhaseDetector::new(bridge, markers).snapshot()?;
    for device in &snapshot.devices {
        println!("{:20} {}", device.serial, device.identity);
    }
    println!("Device phase: {}", snapshot.phase);

    match snapshot.phase {
        DevicePhase::Dfu | DevicePhase::StagedBoot => Ok(()),
        phase => Err(ProvisionError::DeviceNotFound(phase).into()),
    }
}
