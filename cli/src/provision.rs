use std::{path::PathBuf, time::Duration};

use stager::{
    Attempt, Controller, DevicePhase, FastbootBridge, ProvisionConfig, State,
    SystemClock,
};

use crate::CliError;

/// Operator-facing progress lines
struct Progress {
    first_stage: PathBuf,
    second_stage: PathBuf,
    timeout: Duration,
}

impl Progress {
    fn report(&self, state: State, attempt: &Attempt) {
        match state {
            State::DfuDetected => {
                println!("Device detected in DFU mode.");
                println!("Staging first stage: {}", self.first_stage.display());
            }
            State::FirstStageTransferred => println!("Boot continued."),
            State::WaitingForStagedBoot => println!(
                "Waiting for device to re-enumerate ({:.1}s timeout)...",
                self.timeout.as_secs_f64()
            ),
            State::StagedBootReached => {
                if attempt.initial_phase() == Some(DevicePhase::StagedBoot) {
                    println!("Device already detected in staged-boot mode.");
                } else {
                    println!(
                        "Device detected in staged-boot mode after {} polls.",
                        attempt.polls()
                    );
                }
                println!(
                    "Staging second stage: {}",
                    self.second_stage.display()
                );
            }
            State::SecondStageTransferred => println!("Boot continued."),
            State::Done => println!("Process completed successfully."),
            State::Init | State::Failed => {}
        }
    }
}

pub(crate) fn provision(
    bridge: FastbootBridge,
    config: ProvisionConfig,
) -> Result<(), CliError> {
    let progress = Progress {
        first_stage: config.first_stage_path.clone(),
        second_stage: config.second_stage_path.clone(),
        timeout: config.timeout,
    };

    println!("Checking device status...");
    let mut controller = Controller::new(bridge, SystemClock, config)?
        .on_transition(move |state, attempt| progress.report(state, attempt));
    controller.run()?;
    Ok(())
}
