use std::time::Instant;

use log::{info, warn};

use crate::{
    Clock, DeviceBridge, DevicePhase, Payload, PayloadRole, PhaseDetector,
    ProvisionConfig, ProvisionError, ReenumerationWaiter, StageTransfer,
    WaitResult,
};

/// Provisioning state machine states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Init,
    DfuDetected,
    FirstStageTransferred,
    WaitingForStagedBoot,
    StagedBootReached,
    SecondStageTransferred,
    Done,
    Failed,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            State::Init => "init",
            State::DfuDetected => "DFU detected",
            State::FirstStageTransferred => "first stage transferred",
            State::WaitingForStagedBoot => "waiting for staged boot",
            State::StagedBootReached => "staged boot reached",
            State::SecondStageTransferred => "second stage transferred",
            State::Done => "done",
            State::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Device was already in staged-boot mode, first stage skipped
    ///
    /// The second-stage payload is still staged and booted.
    AlreadyStaged,
    /// Device was taken from DFU through both stages
    Provisioned,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::AlreadyStaged => {
                write!(f, "device was already in staged-boot mode")
            }
            Outcome::Provisioned => write!(f, "device provisioned from DFU"),
        }
    }
}

/// Record of a single provisioning run, dropped with the controller
#[derive(Clone, Debug)]
pub struct Attempt {
    state: State,
    initial_phase: Option<DevicePhase>,
    deadline: Option<Instant>,
    polls: u32,
    transfers: Vec<PayloadRole>,
    outcome: Option<Outcome>,
}

impl Attempt {
    fn new() -> Self {
        Attempt {
            state: State::Init,
            initial_phase: None,
            deadline: None,
            polls: 0,
            transfers: Vec::new(),
            outcome: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Phase seen by the first detection
    pub fn initial_phase(&self) -> Option<DevicePhase> {
        self.initial_phase
    }

    /// End of the re-enumeration window, once waiting has started
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Polls made while waiting for re-enumeration
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Payloads handed to the bridge, in order
    pub fn transfers(&self) -> &[PayloadRole] {
        &self.transfers
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }
}

type TransitionHook = Box<dyn FnMut(State, &Attempt)>;

/// Drives a device from DFU to staged boot
///
/// The only suspension point is the re-enumeration wait between the two
/// transfers. Nothing is retried beyond that single bounded window.
pub struct Controller<B, C> {
    detector: PhaseDetector<B>,
    clock: C,
    config: ProvisionConfig,
    attempt: Attempt,
    on_transition: Option<TransitionHook>,
}

impl<B: DeviceBridge, C: Clock> Controller<B, C> {
    pub fn new(
        bridge: B,
        clock: C,
        config: ProvisionConfig,
    ) -> Result<Self, ProvisionError> {
        config.validate()?;
        Ok(Controller {
            detector: PhaseDetector::new(bridge, config.markers.clone()),
            clock,
            config,
            attempt: Attempt::new(),
            on_transition: None,
        })
    }

    /// Call `hook` after every state change
    pub fn on_transition(
        mut self,
        hook: impl FnMut(State, &Attempt) + 'static,
    ) -> Self {
        self.on_transition = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    /// Run the full provisioning sequence
    pub fn run(&mut self) -> Result<Outcome, ProvisionError> {
        let result = self.provision();
        match &result {
            Ok(outcome) => {
                self.attempt.outcome = Some(*outcome);
                self.enter(State::Done);
            }
            Err(err) => {
                warn!(
                    "Provisioning failed in state {}: {err}",
                    self.attempt.state
                );
                self.enter(State::Failed);
            }
        }
        result
    }

    fn provision(&mut self) -> Result<Outcome, ProvisionError> {
        let phase = self.detector.detect();
        self.attempt.initial_phase = Some(phase);

        let outcome = match phase {
            DevicePhase::StagedBoot => {
                self.enter(State::StagedBootReached);
                Outcome::AlreadyStaged
            }
            DevicePhase::Dfu => {
                self.enter(State::DfuDetected);
                let first_stage = self.config.first_stage();
                self.transfer(&first_stage)?;
                self.enter(State::FirstStageTransferred);
                self.await_staged_boot()?;
                Outcome::Provisioned
            }
            DevicePhase::Absent | DevicePhase::Unknown => {
                return Err(ProvisionError::DeviceNotFound(phase));
            }
        };

        let second_stage = self.config.second_stage();
        self.transfer(&second_stage)?;
        self.enter(State::SecondStageTransferred);
        Ok(outcome)
    }

    fn await_staged_boot(&mut self) -> Result<(), ProvisionError> {
        self.attempt.deadline = Some(self.clock.now() + self.config.timeout);
        self.enter(State::WaitingForStagedBoot);

        let result = ReenumerationWaiter::new(&self.detector, &self.clock)
            .wait_for(
                DevicePhase::StagedBoot,
                self.config.timeout,
                self.config.poll_interval,
            );
        self.attempt.polls = result.polls();

        match result {
            WaitResult::Reached { .. } => {
                self.enter(State::StagedBootReached);
                Ok(())
            }
            WaitResult::TimedOut { polls, elapsed } => {
                Err(ProvisionError::ReenumerationTimeout { elapsed, polls })
            }
        }
    }

    fn transfer(&mut self, payload: &Payload) -> Result<(), ProvisionError> {
        let result = StageTransfer::new(
            self.detector.bridge(),
            self.config.transfer_policy,
        )
        .transfer(payload);
        // an unavailable payload never reaches the bridge
        if !matches!(result, Err(ProvisionError::PayloadUnavailable { .. })) {
            self.attempt.transfers.push(payload.role());
        }
        result
    }

    fn enter(&mut self, state: State) {
        info!("{} -> {}", self.attempt.state, state);
        self.attempt.state = state;
        if let Some(hook) = self.on_transition.as_mut() {
            hook(state, &self.attempt);
        }
    }
}
