use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use tempfile::TempDir;

use crate::{
    BridgeError, BridgeStatus, Clock, DeviceBridge, DevicePhase, Payload,
    PayloadRole,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    List,
    Stage(PathBuf),
    Continue,
}

/// Bridge replaying one listing per `devices` call
///
/// The last listing repeats once the script is exhausted.
pub(crate) struct FakeBridge {
    listings: RefCell<VecDeque<String>>,
    last: RefCell<String>,
    calls: RefCell<Vec<Call>>,
    stage_code: Cell<i32>,
    continue_code: Cell<i32>,
}

impl FakeBridge {
    pub(crate) fn with_phases(phases: &[DevicePhase]) -> Self {
        FakeBridge {
            listings: RefCell::new(phases.iter().map(listing_for).collect()),
            last: RefCell::new(String::new()),
            calls: RefCell::new(Vec::new()),
            stage_code: Cell::new(0),
            continue_code: Cell::new(0),
        }
    }

    pub(crate) fn stage_exit_code(self, code: i32) -> Self {
        self.stage_code.set(code);
        self
    }

    pub(crate) fn continue_exit_code(self, code: i32) -> Self {
        self.continue_code.set(code);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Calls other than `devices`
    pub(crate) fn transfer_calls(&self) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| **call != Call::List)
            .cloned()
            .collect()
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| **call == Call::List)
            .count()
    }
}

fn listing_for(phase: &DevicePhase) -> String {
    match phase {
        DevicePhase::Absent => "".into(),
        DevicePhase::Dfu => "0123456789\tdfu-device\n".into(),
        DevicePhase::StagedBoot => "0123456789\tAndroid Fastboot\n".into(),
        DevicePhase::Unknown => "R58M1234\tfastboot\n".into(),
    }
}

impl DeviceBridge for FakeBridge {
    fn list_devices(&self) -> Result<String, BridgeError> {
        self.calls.borrow_mut().push(Call::List);
        if let Some(listing) = self.listings.borrow_mut().pop_front() {
            *self.last.borrow_mut() = listing;
        }
        Ok(self.last.borrow().clone())
    }

    fn stage(&self, path: &Path) -> Result<BridgeStatus, BridgeError> {
        self.calls.borrow_mut().push(Call::Stage(path.to_path_buf()));
        Ok(BridgeStatus::from_code(self.stage_code.get()))
    }

    fn continue_boot(&self) -> Result<BridgeStatus, BridgeError> {
        self.calls.borrow_mut().push(Call::Continue);
        Ok(BridgeStatus::from_code(self.continue_code.get()))
    }
}

/// Clock that only advances when sleeping
pub(crate) struct FakeClock {
    base: Instant,
    offset: Cell<Duration>,
    sleeps: Cell<u32>,
}

impl FakeClock {
    pub(crate) fn new() -> Self {
        FakeClock {
            base: Instant::now(),
            offset: Cell::new(Duration::ZERO),
            sleeps: Cell::new(0),
        }
    }

    pub(crate) fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }

    fn sleep(&self, duration: Duration) {
        self.offset.set(self.offset.get() + duration);
        self.sleeps.set(self.sleeps.get() + 1);
    }
}

/// Temporary first- and second-stage payload files
pub(crate) struct PayloadFiles {
    dir: TempDir,
}

impl PayloadFiles {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("FSBL.bin"), [0xAAu8; 64]).unwrap();
        fs::write(dir.path().join("u-boot.itb"), [0x55u8; 64]).unwrap();
        PayloadFiles { dir }
    }

    pub(crate) fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn first_stage_path(&self) -> PathBuf {
        self.dir.path().join("FSBL.bin")
    }

    pub(crate) fn second_stage_path(&self) -> PathBuf {
        self.dir.path().join("u-boot.itb")
    }

    pub(crate) fn first_stage(&self) -> Payload {
        Payload::new(PayloadRole::FirstStage, self.first_stage_path())
    }

    pub(crate) fn second_stage(&self) -> Payload {
        Payload::new(PayloadRole::SecondStage, self.second_stage_path())
    }
}
