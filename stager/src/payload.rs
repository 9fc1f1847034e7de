use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use crate::ProvisionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadRole {
    FirstStage,
    SecondStage,
}

impl std::fmt::Display for PayloadRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadRole::FirstStage => write!(f, "first-stage"),
            PayloadRole::SecondStage => write!(f, "second-stage"),
        }
    }
}

/// Binary blob to be staged into device memory
///
/// The content is opaque: only its presence is verified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    path: PathBuf,
    role: PayloadRole,
}

impl Payload {
    pub fn new(role: PayloadRole, path: impl Into<PathBuf>) -> Self {
        Payload {
            path: path.into(),
            role,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn role(&self) -> PayloadRole {
        self.role
    }

    /// Verify the payload is a regular file that can be opened for reading
    pub fn check(&self) -> Result<(), ProvisionError> {
        File::open(&self.path)
            .and_then(|file| {
                if file.metadata()?.is_dir() {
                    Err(io::Error::from(io::ErrorKind::IsADirectory))
                } else {
                    Ok(())
                }
            })
            .map_err(|source| ProvisionError::PayloadUnavailable {
                role: self.role,
                path: self.path.clone(),
                source,
            })
    }
}
