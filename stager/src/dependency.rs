use std::{
    path::{Path, PathBuf},
    process::Command,
};

use log::{debug, info, warn};

use crate::ProvisionError;

/// Command run once when the device bridge tool is missing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallCommand {
    program: String,
    args: Vec<String>,
}

impl InstallCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InstallCommand {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a command line with shell quoting rules
    ///
    /// Returns `None` for an empty line or unbalanced quotes.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = shlex::split(line)?.into_iter();
        let program = words.next()?;
        Some(InstallCommand::new(program, words))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Default for InstallCommand {
    fn default() -> Self {
        InstallCommand::new(
            "sudo",
            ["pacman", "-Sy", "--noconfirm", "android-tools"],
        )
    }
}

impl std::fmt::Display for InstallCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let words = std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str));
        match shlex::try_join(words) {
            Ok(line) => write!(f, "{line}"),
            // nul bytes cannot be quoted
            Err(_) => write!(f, "{} {}", self.program, self.args.join(" ")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolStatus {
    Present,
    Installed,
}

/// Resolve `tool` as an executable path or a program name on `PATH`
fn resolve(tool: &Path) -> Option<PathBuf> {
    let resolved = which::which(tool).ok()?;
    debug!("{} resolved to {}", tool.display(), resolved.display());
    Some(resolved)
}

/// Make sure the bridge tool can be run, trying `installer` at most once
pub fn ensure_tool(
    tool: &Path,
    installer: Option<&InstallCommand>,
) -> Result<ToolStatus, ProvisionError> {
    if resolve(tool).is_some() {
        return Ok(ToolStatus::Present);
    }
    let missing = || ProvisionError::DependencyMissing(tool.to_path_buf());
    let installer = installer.ok_or_else(missing)?;

    warn!("{} not found, running `{installer}`", tool.display());
    match Command::new(&installer.program).args(&installer.args).status() {
        Ok(status) if status.success() => info!("`{installer}` succeeded"),
        Ok(status) => warn!("`{installer}` failed: {status}"),
        Err(err) => warn!("`{installer}` could not be started: {err}"),
    }

    match resolve(tool) {
        Some(_) => Ok(ToolStatus::Installed),
        None => Err(missing()),
    }
}

/// Whether `tool` can currently be run without installing anything
pub fn tool_available(tool: &Path) -> bool {
    resolve(tool).is_some()
}
