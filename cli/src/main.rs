use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::{Args, Parser, Subcommand};
use nonempty::NonEmpty;

use detect::*;
use error::CliError;
use provision::*;
use stager::{
    DEFAULT_BRIDGE_PATH, DEFAULT_FIRST_STAGE_PATH, DEFAULT_SECOND_STAGE_PATH,
    FastbootBridge, IdentityMarkers, InstallCommand, ProvisionConfig,
    ToolStatus, TransferPolicy, ensure_tool, tool_available,
};

mod detect;
mod error;
mod provision;

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    provision: ProvisionArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// bring the device from DFU into staged boot (default)
    Provision(ProvisionArgs),
    /// show the current device phase
    Detect {
        #[command(flatten)]
        bridge: BridgeArgs,
        #[command(flatten)]
        markers: MarkerArgs,
    },
}

#[derive(Args)]
struct BridgeArgs {
    /// device bridge tool, as a path or a program name on PATH
    #[clap(short, long, default_value = DEFAULT_BRIDGE_PATH)]
    bridge: PathBuf,
    /// do not try to install a missing device bridge
    #[clap(long)]
    no_install: bool,
    /// command installing a missing device bridge
    /// (ex: "sudo apt-get install -y fastboot")
    #[clap(long, value_parser = parse_install_command)]
    install_command: Option<InstallCommand>,
}

#[derive(Args)]
struct MarkerArgs {
    /// listing text identifying the DFU bootloader (repeatable)
    #[clap(long = "dfu-marker")]
    dfu: Vec<String>,
    /// listing text identifying the staged-boot firmware (repeatable)
    #[clap(long = "staged-marker")]
    staged_boot: Vec<String>,
}

#[derive(Args)]
struct ProvisionArgs {
    #[command(flatten)]
    bridge: BridgeArgs,
    /// first-stage payload
    #[clap(short, long, default_value = DEFAULT_FIRST_STAGE_PATH)]
    first_stage: PathBuf,
    /// second-stage payload
    #[clap(short = 'u', long, default_value = DEFAULT_SECOND_STAGE_PATH)]
    second_stage: PathBuf,
    /// re-enumeration timeout in seconds (ex: 10, 2.5)
    #[clap(short, long, default_value = "10", value_parser = parse_seconds)]
    timeout: Duration,
    /// delay between device polls in seconds
    #[clap(short, long, default_value = "0.5", value_parser = parse_seconds)]
    poll_interval: Duration,
    /// carry on when a stage or continue call fails
    #[clap(long)]
    lenient: bool,
    #[command(flatten)]
    markers: MarkerArgs,
}

impl BridgeArgs {
    fn installer(&self) -> Option<InstallCommand> {
        if self.no_install {
            None
        } else {
            Some(self.install_command.clone().unwrap_or_default())
        }
    }
}

impl MarkerArgs {
    fn into_markers(self) -> IdentityMarkers {
        let mut markers = IdentityMarkers::default();
        if let Some(dfu) = NonEmpty::from_vec(self.dfu) {
            markers.dfu = dfu;
        }
        if let Some(staged_boot) = NonEmpty::from_vec(self.staged_boot) {
            markers.staged_boot = staged_boot;
        }
        markers
    }
}

impl ProvisionArgs {
    fn into_config(self) -> ProvisionConfig {
        ProvisionConfig {
            first_stage_path: self.first_stage,
            second_stage_path: self.second_stage,
            timeout: self.timeout,
            poll_interval: self.poll_interval,
            transfer_policy: if self.lenient {
                TransferPolicy::Lenient
            } else {
                TransferPolicy::Strict
            },
            markers: self.markers.into_markers(),
        }
    }
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("{e}"))
}

fn parse_install_command(s: &str) -> Result<InstallCommand, String> {
    InstallCommand::parse(s).ok_or_else(|| "empty install command".into())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::init();

    let command = cli.command.unwrap_or(Commands::Provision(cli.provision));
    if let Err(err) = match command {
        Commands::Provision(args) => get_bridge(&args.bridge)
            .and_then(|bridge| provision(bridge, args.into_config())),
        Commands::Detect { bridge, markers } => get_bridge(&bridge)
            .and_then(|bridge| detect_phase(bridge, markers.into_markers())),
    } {
        eprintln!("Error: {err}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn get_bridge(args: &BridgeArgs) -> Result<FastbootBridge, CliError> {
    let installer = args.installer();
    if installer.is_some() && !tool_available(&args.bridge) {
        println!(
            "{} not found. Attempting to install...",
            args.bridge.display()
        );
    }
    if ensure_tool(&args.bridge, installer.as_ref())? == ToolStatus::Installed
    {
        println!("Installation successful.");
    }
    Ok(FastbootBridge::new(args.bridge.clone()))
}
