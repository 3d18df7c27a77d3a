//! eadb - enhanced adb for setups with several attached devices
//!
//! Usage:
//!     eadb [OPTIONS] <COMMAND> [ARGS...]
//!
//! Environment Variables:
//!     EADB_ADB_PATH: adb executable (default: adb)
//!     EADB_SCRCPY_DIR: directory containing scrcpy, for `eadb mirror`
//!     EADB_CONFIG: config file (default: eadb_config.txt next to the executable)
//!     EADB_QUERY_TIMEOUT: seconds to wait for device and package listings (default: 30)
//!     RUST_LOG: log filter (default: warn)

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use device_hub::{
    list_all_devices, Action, Dispatcher, HubConfig, HubError, PackageOp, ProcessBridge,
    StdTerminal, MAX_RECORD_SECONDS,
};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Enhanced adb - run adb commands across one, several or all attached devices
#[derive(Parser, Debug)]
#[command(name = "eadb")]
#[command(disable_help_subcommand = true)]
#[command(about = "Enhanced adb - run adb commands across one, several or all attached devices")]
#[command(after_help = r#"Keywords:
    *keyword*      matches every package whose name contains keyword
    package.name   matches exactly that package (case-insensitive)

Examples:
    # Open system settings (prompts when several devices are attached)
    eadb setting

    # Uninstall every package containing "demo" on one device
    eadb uninstall *demo*

    # Force-stop a package on all devices
    eadb force-stop com.example.app

    # Screenshot to ./home_<serial>.png
    eadb screenshot ./home

    # Record 30 seconds of screen to ./clip_<serial>.mp4
    eadb screenrecord ./clip -duration 30

    # Anything else is passed to adb for the chosen device(s)
    eadb shell getprop ro.build.version.release
"#)]
struct Cli {
    /// adb executable to use
    #[arg(long, env = "EADB_ADB_PATH", value_name = "PATH")]
    adb: Option<String>,

    /// Config file with KEY=VALUE settings (ADB_PATH, SCRCPY_DIR)
    #[arg(long, env = "EADB_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// List attached devices in every state and exit
    #[arg(long)]
    list_devices: bool,

    /// Print --list-devices output as JSON
    #[arg(long, requires = "list_devices")]
    json: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Open the system settings app
    Setting,

    /// Go to the launcher
    Launcher,

    /// List all installed packages
    Packages,

    /// Show package details for a package name or *keyword*
    AppInfo { keyword: String },

    /// Save a screenshot to <PATH>_<serial>.png
    Screenshot { path: PathBuf },

    /// Record the screen to <PATH>_<serial>.mp4
    Screenrecord {
        path: PathBuf,

        /// Recording length in seconds (1-180)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_RECORD_SECONDS as i64))]
        duration: Option<u32>,
    },

    /// Uninstall packages matching a package name or *keyword*
    Uninstall { keyword: String },

    /// Clear app data for packages matching a package name or *keyword*
    ClearData { keyword: String },

    /// Force-stop packages matching a package name or *keyword*
    ForceStop { keyword: String },

    /// Launch the app matching a package name or *keyword*
    Start { keyword: String },

    /// Mirror the device screen with scrcpy (requires SCRCPY_DIR)
    Mirror,

    /// Any other adb command, run on the chosen device(s)
    #[command(external_subcommand)]
    Raw(Vec<String>),
}

impl Command {
    fn into_action(self) -> device_hub::Result<Action> {
        Ok(match self {
            Self::Setting => Action::OpenSettings,
            Self::Launcher => Action::OpenLauncher,
            Self::Packages => Action::ListPackages,
            Self::AppInfo { keyword } => Action::package(PackageOp::AppInfo, &keyword)?,
            Self::Screenshot { path } => Action::Screenshot { base_path: path },
            Self::Screenrecord { path, duration } => Action::ScreenRecord {
                base_path: path,
                duration,
            },
            Self::Uninstall { keyword } => Action::package(PackageOp::Uninstall, &keyword)?,
            Self::ClearData { keyword } => Action::package(PackageOp::ClearData, &keyword)?,
            Self::ForceStop { keyword } => Action::package(PackageOp::ForceStop, &keyword)?,
            Self::Start { keyword } => Action::package(PackageOp::Start, &keyword)?,
            Self::Mirror => Action::Mirror,
            Self::Raw(tokens) => Action::Raw(tokens),
        })
    }
}

/// Accept the single-dash `-duration` spelling after `screenrecord`
fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut in_screenrecord = false;
    args.into_iter()
        .map(|arg| {
            let arg = arg.into();
            if arg == "screenrecord" {
                in_screenrecord = true;
                arg
            } else if in_screenrecord && arg == "-duration" {
                OsString::from("--duration")
            } else {
                arg
            }
        })
        .collect()
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Check that the bridge executable can be found
fn check_bridge(bridge_path: &str) -> std::result::Result<(), HubError> {
    match which::which(bridge_path) {
        Ok(path) => {
            debug!("Using bridge at {}", path.display());
            Ok(())
        }
        Err(e) => Err(HubError::BridgeUnavailable(format!(
            "{} is not installed or not in PATH ({})",
            bridge_path, e
        ))),
    }
}

fn print_bridge_hint() {
    eprintln!("Solution: Install adb, or point --adb / EADB_ADB_PATH at it:");
    eprintln!("  - macOS: brew install android-platform-tools");
    eprintln!("  - Linux: sudo apt install android-tools-adb");
    eprintln!(
        "  - Windows: Download from https://developer.android.com/studio/releases/platform-tools"
    );
}

/// Handle --list-devices
async fn print_devices(bridge: &ProcessBridge, json: bool) -> Result<()> {
    let devices = list_all_devices(bridge).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No devices connected.");
        return Ok(());
    }

    println!("Attached devices:");
    println!("{}", "-".repeat(60));
    for device in devices {
        let status_icon = if device.is_ready() {
            "\u{2713}"
        } else {
            "\u{2717}"
        };
        println!(
            "  {} {:<30} [{}]",
            status_icon,
            device.id,
            device.state.as_str()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse_from(normalize_args(std::env::args_os()));

    init_logging(args.verbose);

    let mut config = HubConfig::load(args.config.clone())?;
    if let Some(adb) = &args.adb {
        config = config.with_bridge_path(adb);
    }
    debug!("{:?}", config);

    if !args.list_devices && args.command.is_none() {
        Cli::command().print_help()?;
        return Ok(());
    }

    if let Err(e) = check_bridge(&config.bridge_path) {
        eprintln!("Error: {}", e);
        print_bridge_hint();
        std::process::exit(1);
    }

    let bridge = ProcessBridge::from_config(&config);

    if args.list_devices {
        return print_devices(&bridge, args.json).await;
    }

    let action = match args.command.map(Command::into_action) {
        Some(Ok(action)) => action,
        Some(Err(e)) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        None => return Ok(()),
    };

    let mut terminal = StdTerminal::new();
    let mut dispatcher = Dispatcher::new(&config, &bridge, &mut terminal);

    match dispatcher.run(&action).await {
        Ok(report) if report.is_success() => Ok(()),
        Ok(report) => {
            eprintln!(
                "{} of {} command(s) failed:",
                report.failures.len(),
                report.attempted()
            );
            for failure in &report.failures {
                eprintln!("  {}: {}", failure.target, failure.message);
            }
            std::process::exit(1);
        }
        Err(e) if e.is_clean_exit() => {
            println!("{}", e);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(normalize_args(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_package_commands() {
        let cli = parse(&["eadb", "clear-data", "*foo*"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::ClearData {
                keyword: "*foo*".to_string()
            })
        );

        let cli = parse(&["eadb", "app-info", "com.example.app"]).unwrap();
        assert_eq!(
            cli.command.unwrap().into_action().unwrap(),
            Action::package(PackageOp::AppInfo, "com.example.app").unwrap()
        );
    }

    #[test]
    fn test_single_marker_keyword_is_usage_error() {
        let cli = parse(&["eadb", "uninstall", "*foo"]).unwrap();
        assert!(matches!(
            cli.command.unwrap().into_action(),
            Err(HubError::InvalidKeyword(_))
        ));
    }

    #[test]
    fn test_screenrecord_duration() {
        let cli = parse(&["eadb", "screenrecord", "clip", "-duration", "30"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Screenrecord {
                path: PathBuf::from("clip"),
                duration: Some(30),
            })
        );

        assert!(parse(&["eadb", "screenrecord", "clip", "--duration", "181"]).is_err());
        assert!(parse(&["eadb", "screenrecord", "clip", "--duration", "0"]).is_err());
        assert!(parse(&["eadb", "screenrecord", "clip", "--duration", "ten"]).is_err());
    }

    #[test]
    fn test_unknown_command_is_passed_through() {
        let cli = parse(&["eadb", "shell", "ls", "-la", "/sdcard"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Raw(
                ["shell", "ls", "-la", "/sdcard"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            ))
        );
    }

    #[test]
    fn test_duration_only_normalized_for_screenrecord() {
        let args = normalize_args(["eadb", "shell", "-duration"]);
        assert_eq!(args, vec!["eadb", "shell", "-duration"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_args_pass_through_normalization() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(vec![b'f', 0xff, b'o']);
        let args = normalize_args(vec![
            OsString::from("eadb"),
            OsString::from("screenrecord"),
            raw.clone(),
            OsString::from("-duration"),
            OsString::from("5"),
        ]);
        assert_eq!(args[2], raw);
        assert_eq!(args[3], "--duration");
    }

    #[test]
    fn test_help_is_passed_through() {
        let cli = parse(&["eadb", "help"]).unwrap();
        assert_eq!(cli.command, Some(Command::Raw(vec!["help".to_string()])));
        assert!(parse(&["eadb", "--help"]).is_err());
    }

    #[test]
    fn test_list_devices_flags() {
        let cli = parse(&["eadb", "--list-devices", "--json"]).unwrap();
        assert!(cli.list_devices);
        assert!(cli.json);
        assert!(cli.command.is_none());

        assert!(parse(&["eadb", "--json"]).is_err());
    }

    #[test]
    fn test_global_options() {
        let cli = parse(&["eadb", "--adb", "/sdk/adb", "-v", "packages"]).unwrap();
        assert_eq!(cli.adb.as_deref(), Some("/sdk/adb"));
        assert!(cli.verbose);
        assert_eq!(cli.command, Some(Command::Packages));
    }
}
