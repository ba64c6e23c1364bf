//! apctl - CLI entry point
//!
//! Runs in one of three modes:
//! - interactive (no command given): read-eval loop with keepalive
//! - batch (`apctl [options] <command> [args...]`): one command, then exit
//! - action monitor (`-a <program>`): run a program for every daemon event

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::io::BufReader;

use apctl::config::{ConfigError, ConfigLoader};
use apctl::daemon::{daemonize_process, wait_for_shutdown, PidFile};
use apctl::{logging, ClientConfig, Session, UnixConnector};

/// Control client for access point daemons
#[derive(Parser, Debug)]
#[command(name = "apctl")]
#[command(version, about = "Control client for access point daemons")]
struct Cli {
    /// Directory holding the daemon's control sockets
    #[arg(short = 'p', value_name = "DIR")]
    ctrl_dir: Option<PathBuf>,

    /// Interface to control (default: first one found)
    #[arg(short = 'i', value_name = "IFNAME")]
    interface: Option<String>,

    /// Keepalive interval in seconds
    #[arg(short = 'G', value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    ping_interval: Option<u64>,

    /// Run PROGRAM with the interface and event text for every daemon event
    #[arg(short = 'a', value_name = "PROGRAM")]
    action_program: Option<PathBuf>,

    /// Run in the background
    #[arg(short = 'B')]
    daemonize: bool,

    /// Write the process id to FILE
    #[arg(short = 'P', value_name = "FILE")]
    pid_file: Option<PathBuf>,

    /// Configuration file (default: $XDG_CONFIG_HOME/apctl/config.toml)
    #[arg(short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Command to run once instead of starting interactive mode
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    command: Vec<String>,
}

/// Loads the configuration file and applies command-line overrides.
fn client_config(cli: &Cli) -> Result<ClientConfig, ConfigError> {
    let mut config = ConfigLoader::load(cli.config.as_deref())?.resolve()?;
    if let Some(dir) = &cli.ctrl_dir {
        config.ctrl_dir = dir.clone();
    }
    if let Some(interface) = &cli.interface {
        config.interface = Some(interface.clone());
    }
    if let Some(secs) = cli.ping_interval {
        config.ping_interval = Duration::from_secs(secs);
    }
    Ok(config)
}

fn report(error: &dyn std::error::Error) {
    eprintln!("Error: {}", error);
    let mut source = error.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

async fn run(cli: Cli, config: ClientConfig) -> ExitCode {
    let connector = UnixConnector::new(config.local_dir.clone());
    let mut session = Session::new(connector, config);

    if let Some(program) = cli.action_program {
        return match session.run_action_monitor(program, wait_for_shutdown()).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                report(&e);
                ExitCode::FAILURE
            }
        };
    }

    if !cli.command.is_empty() {
        return match session.run_batch(&cli.command, wait_for_shutdown()).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                report(&e);
                ExitCode::FAILURE
            }
        };
    }

    let stdin = BufReader::new(tokio::io::stdin());
    session.run_interactive(stdin, wait_for_shutdown()).await;
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    // Parse CLI arguments BEFORE any fork/runtime operations so that usage
    // errors reach the terminal.
    let cli = Cli::parse();
    logging::init();

    let config = match client_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            report(&e);
            return ExitCode::FAILURE;
        }
    };

    // Daemonizing changes the working directory to /.
    let pid_path = match &cli.pid_file {
        Some(path) if path.is_relative() => match std::env::current_dir() {
            Ok(cwd) => Some(cwd.join(path)),
            Err(e) => {
                report(&e);
                return ExitCode::FAILURE;
            }
        },
        other => other.clone(),
    };

    if cli.daemonize {
        if let Err(e) = daemonize_process(false, false) {
            report(&e);
            return ExitCode::FAILURE;
        }
    }

    let _pid_file = match pid_path.map(PidFile::create).transpose() {
        Ok(pid_file) => pid_file,
        Err(e) => {
            report(&e);
            return ExitCode::FAILURE;
        }
    };

    // The runtime is created after daemonization.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            report(&e);
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(run(cli, config));
    // A pending stdin read cannot be cancelled; do not wait for it.
    runtime.shutdown_background();
    code
}
