//! Seriatim - serial protocol conformance driver
//!
//! Runs the fixed conformance table against a live device on a serial port
//! (or against the built-in loopback device as a self-check) and exits with a
//! distinguishable code per failure class.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use seriatim_core::{
    cli::{exit_code_for, ExitCodes},
    conformance_suite, list_ports, run_suite, DriverConfig, DriverError, LoopbackConfig,
    SerialFlowControl, SerialParity, Transport,
};

/// Seriatim CLI
#[derive(Parser, Debug)]
#[command(
    name = "seriatim",
    version,
    about = "Serial protocol conformance-test driver",
    long_about = None
)]
struct Cli {
    /// Configuration file (TOML); CLI flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available serial ports
    ListPorts {
        /// Show detailed info
        #[arg(short, long)]
        detailed: bool,
    },

    /// Run the conformance suite against a device
    Run {
        /// Serial port name (e.g., /dev/ttyACM0, COM3)
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate
        #[arg(short, long)]
        baud: Option<u32>,

        /// Data bits (5-8)
        #[arg(long)]
        data_bits: Option<u8>,

        /// Parity (none, odd, even)
        #[arg(long)]
        parity: Option<String>,

        /// Stop bits (1, 2)
        #[arg(long)]
        stop_bits: Option<u8>,

        /// Flow control (none, hw, sw)
        #[arg(long)]
        flow: Option<String>,

        /// Watchdog window per exchange, in milliseconds
        #[arg(long)]
        watchdog_ms: Option<u64>,

        /// Poll interval, in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Run against the built-in conforming loopback device (no hardware)
        #[arg(long)]
        loopback: bool,

        /// Emit the transcript as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(ExitCodes::CONFIG_ERROR);
        }
    };

    match cli.command {
        Commands::ListPorts { detailed } => cmd_list_ports(detailed),
        Commands::Run {
            port,
            baud,
            data_bits,
            parity,
            stop_bits,
            flow,
            watchdog_ms,
            tick_ms,
            loopback,
            json,
        } => {
            let mut config = config;
            if let Some(port) = port {
                config.serial.port = port;
            }
            if let Some(baud) = baud {
                config.serial.baud_rate = baud;
            }
            if let Some(bits) = data_bits {
                config.serial.data_bits = bits;
            }
            if let Some(parity) = parity {
                config.serial.parity = parity.parse().unwrap_or(SerialParity::None);
            }
            if let Some(bits) = stop_bits {
                config.serial.stop_bits = bits;
            }
            if let Some(flow) = flow {
                config.serial.flow_control = flow.parse().unwrap_or(SerialFlowControl::None);
            }
            if let Some(ms) = watchdog_ms {
                config.watchdog_ms = ms;
            }
            if let Some(ms) = tick_ms {
                config.tick_ms = ms;
            }

            let transport = if loopback {
                Transport::Loopback(LoopbackConfig::conforming())
            } else {
                Transport::Serial(config.serial.clone())
            };

            cmd_run(&config, transport, json).await
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<DriverConfig, anyhow::Error> {
    match path {
        Some(path) => Ok(DriverConfig::load(path)?),
        None => Ok(DriverConfig::default()),
    }
}

fn cmd_list_ports(detailed: bool) -> ExitCode {
    let ports = match list_ports() {
        Ok(ports) => ports,
        Err(e) => {
            eprintln!("Failed to list ports: {e}");
            return ExitCode::from(ExitCodes::ERROR);
        }
    };

    if ports.is_empty() {
        println!("No serial ports found");
        return ExitCode::SUCCESS;
    }

    for port in ports {
        if detailed {
            println!("{}\t{:?}", port.port_name, port.port_type);
        } else {
            println!("{}", port.port_name);
        }
    }
    ExitCode::SUCCESS
}

async fn cmd_run(config: &DriverConfig, transport: Transport, json: bool) -> ExitCode {
    match run_suite(
        transport,
        conformance_suite(),
        config.tick(),
        config.watchdog_window(),
    )
    .await
    {
        Ok(report) => {
            if json {
                match report.to_json() {
                    Ok(out) => println!("{out}"),
                    Err(e) => {
                        eprintln!("Failed to serialize transcript: {e}");
                        return ExitCode::from(ExitCodes::ERROR);
                    }
                }
            } else {
                print!("{}", report.transcript());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_failure(&err);
            exit_code_for(&err)
        }
    }
}

/// Print the failure diagnostic: the failing case, the fragment that was
/// expected, and everything that actually arrived.
fn report_failure(err: &DriverError) {
    match err {
        DriverError::Timeout {
            case,
            expected,
            received,
            window_ms,
        } => {
            eprintln!("FAIL {case}: no matching response within {window_ms} ms");
            eprintln!("  expected : {}", expected.trim());
            eprintln!("  received : {}", received.trim());
        }
        other => eprintln!("FAIL: {other}"),
    }
}
