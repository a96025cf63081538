// SPDX-License-Identifier: GPL-3.0-only
//! `vcpctl`: read and drive monitor VCP controls from the command line

#[macro_use]
extern crate tracing;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use monitor_vcp::VcpError;
use monitor_vcp::config::Config;
use monitor_vcp::control::ControlContext;
use monitor_vcp::monitor::{self, MonitorVcp, VcpProperty, VcpRegistry};
use monitor_vcp::observer::LogObserver;

#[derive(Parser, Debug)]
#[command(name = "vcpctl", version, about = "Monitor VCP control over DDC/CI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List displays and their current levels
    List,
    /// Read one property
    Get {
        /// Display id, index or model name
        display: String,
        /// brightness, contrast, gain.<red|green|blue>, drive.<red|green|blue>
        property: VcpProperty,
    },
    /// Write one property
    Set {
        display: String,
        property: VcpProperty,
        value: u32,
        /// Write once without reading back
        #[arg(long)]
        no_verify: bool,
    },
    /// Read or switch power
    Power {
        display: String,
        state: Option<PowerState>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PowerState {
    On,
    Off,
}

fn setup_logs() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new(format!(
        "warn,{}=warn",
        env!("CARGO_CRATE_NAME")
    )));

    if let Ok(journal_layer) = tracing_journald::layer() {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .with(journal_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    }
}

/// Match a display by id, then index, then model name substring
fn find_display(monitors: &[Arc<MonitorVcp>], query: &str) -> Result<Arc<MonitorVcp>, VcpError> {
    let query_lower = query.to_ascii_lowercase();

    monitors
        .iter()
        .find(|m| m.id() == query)
        .or_else(|| query.parse::<usize>().ok().and_then(|i| monitors.get(i)))
        .or_else(|| {
            monitors
                .iter()
                .find(|m| m.name().to_ascii_lowercase().contains(&query_lower))
        })
        .cloned()
        .ok_or_else(|| VcpError::DisplayNotFound(query.to_string()))
}

fn run(cli: Cli) -> Result<(), VcpError> {
    let config = Config::load();
    let ctx = ControlContext::new(&config, Arc::new(LogObserver));
    // The CLI reads on demand, no point in a background refresh
    let config = Config {
        refresh_on_attach: false,
        ..config
    };

    let registry = VcpRegistry::shared();
    let monitors = monitor::attach_all(&registry, monitor::enumerate_ddc(), &ctx, &config);

    match cli.command {
        Command::List => {
            if monitors.is_empty() {
                println!("No DDC/CI displays found");
            }
            for (index, monitor) in monitors.iter().enumerate() {
                println!("{index}: {} ({})", monitor.name(), monitor.id());
                for (property, level) in monitor.levels() {
                    match level.get() {
                        Ok(reading) => println!(
                            "    {property:<12} {:>5}  [{}..{}]",
                            reading.value, reading.min, reading.max
                        ),
                        Err(err) => debug!("{}", err),
                    }
                }
            }
        }
        Command::Get { display, property } => {
            let monitor = find_display(&monitors, &display)?;
            let reading = monitor.level(property).get()?;
            println!("{} [{}..{}]", reading.value, reading.min, reading.max);
        }
        Command::Set {
            display,
            property,
            value,
            no_verify,
        } => {
            let monitor = find_display(&monitors, &display)?;
            let level = monitor.level(property);
            if no_verify {
                level.set_sync(value)?;
            } else {
                level.set_checked(value)?;
            }
            println!("{property} = {}", level.value());
        }
        Command::Power { display, state } => {
            let monitor = find_display(&monitors, &display)?;
            match state {
                Some(state) => monitor.power().set(matches!(state, PowerState::On))?,
                None => {
                    let on = monitor.power().get()?;
                    println!("{}", if on { "on" } else { "off" });
                }
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    setup_logs();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
