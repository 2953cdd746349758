//! hori-flightstick
//!
//! Userspace driver for the Mitsubishi Hori/Namco flightstick. Waits for the
//! device, keeps its report and vendor-poll streams running, and prints the
//! decoded input state.

use anyhow::{Context, Result};
use clap::Parser;
use common::channel::{TransportEvent, create_event_bridge};
use common::{ChannelSink, EventSink, setup_logging};
use driver::attach::AttachedDevice;
use driver::capabilities::capabilities;
use driver::config::{DriverConfig, expand_path};
use driver::output::{EventPrinter, run_output};
use driver::usb::{DeviceFilter, DeviceManager, FlightstickDevice};
use protocol::wire::DEVICE_NAME;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{debug, error, info, warn};

/// Sink events buffered between the transfer threads and the printer
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Parser, Debug)]
#[command(name = "hori-flightstick")]
#[command(
    author,
    version,
    about = "Userspace driver for the Mitsubishi Hori/Namco flightstick"
)]
#[command(long_about = "
Userspace driver for the Mitsubishi Hori/Namco flightstick (06d3:0f10).
Reads the interrupt report and polls both vendor records, then prints the
decoded state of every button and axis.

EXAMPLES:
    # Run with default config
    hori-flightstick

    # Print capabilities as JSON and exit
    hori-flightstick --describe

    # List matching devices without starting the driver
    hori-flightstick --list-devices

    # Run with trace logging (includes mode selector changes)
    hori-flightstick --log-level trace

CONFIGURATION:
    The driver looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/hori-flightstick/driver.toml
    3. /etc/hori-flightstick/driver.toml
    4. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// List matching USB devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Print advertised buttons and axes as JSON and exit
    #[arg(long)]
    describe: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.save_config {
        let config = DriverConfig::default();
        let path = DriverConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    if args.describe {
        let json = serde_json::to_string_pretty(&capabilities())
            .context("Failed to serialize capabilities")?;
        println!("{}", json);
        return Ok(());
    }

    let config = if let Some(ref path) = args.config {
        DriverConfig::load(Some(expand_path(path))).context("Failed to load configuration")?
    } else {
        DriverConfig::load_or_default()
    };

    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.driver.log_level);
    setup_logging(log_level).context("Failed to setup logging")?;

    info!("hori-flightstick v{}", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", log_level);

    let filter = DeviceFilter {
        vendor_id: config.device.vendor_id()?,
        product_id: config.device.product_id()?,
    };
    let manager =
        Arc::new(DeviceManager::new(filter).context("Failed to initialize USB context")?);

    if args.list_devices {
        return list_devices_mode(&manager);
    }

    run(config, manager).await
}

/// List matching devices and exit
fn list_devices_mode(manager: &DeviceManager) -> Result<()> {
    let filter = manager.filter();
    let devices = manager
        .list_devices()
        .context("Failed to enumerate USB devices")?;

    if devices.is_empty() {
        println!(
            "No {:04x}:{:04x} devices found.",
            filter.vendor_id, filter.product_id
        );
        return Ok(());
    }

    println!("Found {} device(s):\n", devices.len());
    for device in devices {
        println!(
            "  {:04x}:{:04x} - {} {}",
            device.vendor_id,
            device.product_id,
            device
                .manufacturer
                .as_deref()
                .unwrap_or("Unknown Manufacturer"),
            device.product.as_deref().unwrap_or("Unknown Product")
        );
        println!(
            "      Bus {:03} Device {:03} Path: {}",
            device.bus_number, device.device_address, device.phys
        );
        if let Some(serial) = &device.serial_number {
            println!("      Serial: {}", serial);
        }
        println!();
    }

    Ok(())
}

/// Attach, run until the device goes away, repeat. Returns on Ctrl+C.
async fn run(config: DriverConfig, manager: Arc<DeviceManager>) -> Result<()> {
    let (sink, events) = ChannelSink::new(EVENT_CHANNEL_CAPACITY);
    let sink = Arc::new(sink);
    let output = tokio::spawn(run_output(events, EventPrinter::new(&config.output)));
    let config = Arc::new(config);
    let rescan = config.transfers.rescan_interval();

    info!("Press Ctrl+C to exit");
    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let device = tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!("Error waiting for Ctrl+C: {}", e);
                }
                break;
            }
            device = wait_for_device(manager.clone(), rescan) => device?,
        };

        let (bridge, notifier) = create_event_bridge();
        let attached = {
            let config = config.clone();
            let sink: Arc<dyn EventSink> = sink.clone();
            tokio::task::spawn_blocking(move || {
                AttachedDevice::attach(device, &config, sink, notifier)
            })
            .await
            .context("Attach task failed")?
        };

        let attached = match attached {
            Ok(attached) => attached,
            Err(e) => {
                error!("{:#}", e);
                tokio::time::sleep(rescan).await;
                continue;
            }
        };

        let stop = tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!("Error waiting for Ctrl+C: {}", e);
                }
                info!("Received Ctrl+C, shutting down...");
                true
            }
            event = bridge.recv_event() => {
                match event {
                    Ok(TransportEvent::DeviceLost) => warn!("{} disconnected", attached.phys()),
                    Err(e) => warn!("Transport event channel closed: {}", e),
                }
                false
            }
        };

        tokio::task::spawn_blocking(move || attached.detach())
            .await
            .context("Detach task failed")?;

        if stop {
            break;
        }
    }

    if sink.dropped() > 0 {
        warn!("{} input events dropped by a slow consumer", sink.dropped());
    }
    drop(sink);
    if let Err(e) = output.await {
        debug!("Output task ended abnormally: {}", e);
    }

    info!("Driver shutdown complete");
    Ok(())
}

/// Scan until a matching device shows up
async fn wait_for_device(
    manager: Arc<DeviceManager>,
    interval: Duration,
) -> Result<FlightstickDevice> {
    let mut announced = false;

    loop {
        let scan = manager.clone();
        let found = tokio::task::spawn_blocking(move || scan.find())
            .await
            .context("Device scan task failed")?;

        match found {
            Ok(Some(device)) => return Ok(device),
            Ok(None) if !announced => {
                let filter = manager.filter();
                info!(
                    "Waiting for {} ({:04x}:{:04x})",
                    DEVICE_NAME, filter.vendor_id, filter.product_id
                );
                announced = true;
            }
            Ok(None) => {}
            Err(e) => warn!("Device scan failed: {}", e),
        }

        tokio::time::sleep(interval).await;
    }
}
