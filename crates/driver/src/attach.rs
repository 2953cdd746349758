//! Binding a session to a physical device
//!
//! Everything here blocks; the async supervisor calls it through
//! `spawn_blocking`.

use crate::config::DriverConfig;
use crate::session::Session;
use crate::usb::{FlightstickDevice, RusbTransport, TransferTimeouts};
use anyhow::{Context, Result};
use common::EventSink;
use common::channel::EventNotifier;
use protocol::wire::DEVICE_NAME;
use std::sync::Arc;
use tracing::info;

/// An open session on a claimed device
pub struct AttachedDevice {
    session: Session,
    transport: Arc<RusbTransport>,
    device: FlightstickDevice,
    phys: String,
}

impl AttachedDevice {
    /// Claim the report interface, start the transport and open the session
    pub fn attach(
        mut device: FlightstickDevice,
        config: &DriverConfig,
        sink: Arc<dyn EventSink>,
        notifier: EventNotifier,
    ) -> Result<Self> {
        let phys = device.phys_path();
        let report = device
            .report_interface(config.device.interrupt_endpoint()?)
            .with_context(|| format!("No usable report endpoint on {}", phys))?;

        let handle = device
            .open(report.interface)
            .with_context(|| format!("Failed to open {}", phys))?;

        let timeouts = TransferTimeouts {
            control: config.transfers.control_timeout(),
            interrupt_poll: config.transfers.interrupt_poll(),
        };
        let transport = Arc::new(
            RusbTransport::new(handle, timeouts, notifier)
                .context("Failed to spawn transfer threads")?,
        );

        let session = Session::new(transport.clone(), sink, report.endpoint);
        session.open().context("Failed to open session")?;

        info!(
            "{} attached at {} (endpoint {:#04x}, {} byte reads)",
            DEVICE_NAME, phys, report.endpoint.address, report.endpoint.max_packet_size
        );

        Ok(Self {
            session,
            transport,
            device,
            phys,
        })
    }

    pub fn phys(&self) -> &str {
        &self.phys
    }

    /// Close the session and give the device back
    pub fn detach(self) {
        let Self {
            session,
            transport,
            mut device,
            phys,
        } = self;

        session.close();
        // Streams hold transport references; they must go before the
        // transport threads are joined, and those before the handle is freed
        drop(session);
        drop(transport);
        device.close();

        info!("{} detached from {}", DEVICE_NAME, phys);
    }
}
