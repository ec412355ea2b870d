//! Printer session
//!
//! One lazily connected printer link per terminal. Desktop terminals talk to
//! the local print service over TCP; mobile terminals write to a paired
//! Bluetooth printer through its serial port.
//!
//! A failed job drops the link so the next job reconnects from scratch.

use crate::core::{Config, PrinterTransportSetting};
use receipt_printer::{NetworkPrinter, PrintError, PrintResult, Printer, SerialPrinter};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Physical transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    PrintService,
    Bluetooth,
}

impl TransportKind {
    /// Platform default: Bluetooth on mobile, print service elsewhere
    pub fn detect() -> Self {
        if cfg!(any(target_os = "android", target_os = "ios")) {
            Self::Bluetooth
        } else {
            Self::PrintService
        }
    }

    pub fn resolve(setting: PrinterTransportSetting) -> Self {
        match setting {
            PrinterTransportSetting::Auto => Self::detect(),
            PrinterTransportSetting::PrintService => Self::PrintService,
            PrinterTransportSetting::Bluetooth => Self::Bluetooth,
        }
    }
}

/// Open link
enum Transport {
    Network(NetworkPrinter),
    Serial(SerialPrinter),
}

impl Transport {
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        match self {
            Self::Network(p) => p.print(data).await,
            Self::Serial(p) => p.print(data).await,
        }
    }

    fn close(&self) {
        if let Self::Serial(p) = self {
            p.close();
        }
    }
}

/// Printer session with connect / reconnect / dispose
pub struct PrinterSession {
    kind: TransportKind,
    /// Print service address (`host:port`)
    addr: String,
    serial_port: String,
    baud_rate: u32,
    link: Mutex<Option<Transport>>,
}

impl PrinterSession {
    pub fn network(addr: impl Into<String>) -> Self {
        Self {
            kind: TransportKind::PrintService,
            addr: addr.into(),
            serial_port: String::new(),
            baud_rate: 0,
            link: Mutex::new(None),
        }
    }

    pub fn bluetooth(serial_port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            kind: TransportKind::Bluetooth,
            addr: String::new(),
            serial_port: serial_port.into(),
            baud_rate,
            link: Mutex::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        match TransportKind::resolve(config.printer_transport) {
            TransportKind::PrintService => Self::network(config.printer_addr.clone()),
            TransportKind::Bluetooth => {
                Self::bluetooth(config.printer_serial_port.clone(), config.printer_baud_rate)
            }
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    pub async fn is_connected(&self) -> bool {
        self.link.lock().await.is_some()
    }

    /// Connect if not already connected
    pub async fn connect(&self) -> PrintResult<()> {
        let mut link = self.link.lock().await;
        if link.is_none() {
            *link = Some(self.open().await?);
        }
        Ok(())
    }

    /// Drop the current link and connect again
    pub async fn reconnect(&self) -> PrintResult<()> {
        self.dispose().await;
        self.connect().await
    }

    pub async fn dispose(&self) {
        if let Some(transport) = self.link.lock().await.take() {
            transport.close();
            info!(kind = ?self.kind, "Printer link closed");
        }
    }

    /// Send one job, connecting first if needed
    #[instrument(skip(self, data), fields(kind = ?self.kind, data_len = data.len()))]
    pub async fn print(&self, data: &[u8]) -> PrintResult<()> {
        let mut link = self.link.lock().await;
        if link.is_none() {
            *link = Some(self.open().await?);
        }
        let Some(transport) = link.as_ref() else {
            return Err(PrintError::Offline(self.target().to_string()));
        };

        if let Err(e) = transport.print(data).await {
            warn!(error = %e, "Print failed, dropping printer link");
            transport.close();
            *link = None;
            return Err(e);
        }
        Ok(())
    }

    fn target(&self) -> &str {
        match self.kind {
            TransportKind::PrintService => &self.addr,
            TransportKind::Bluetooth => &self.serial_port,
        }
    }

    async fn open(&self) -> PrintResult<Transport> {
        match self.kind {
            TransportKind::PrintService => {
                let printer = NetworkPrinter::from_addr(&self.addr)?.with_timeout(CONNECT_TIMEOUT);
                if !printer.is_online().await {
                    return Err(PrintError::Offline(self.addr.clone()));
                }
                info!(addr = %self.addr, "Connected to print service");
                Ok(Transport::Network(printer))
            }
            TransportKind::Bluetooth => {
                let printer = SerialPrinter::new(&self.serial_port, self.baud_rate)?;
                printer.open().await?;
                Ok(Transport::Serial(printer))
            }
        }
    }
}
