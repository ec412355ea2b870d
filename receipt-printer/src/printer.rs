//! Printer adapters for sending ESC/POS data
//!
//! Supports:
//! - Network printers: a local print-service proxy or a raw TCP port 9100
//! - Serial printers: Bluetooth SPP links exposed as serial ports

use crate::error::{PrintError, PrintResult};
use parking_lot::Mutex;
use serialport::{SerialPort, SerialPortType};
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

/// Bluetooth SPP modules choke on large writes
const SERIAL_CHUNK_SIZE: usize = 512;

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw ESC/POS data to the printer
    async fn print(&self, data: &[u8]) -> PrintResult<()>;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;
}

/// Network printer (TCP)
///
/// Most thermal printers support raw TCP printing on port 9100; the desktop
/// print-service proxy accepts the same raw stream on a local port.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkPrinter {
    /// Create a new network printer
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        Self::from_addr(&format!("{}:{}", host, port))
    }

    /// Create from a socket address string (e.g., "127.0.0.1:9100")
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;

        Ok(Self {
            addr,
            timeout: Duration::from_secs(5),
        })
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(data), fields(addr = %self.addr, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        info!("Connecting to printer");

        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr, e)))?;

        info!("Connected, sending {} bytes", data.len());

        stream.write_all(data).await.map_err(|e| {
            PrintError::Io(std::io::Error::new(
                e.kind(),
                format!("Write failed: {}", e),
            ))
        })?;
        stream.flush().await?;

        info!("Print job sent successfully");
        Ok(())
    }

    #[instrument(fields(addr = %self.addr))]
    async fn is_online(&self) -> bool {
        let check_timeout = Duration::from_millis(500);

        match tokio::time::timeout(check_timeout, TcpStream::connect(self.addr)).await {
            Ok(Ok(_)) => {
                info!("Printer online");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer check timeout");
                false
            }
        }
    }
}

/// Serial printer (Bluetooth SPP / USB-serial)
///
/// Keeps the port open between jobs. A failed write closes the port so the
/// next job reopens it.
#[derive(Clone)]
pub struct SerialPrinter {
    path: String,
    baud_rate: u32,
    timeout: Duration,
    port: Arc<Mutex<Option<Box<dyn SerialPort>>>>,
}

impl std::fmt::Debug for SerialPrinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPrinter")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .field("open", &self.is_open())
            .finish()
    }
}

impl SerialPrinter {
    pub fn new(path: &str, baud_rate: u32) -> PrintResult<Self> {
        if path.trim().is_empty() {
            return Err(PrintError::InvalidConfig("Empty serial port path".into()));
        }
        if baud_rate == 0 {
            return Err(PrintError::InvalidConfig("Baud rate must be > 0".into()));
        }
        Ok(Self {
            path: path.to_string(),
            baud_rate,
            timeout: Duration::from_secs(3),
            port: Arc::new(Mutex::new(None)),
        })
    }

    /// Set write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.port.lock().is_some()
    }

    /// Open the port if not already open
    #[instrument(skip(self), fields(path = %self.path))]
    pub async fn open(&self) -> PrintResult<()> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.open_blocking())
            .await
            .map_err(|e| PrintError::Connection(format!("serial task failed: {}", e)))?
    }

    /// Drop the open port handle
    pub fn close(&self) {
        if self.port.lock().take().is_some() {
            info!(path = %self.path, "Serial printer closed");
        }
    }

    fn open_blocking(&self) -> PrintResult<()> {
        let mut guard = self.port.lock();
        if guard.is_none() {
            let port = serialport::new(&self.path, self.baud_rate)
                .timeout(self.timeout)
                .open()?;
            info!(path = %self.path, baud = self.baud_rate, "Serial printer opened");
            *guard = Some(port);
        }
        Ok(())
    }

    fn write_blocking(&self, data: &[u8]) -> PrintResult<()> {
        self.open_blocking()?;
        let mut guard = self.port.lock();
        let Some(port) = guard.as_mut() else {
            return Err(PrintError::Offline(self.path.clone()));
        };

        let result = data
            .chunks(SERIAL_CHUNK_SIZE)
            .try_for_each(|chunk| port.write_all(chunk))
            .and_then(|_| port.flush());

        if let Err(e) = result {
            // Stale link: drop it so the next job reconnects
            *guard = None;
            return Err(PrintError::Io(e));
        }
        Ok(())
    }
}

impl Printer for SerialPrinter {
    #[instrument(skip(self, data), fields(path = %self.path, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        let this = self.clone();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || this.write_blocking(&data))
            .await
            .map_err(|e| PrintError::Connection(format!("serial task failed: {}", e)))??;

        info!("Print job sent successfully");
        Ok(())
    }

    async fn is_online(&self) -> bool {
        match self.open().await {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path, error = %e, "Serial printer offline");
                false
            }
        }
    }
}

/// List serial ports backed by Bluetooth SPP
pub fn list_bluetooth_ports() -> PrintResult<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .filter(|p| matches!(p.port_type, SerialPortType::BluetoothPort))
        .map(|p| p.port_name)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_network_printer_new() {
        let printer = NetworkPrinter::new("127.0.0.1", 9100).unwrap();
        assert_eq!(printer.addr().port(), 9100);
    }

    #[test]
    fn test_invalid_addr() {
        assert!(NetworkPrinter::from_addr("invalid").is_err());
    }

    #[test]
    fn test_serial_printer_config() {
        assert!(SerialPrinter::new("", 9600).is_err());
        assert!(SerialPrinter::new("/dev/rfcomm0", 0).is_err());

        let printer = SerialPrinter::new("/dev/rfcomm0", 9600).unwrap();
        assert_eq!(printer.path(), "/dev/rfcomm0");
        assert!(!printer.is_open());
    }

    #[tokio::test]
    async fn test_network_print_sends_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            socket.read_to_end(&mut buf).await.unwrap();
            buf
        });

        let printer = NetworkPrinter::from_addr(&addr.to_string()).unwrap();
        printer.print(b"\x1B\x40hello\n").await.unwrap();

        let received = server.await.unwrap();
        assert_eq!(received, b"\x1B\x40hello\n");
    }

    #[tokio::test]
    async fn test_network_print_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let printer = NetworkPrinter::from_addr(&addr.to_string())
            .unwrap()
            .with_timeout(Duration::from_millis(500));
        let err = printer.print(b"x").await.unwrap_err();
        assert!(matches!(err, PrintError::Connection(_) | PrintError::Timeout(_)));
        assert!(!printer.is_online().await);
    }
}
