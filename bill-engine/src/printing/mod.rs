//! Receipt and KOT printing
//!
//! - [`renderer`]: bill / KOT / menu layouts as ESC/POS bytes
//! - [`session`]: print-service or Bluetooth link with reconnect
//! - [`service`]: render + send

pub mod renderer;
pub mod service;
pub mod session;

pub use renderer::{BillReceiptRenderer, KotRenderer, MenuListRenderer};
pub use service::ReceiptPrintService;
pub use session::{PrinterSession, TransportKind};
