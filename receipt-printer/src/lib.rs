//! # receipt-printer
//!
//! ESC/POS thermal printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building
//! - Single-byte code page encoding (PC858) for receipt printers
//! - Network printing (local print-service proxy or raw TCP port 9100)
//! - Serial printing (Bluetooth SPP links exposed as serial ports)
//!
//! Business logic (WHAT to print) stays in application code:
//! bill receipts and kitchen tickets are rendered by `bill-engine`.
//!
//! ## Example
//!
//! ```ignore
//! use receipt_printer::{EscPosBuilder, NetworkPrinter, Printer};
//!
//! let mut builder = EscPosBuilder::new(48);
//! builder.center();
//! builder.double_size();
//! builder.line("KOT");
//! builder.reset_size();
//! builder.sep_double();
//! builder.left();
//! builder.line("Table: T4");
//! builder.cut_partial();
//!
//! let printer = NetworkPrinter::from_addr("127.0.0.1:9100")?;
//! printer.print(&builder.build()).await?;
//! ```

mod encoding;
mod error;
mod escpos;
mod printer;

// Re-exports
pub use encoding::{encode_pc858, pad_text, text_width, truncate_text, wrap_text};
pub use error::{PrintError, PrintResult};
pub use escpos::EscPosBuilder;
pub use printer::{NetworkPrinter, Printer, SerialPrinter, list_bluetooth_ports};
