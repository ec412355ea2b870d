//! Receipt print service
//!
//! Renders print contracts and sends them through the terminal's printer
//! session.

use super::renderer::{BillReceiptRenderer, KotRenderer, MenuListRenderer};
use super::session::PrinterSession;
use crate::core::Config;
use crate::error::BillingResult;
use shared::models::{KotData, MenuItem, ReceiptData};
use tracing::{info, instrument};

pub struct ReceiptPrintService {
    bill: BillReceiptRenderer,
    kot: KotRenderer,
    menu: MenuListRenderer,
    title: String,
    session: PrinterSession,
}

impl ReceiptPrintService {
    pub fn new(config: &Config, session: PrinterSession) -> Self {
        Self {
            bill: BillReceiptRenderer::new(config.restaurant.clone(), config.paper_width),
            kot: KotRenderer::new(config.paper_width),
            menu: MenuListRenderer::new(config.paper_width),
            title: config.restaurant.name.clone(),
            session,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config, PrinterSession::from_config(config))
    }

    pub fn session(&self) -> &PrinterSession {
        &self.session
    }

    #[instrument(skip(self, receipt), fields(bill_no = %receipt.bill_no))]
    pub async fn print_receipt(&self, receipt: &ReceiptData) -> BillingResult<()> {
        let data = self.bill.render(receipt);
        self.session.print(&data).await?;
        info!(bytes = data.len(), "Bill printed");
        Ok(())
    }

    #[instrument(skip(self, kot), fields(table = %kot.table))]
    pub async fn print_kot(&self, kot: &KotData) -> BillingResult<()> {
        let data = self.kot.render(kot);
        self.session.print(&data).await?;
        info!(items = kot.items.len(), "KOT printed");
        Ok(())
    }

    pub async fn print_menu(&self, items: &[MenuItem]) -> BillingResult<()> {
        let data = self.menu.render(&self.title, items);
        self.session.print(&data).await?;
        info!(items = items.len(), "Menu printed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RestaurantInfo;
    use crate::error::BillingError;
    use receipt_printer::PrintError;
    use shared::error::{AppError, ErrorCode};
    use shared::models::ReceiptItem;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_print_kot_over_network() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = Vec::new();
                if socket.read_to_end(&mut buf).await.is_ok() && !buf.is_empty() {
                    let _ = tx.send(buf);
                }
            }
        });

        let mut config = Config::with_overrides("/tmp", chrono_tz::Asia::Kolkata);
        config.paper_width = 32;
        config.restaurant = RestaurantInfo {
            name: "Spice Route".into(),
            ..RestaurantInfo::default()
        };
        let service = ReceiptPrintService::new(&config, PrinterSession::network(addr));

        let kot = KotData {
            table: "T2".into(),
            kind: "Dine In".into(),
            items: vec![ReceiptItem {
                name: "Chai".into(),
                price: 20.0,
                quantity: 3,
            }],
            total_qty: 3,
            date: "05 Mar 2025".into(),
            time: "07:45 pm".into(),
        };
        service.print_kot(&kot).await.unwrap();

        let sent = rx.recv().await.unwrap();
        let text = String::from_utf8_lossy(&sent);
        assert!(text.contains("KOT - T2"));
        assert!(text.contains("Chai"));
    }

    #[tokio::test]
    async fn test_offline_printer_reports_code() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let config = Config::with_overrides("/tmp", chrono_tz::Asia::Kolkata);
        let service = ReceiptPrintService::new(&config, PrinterSession::network(addr));
        let err = service.print_menu(&[]).await.unwrap_err();
        assert!(matches!(err, BillingError::Print(PrintError::Offline(_))));

        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::PrinterNotAvailable);
    }
}
