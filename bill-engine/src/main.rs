use anyhow::Context;
use bill_engine::{BillingEngine, Config, RedbStore, ReceiptPrintService, init_logger_with_file};
use bill_engine::store::{BillRepository, DocumentStore};
use shared::error::AppError;
use shared::models::KitchenOrderStatus;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境 (dotenv, 工作目录, 日志)
    dotenv::dotenv().ok();
    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)
        .with_context(|| format!("failed to create work dir {}", config.work_dir))?;
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!(
        environment = %config.environment,
        timezone = %config.timezone,
        "Bill engine starting..."
    );

    // 2. 存储
    let store: Arc<dyn DocumentStore> = Arc::new(
        RedbStore::open(config.database_path()).context("failed to open document store")?,
    );
    let engine = BillingEngine::new(store, config.timezone);
    let repo: &BillRepository = engine.repository();

    // 3. 桌台概览
    for table in repo.list_tables().await? {
        let open = repo.open_bills_for_table(&table.doc_id).await?;
        if !open.is_empty() {
            tracing::info!(table = %table.short_code, open_bills = open.len(), "Table has open bills");
        }
    }

    // 4. 可选: 打印菜单测试页
    if std::env::args().any(|a| a == "--test-print") {
        let printer = ReceiptPrintService::from_config(&config);
        let menu = repo.list_menu_items().await?;
        if let Err(e) = printer.print_menu(&menu).await {
            let app = AppError::from(e);
            tracing::error!(error_code = %app.code, error = %app.message, "Test print failed");
        }
        printer.session().dispose().await;
    }

    // 5. 厨房待做单实时推送, Ctrl+C 退出
    let mut feed = repo.watch_orders(KitchenOrderStatus::Pending);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            snapshot = feed.next() => match snapshot {
                Some(Ok(docs)) => match BillRepository::decode_orders(docs) {
                    Ok(orders) => tracing::info!(pending = orders.len(), "Kitchen feed updated"),
                    Err(e) => tracing::warn!(error = %e, "Undecodable kitchen order"),
                },
                Some(Err(e)) => tracing::warn!(error = %e, "Kitchen feed error"),
                None => break,
            },
        }
    }

    Ok(())
}
