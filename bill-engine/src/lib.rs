//! Bill Engine - 餐厅收银终端计费核心
//!
//! # 架构概述
//!
//! - **计费** (`billing`): 购物车、保存对账、移除确认、结账、选桌
//! - **存储** (`store`): 文档存储抽象 (内存 / redb) 与仓储
//! - **身份** (`identity`): 邮箱密码登录 + Argon2、员工权限
//! - **打印** (`printing`): 小票 / KOT 渲染与打印机会话
//!
//! # 模块结构
//!
//! ```text
//! bill-engine/src/
//! ├── core/          # 配置
//! ├── billing/       # 计费核心
//! ├── store/         # 文档存储
//! ├── identity/      # 登录与权限
//! ├── printing/      # 小票打印
//! └── utils/         # 日志、金额、时间
//! ```

pub mod billing;
pub mod core;
pub mod error;
pub mod identity;
pub mod printing;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use billing::{BillingEngine, Cart, RemovalFlow, SaveOutcome, Settlement, Tender};
pub use core::Config;
pub use error::{BillingError, BillingResult, IdentityError, PersistenceError, ValidationError};
pub use identity::{IdentityProvider, StaffDirectory};
pub use printing::{PrinterSession, ReceiptPrintService};
pub use store::{BillRepository, DocumentStore, MemoryStore, RedbStore};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
