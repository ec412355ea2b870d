use chrono_tz::Tz;

/// 门店信息 - 打印在小票抬头
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
    /// GST registration number, omitted from receipts when empty
    pub gst: Option<String>,
}

impl Default for RestaurantInfo {
    fn default() -> Self {
        Self {
            name: "RESTAURANT".into(),
            phone: String::new(),
            address: String::new(),
            gst: None,
        }
    }
}

/// 打印通道选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterTransportSetting {
    /// Bluetooth on mobile builds, print service elsewhere
    Auto,
    PrintService,
    Bluetooth,
}

impl PrinterTransportSetting {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "print-service" | "print_service" | "network" => Some(Self::PrintService),
            "bluetooth" | "serial" => Some(Self::Bluetooth),
            _ => None,
        }
    }
}

/// 计费引擎配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (redb 数据库、日志) |
/// | ENVIRONMENT | development | 运行环境 |
/// | TIMEZONE | Asia/Kolkata | 业务时区 (单号按自然日编号) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (none) | 日志目录，设置后按天滚动写文件 |
/// | RESTAURANT_NAME | RESTAURANT | 小票抬头 |
/// | RESTAURANT_PHONE | | 电话 |
/// | RESTAURANT_ADDRESS | | 地址 |
/// | RESTAURANT_GST | | GST 号 |
/// | PAPER_WIDTH | 48 | 纸宽字符数 (80mm=48, 58mm=32) |
/// | PRINTER_ADDR | 127.0.0.1:9100 | 打印服务地址 |
/// | PRINTER_SERIAL_PORT | /dev/rfcomm0 | 蓝牙串口 |
/// | PRINTER_BAUD_RATE | 9600 | 串口波特率 |
/// | PRINTER_TRANSPORT | auto | auto / print-service / bluetooth |
/// | OPERATOR_NAME | Admin | 小票上的收银员 |
///
/// # 示例
///
/// ```ignore
/// TIMEZONE=Asia/Kolkata PAPER_WIDTH=32 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 业务时区
    pub timezone: Tz,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub restaurant: RestaurantInfo,
    /// 纸宽 (字符)
    pub paper_width: usize,
    pub printer_addr: String,
    pub printer_serial_port: String,
    pub printer_baud_rate: u32,
    pub printer_transport: PrinterTransportSetting,
    pub operator_name: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        let timezone = std::env::var("TIMEZONE")
            .ok()
            .and_then(|tz| match tz.parse::<Tz>() {
                Ok(tz) => Some(tz),
                Err(_) => {
                    tracing::warn!(timezone = %tz, "Unknown TIMEZONE, falling back to Asia/Kolkata");
                    None
                }
            })
            .unwrap_or(chrono_tz::Asia::Kolkata);

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            timezone,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            restaurant: RestaurantInfo {
                name: std::env::var("RESTAURANT_NAME").unwrap_or_else(|_| "RESTAURANT".into()),
                phone: std::env::var("RESTAURANT_PHONE").unwrap_or_default(),
                address: std::env::var("RESTAURANT_ADDRESS").unwrap_or_default(),
                gst: std::env::var("RESTAURANT_GST")
                    .ok()
                    .filter(|g| !g.trim().is_empty()),
            },
            paper_width: std::env::var("PAPER_WIDTH")
                .ok()
                .and_then(|w| w.parse().ok())
                .filter(|w| *w == 32 || *w == 48)
                .unwrap_or(48),
            printer_addr: std::env::var("PRINTER_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:9100".into()),
            printer_serial_port: std::env::var("PRINTER_SERIAL_PORT")
                .unwrap_or_else(|_| "/dev/rfcomm0".into()),
            printer_baud_rate: std::env::var("PRINTER_BAUD_RATE")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or(9600),
            printer_transport: std::env::var("PRINTER_TRANSPORT")
                .ok()
                .and_then(|t| PrinterTransportSetting::parse(&t))
                .unwrap_or(PrinterTransportSetting::Auto),
            operator_name: std::env::var("OPERATOR_NAME").unwrap_or_else(|_| "Admin".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, timezone: Tz) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.timezone = timezone;
        config
    }

    /// redb 数据库文件路径
    pub fn database_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("billing.redb")
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
