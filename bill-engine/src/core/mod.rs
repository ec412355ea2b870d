pub mod config;

pub use config::{Config, PrinterTransportSetting, RestaurantInfo};
