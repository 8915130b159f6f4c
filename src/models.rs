// models.rs - 作为模块目录入口文件（Rust 2018+ 风格）
// 导出所有子模块
pub mod config;
pub mod dataset;
pub mod record;
pub mod state;
pub mod utils;

// 重新导出常用类型，保持API一致性
pub use config::{
    BackendKind, ColorConfig, Config, ImagesConfig, KeybindingsConfig, LoggingConfig,
    RemoteConfig, TuiConfig,
};
pub use dataset::{ColumnLayout, Dataset};
pub use record::{PneumothoraxType, Record};
pub use state::SessionPhase;
