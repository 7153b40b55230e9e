//! 配置模块
//!
//! 监控循环、设备桥接和配置批次的 TOML 配置

mod provision_config;

pub use provision_config::{
    BridgeConfig, ConfigError, MonitorConfig, ProvisionConfig, ProvisioningPlan,
    MAX_CONCURRENT_DEVICES_LIMIT,
};
