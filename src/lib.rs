//! ADB 自动配置
//!
//! 持续枚举通过 adb 连接的设备，对每台新发现的设备执行幂等的配置流水线
//! （等待开机完成、唤醒、按顺序执行配置命令），并限制同时配置的设备数。
//!
//! 外部协作者（控制台或 UI）负责启动/停止 [`monitor::Monitor`]，提供并发上限，
//! 并消费 [`logger::MonitorEvent`] 事件流。

pub mod bridge;
pub mod config;
pub mod error;
pub mod logger;
pub mod monitor;
pub mod pool;
pub mod worker;

pub use bridge::{AdbBridge, DeviceBridge, DeviceId};
pub use config::{MonitorConfig, ProvisionConfig};
pub use error::{AppError, Result};
pub use logger::{EventSender, MonitorEvent, MonitorObserver};
pub use monitor::{Monitor, MonitorState};
