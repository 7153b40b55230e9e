//! 监控循环
//!
//! 定期枚举设备，上报数量，并为每台设备向线程池提交配置任务

mod monitor_loop;
mod types;

pub use monitor_loop::Monitor;
pub use types::{MonitorError, MonitorState};
