//! 设备配置流水线
//!
//! 等待开机完成 → 唤醒 → 按顺序执行配置命令

mod device_worker;

pub use device_worker::{DeviceWorker, ProvisionOutcome, WorkerState};
