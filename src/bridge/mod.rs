//! 设备桥接模块
//!
//! 封装外部 adb 程序：路径解析、设备枚举、带超时的设备子命令

mod adb;
mod types;

#[cfg(test)]
pub mod fake;

pub use adb::{resolve_executable, resolve_executable_in, AdbBridge};
pub use types::{parse_device_list, CommandOutput, DeviceEntry, DeviceId, DeviceState};

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 设备桥接抽象
#[async_trait]
pub trait DeviceBridge: Send + Sync {
    /// 枚举处于可用状态的设备
    async fn list_devices(&self) -> Result<Vec<DeviceId>>;

    /// 对指定设备执行一条子命令
    async fn run_command(
        &self,
        device: &DeviceId,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput>;

    /// 读取系统属性（`getprop`），返回去掉空白的值
    async fn get_property(&self, device: &DeviceId, key: &str, timeout: Duration) -> Result<String> {
        let args = ["shell", "getprop", key].map(String::from);
        let output = self.run_command(device, &args, timeout).await?;
        Ok(output.stdout.trim().to_string())
    }

    /// 发送按键事件（`input keyevent`）
    async fn send_key_event(
        &self,
        device: &DeviceId,
        code: u32,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        let args = [
            "shell".to_string(),
            "input".to_string(),
            "keyevent".to_string(),
            code.to_string(),
        ];
        self.run_command(device, &args, timeout).await
    }
}
