use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 并发设备数上限
pub const MAX_CONCURRENT_DEVICES_LIMIT: usize = 120;

/// 完整的配置文件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    pub monitor: MonitorConfig,
    pub bridge: BridgeConfig,
    pub provisioning: ProvisioningPlan,
}

/// 监控循环配置，在一次运行期间不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// 同时执行的配置流水线上限 [1, 120]
    pub max_concurrent_devices: usize,

    /// 轮询间隔（毫秒）
    pub poll_interval_ms: u64,

    /// 枚举失败后的重试间隔（毫秒）
    pub poll_error_backoff_ms: u64,

    /// 停止时等待活跃流水线的宽限期（毫秒）
    pub shutdown_grace_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_devices: 6,
            poll_interval_ms: 2000,
            poll_error_backoff_ms: 1000,
            shutdown_grace_ms: 3000,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_error_backoff(&self) -> Duration {
        Duration::from_millis(self.poll_error_backoff_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CONCURRENT_DEVICES_LIMIT).contains(&self.max_concurrent_devices) {
            return Err(ConfigError::ValidationError(format!(
                "max_concurrent_devices must be within [1, {}], got {}",
                MAX_CONCURRENT_DEVICES_LIMIT, self.max_concurrent_devices
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.poll_error_backoff_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll_error_backoff_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// 设备桥接（adb）调用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// 显式指定的 adb 路径，未设置时自动解析
    pub executable: Option<PathBuf>,

    /// `adb devices` 超时（毫秒）
    pub list_timeout_ms: u64,

    /// 开机完成检查超时（毫秒）
    pub boot_timeout_ms: u64,

    /// 单条配置命令超时（毫秒）
    pub command_timeout_ms: u64,

    /// 开机完成属性
    pub boot_property: String,

    /// 开机完成时属性的值
    pub boot_ready_value: String,

    /// 唤醒按键码（KEYCODE_MENU）
    pub wake_key_code: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            executable: None,
            list_timeout_ms: 10_000,
            boot_timeout_ms: 120_000,
            command_timeout_ms: 30_000,
            boot_property: "sys.boot_completed".to_string(),
            boot_ready_value: "1".to_string(),
            wake_key_code: 82,
        }
    }
}

impl BridgeConfig {
    pub fn list_timeout(&self) -> Duration {
        Duration::from_millis(self.list_timeout_ms)
    }

    pub fn boot_timeout(&self) -> Duration {
        Duration::from_millis(self.boot_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// 有序的配置命令批次，每条是一个作用于设备的 argv
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningPlan {
    pub commands: Vec<Vec<String>>,
}

impl Default for ProvisioningPlan {
    fn default() -> Self {
        let argv = |parts: &[&str]| parts.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        Self {
            commands: vec![
                argv(&[
                    "shell",
                    "pm",
                    "disable-user",
                    "--user",
                    "0",
                    "com.google.android.setupwizard",
                ]),
                // 把 ussd 换成实际要执行的代码
                argv(&[
                    "shell",
                    "am",
                    "broadcast",
                    "-a",
                    "android.provider.Telephony.SECRET_CODE",
                    "-d",
                    "android_secret_code://ussd",
                ]),
            ],
        }
    }
}

impl ProvisioningPlan {
    pub fn new(commands: Vec<Vec<String>>) -> Self {
        Self { commands }
    }
}

impl ProvisionConfig {
    /// 从 TOML 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: ProvisionConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// 从文件加载，并使用环境变量覆盖
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env()?;
        Ok(config)
    }

    /// 环境变量覆盖：ADB_PROVISION_MAX_DEVICES / ADB_PROVISION_ADB
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(max) = std::env::var("ADB_PROVISION_MAX_DEVICES") {
            self.monitor.max_concurrent_devices = max.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("ADB_PROVISION_MAX_DEVICES is not a number: {}", max))
            })?;
        }

        if let Ok(adb) = std::env::var("ADB_PROVISION_ADB") {
            self.bridge.executable = Some(PathBuf::from(adb));
        }

        Ok(())
    }

    /// 保存到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monitor.validate()?;

        if let Some(empty) = self.provisioning.commands.iter().position(|c| c.is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "provisioning command #{} is empty",
                empty + 1
            )));
        }

        Ok(())
    }
}

/// 配置错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO 错误: {0}")]
    IoError(String),

    #[error("解析错误: {0}")]
    ParseError(String),

    #[error("序列化错误: {0}")]
    SerializeError(String),

    #[error("验证错误: {0}")]
    ValidationError(String),
}
