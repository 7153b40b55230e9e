use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::types::{parse_device_list, CommandOutput, DeviceId};
use super::DeviceBridge;
use crate::config::BridgeConfig;
use crate::error::{AppError, Result};

#[cfg(windows)]
const ADB_FILE_NAME: &str = "adb.exe";
#[cfg(not(windows))]
const ADB_FILE_NAME: &str = "adb";

/// 解析 adb 可执行文件路径
///
/// 优先使用与当前程序放在一起的 `adb/adb(.exe)`，找不到时回退到 PATH 中的 `adb`。
pub fn resolve_executable() -> PathBuf {
    let base_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    resolve_executable_in(base_dir.as_deref())
}

pub fn resolve_executable_in(base_dir: Option<&Path>) -> PathBuf {
    if let Some(base_dir) = base_dir {
        let candidates = [
            base_dir.join("adb").join(ADB_FILE_NAME),
            base_dir.join(ADB_FILE_NAME),
        ];
        if let Some(bundled) = candidates.into_iter().find(|p| p.is_file()) {
            return bundled;
        }
    }
    PathBuf::from("adb")
}

/// 通过外部 adb 程序实现的设备桥接
pub struct AdbBridge {
    executable: PathBuf,
    list_timeout: Duration,
}

impl AdbBridge {
    pub fn new(executable: PathBuf, list_timeout: Duration) -> Self {
        Self {
            executable,
            list_timeout,
        }
    }

    /// 按配置创建，未指定路径时自动解析（只解析一次）
    pub fn from_config(config: &BridgeConfig) -> Self {
        let executable = config
            .executable
            .clone()
            .unwrap_or_else(resolve_executable);
        Self::new(executable, config.list_timeout())
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// 运行一次 adb，只捕获输出，不写调用方的标准流
    async fn exec(&self, args: &[String], timeout: Duration) -> Result<CommandOutput> {
        let command_line = format!("{} {}", self.executable.display(), args.join(" "));
        debug!("执行 ADB 命令: {}", command_line);

        let output = Command::new(&self.executable)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        // 超时后 future 被丢弃，子进程随之被 kill
        let output = match tokio::time::timeout(timeout, output).await {
            Err(_) => {
                return Err(AppError::Timeout {
                    command: command_line,
                    after: timeout,
                });
            }
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::BridgeNotFound(format!(
                    "{}: {}",
                    self.executable.display(),
                    e
                )));
            }
            Ok(Err(e)) => {
                return Err(AppError::ExecutionError(format!("{}: {}", command_line, e)));
            }
            Ok(Ok(output)) => output,
        };

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

#[async_trait]
impl DeviceBridge for AdbBridge {
    async fn list_devices(&self) -> Result<Vec<DeviceId>> {
        let output = self.exec(&["devices".to_string()], self.list_timeout).await?;

        if !output.success() {
            return Err(AppError::ExecutionError(format!(
                "adb devices failed ({})",
                output.failure_detail()
            )));
        }

        let devices = parse_device_list(&output.stdout)?
            .into_iter()
            .filter(|entry| {
                if !entry.state.is_ready() {
                    debug!("跳过设备 {} (状态: {})", entry.id, entry.state);
                }
                entry.state.is_ready()
            })
            .map(|entry| entry.id)
            .collect();

        Ok(devices)
    }

    async fn run_command(
        &self,
        device: &DeviceId,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput> {
        let mut full = Vec::with_capacity(args.len() + 2);
        full.push("-s".to_string());
        full.push(device.to_string());
        full.extend_from_slice(args);
        self.exec(&full, timeout).await
    }
}
