//! 设备桥接相关的类型定义

use crate::error::{AppError, Result};
use std::fmt;

/// `adb devices` 输出的表头
const DEVICE_LIST_HEADER: &str = "List of devices attached";

/// 设备标识（adb serial），只在设备保持连接期间有效
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(serial: impl Into<String>) -> Self {
        Self(serial.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(serial: &str) -> Self {
        Self::new(serial)
    }
}

/// 设备状态列
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceState {
    /// 已连接，可用
    Device,
    Offline,
    Unauthorized,
    NoPermissions,
    /// bootloader / recovery / sideload 等
    Other(String),
}

impl DeviceState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "device" => DeviceState::Device,
            "offline" => DeviceState::Offline,
            "unauthorized" => DeviceState::Unauthorized,
            s if s.starts_with("no permissions") => DeviceState::NoPermissions,
            s => DeviceState::Other(s.to_string()),
        }
    }

    /// 只有 `device` 状态的行参与计数和配置
    pub fn is_ready(&self) -> bool {
        matches!(self, DeviceState::Device)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceState::Device => write!(f, "device"),
            DeviceState::Offline => write!(f, "offline"),
            DeviceState::Unauthorized => write!(f, "unauthorized"),
            DeviceState::NoPermissions => write!(f, "no permissions"),
            DeviceState::Other(s) => write!(f, "{}", s),
        }
    }
}

/// 设备列表中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub id: DeviceId,
    pub state: DeviceState,
}

/// 子命令的捕获输出
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// 被信号终止时为 None
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// 便于日志展示的失败说明
    pub fn failure_detail(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{}: {}", status, stderr)
        }
    }
}

/// 解析 `adb devices` 的输出
///
/// 表头之前的内容（daemon 启动提示等）被忽略；没有表头或某行缺少状态列时返回 `ParseError`。
pub fn parse_device_list(output: &str) -> Result<Vec<DeviceEntry>> {
    let mut lines = output.lines().map(str::trim);

    if !lines.any(|line| line == DEVICE_LIST_HEADER) {
        return Err(AppError::ParseError(format!(
            "missing `{}` header",
            DEVICE_LIST_HEADER
        )));
    }

    let mut entries = Vec::new();
    for line in lines {
        if line.is_empty() || line.starts_with('*') {
            continue;
        }

        let (serial, state) = match line.split_once('\t') {
            Some(parts) => parts,
            None => line.split_once(char::is_whitespace).unwrap_or((line, "")),
        };

        let state = state.trim();
        if state.is_empty() {
            return Err(AppError::ParseError(format!("row without status: {:?}", line)));
        }

        entries.push(DeviceEntry {
            id: DeviceId::new(serial.trim()),
            state: DeviceState::parse(state),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_ready_rows_count() {
        let output = "List of devices attached\n\
                      emulator-5554\tdevice\n\
                      R58M12ABCDE\tdevice\n\
                      0123456789ABCDEF\toffline\n\n";

        let entries = parse_device_list(output).unwrap();
        assert_eq!(entries.len(), 3);

        let ready: Vec<_> = entries.iter().filter(|e| e.state.is_ready()).collect();
        assert_eq!(ready.len(), 2);
        assert_eq!(ready[0].id.as_str(), "emulator-5554");
        assert_eq!(ready[1].id.as_str(), "R58M12ABCDE");
    }

    #[test]
    fn test_daemon_chatter_is_skipped() {
        let output = "* daemon not running; starting now at tcp:5037\n\
                      * daemon started successfully\n\
                      List of devices attached\n\
                      192.168.1.20:5555\tunauthorized\n";

        let entries = parse_device_list(output).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].state, DeviceState::Unauthorized);
        assert!(!entries[0].state.is_ready());
    }

    #[test]
    fn test_no_permissions_state() {
        let output = "List of devices attached\n\
                      ZY22 no permissions (missing udev rules? user is in the plugdev group)\n";

        let entries = parse_device_list(output).unwrap();
        assert_eq!(entries[0].id.as_str(), "ZY22");
        assert_eq!(entries[0].state, DeviceState::NoPermissions);
    }

    #[test]
    fn test_empty_list() {
        let entries = parse_device_list("List of devices attached\n\n").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_missing_header() {
        let err = parse_device_list("error: protocol fault\n").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_row_without_status() {
        let err = parse_device_list("List of devices attached\nemulator-5554\n").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_failure_detail() {
        let output = CommandOutput {
            stdout: String::new(),
            stderr: "error: device offline\n".to_string(),
            exit_code: Some(1),
        };
        assert!(!output.success());
        assert_eq!(output.failure_detail(), "exit code 1: error: device offline");
    }
}
