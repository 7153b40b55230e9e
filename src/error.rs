use std::time::Duration;
use thiserror::Error;

/// 应用程序统一错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 找不到设备桥接程序 (adb)
    #[error("找不到设备桥接程序: {0}")]
    BridgeNotFound(String),

    /// 有界调用超过了截止时间
    #[error("`{command}` 超时 ({}ms)", .after.as_millis())]
    Timeout { command: String, after: Duration },

    /// 子命令启动失败或返回非零退出码
    #[error("执行错误: {0}")]
    ExecutionError(String),

    /// 设备枚举输出格式异常
    #[error("设备列表输出异常: {0}")]
    ParseError(String),
}

/// AppError 的 Result 类型别名
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = AppError::Timeout {
            command: "adb devices".to_string(),
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "`adb devices` 超时 (1500ms)");
    }

    #[test]
    fn test_bridge_not_found_keeps_detail() {
        let err = AppError::BridgeNotFound("adb: No such file or directory".to_string());
        assert_eq!(err.to_string(), "找不到设备桥接程序: adb: No such file or directory");
    }
}
