//! 监控循环相关的类型定义

use crate::config::ConfigError;
use crate::pool::PoolError;
use std::fmt;

/// 监控状态机：Stopped → Running → Stopping → Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
    Stopping,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorState::Stopped => write!(f, "stopped"),
            MonitorState::Running => write!(f, "running"),
            MonitorState::Stopping => write!(f, "stopping"),
        }
    }
}

/// 监控错误
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("监控器处于 {state} 状态，无法 {action}")]
    InvalidTransition {
        state: MonitorState,
        action: &'static str,
    },

    #[error("监控配置无效: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("线程池错误: {0}")]
    Pool(#[from] PoolError),
}
