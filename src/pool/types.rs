//! 线程池相关的类型定义

/// 线程池错误
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("线程池已关闭")]
    ShutDown,

    #[error("最大并发数至少为 1")]
    ZeroConcurrency,
}

/// 一次 shutdown 的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// 被丢弃的排队任务数
    pub discarded: usize,
    /// 宽限期结束时仍在运行、此后不再跟踪的任务数
    pub stragglers: usize,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.stragglers == 0
    }
}
