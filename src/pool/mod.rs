//! 有界并发线程池
//!
//! 最多同时运行 N 个配置流水线，多余的任务按 FIFO 排队

mod types;
mod worker_pool;

pub use types::{PoolError, ShutdownReport};
pub use worker_pool::{PoolTask, WorkerPool};
