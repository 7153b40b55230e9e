//! 线程池实现
//!
//! 每个活跃槽位对应一个 tokio 任务：执行完当前任务后从队列头部取下一个，
//! 队列为空时释放槽位。

use super::types::{PoolError, ShutdownReport};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// 线程池任务
pub type PoolTask = BoxFuture<'static, ()>;

struct PoolState {
    accepting: bool,
    active: usize,
    queue: VecDeque<PoolTask>,
}

struct Inner {
    max_concurrency: usize,
    state: Mutex<PoolState>,
    /// 活跃数降为 0 时通知
    idle: Notify,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 当前任务结束：返回下一个排队任务，或者释放槽位
    fn finish_one(&self) -> Option<PoolTask> {
        let mut state = self.lock_state();
        if state.accepting {
            if let Some(task) = state.queue.pop_front() {
                return Some(task);
            }
        }

        state.active -= 1;
        let idle = state.active == 0;
        drop(state);

        if idle {
            self.idle.notify_waiters();
        }
        None
    }
}

/// 有界并发线程池，可克隆共享
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<Inner>,
}

impl WorkerPool {
    /// 创建线程池，并发上限在整个生命周期内不可变
    pub fn new(max_concurrency: usize) -> Result<Self, PoolError> {
        if max_concurrency == 0 {
            return Err(PoolError::ZeroConcurrency);
        }

        Ok(Self {
            inner: Arc::new(Inner {
                max_concurrency,
                state: Mutex::new(PoolState {
                    accepting: true,
                    active: 0,
                    queue: VecDeque::new(),
                }),
                idle: Notify::new(),
            }),
        })
    }

    pub fn max_concurrency(&self) -> usize {
        self.inner.max_concurrency
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock_state().active
    }

    pub fn queued_count(&self) -> usize {
        self.inner.lock_state().queue.len()
    }

    pub fn is_accepting(&self) -> bool {
        self.inner.lock_state().accepting
    }

    /// 提交任务：有空闲槽位时立即开始，否则进入 FIFO 队列
    pub fn submit(&self, task: PoolTask) -> Result<(), PoolError> {
        let mut state = self.inner.lock_state();
        if !state.accepting {
            return Err(PoolError::ShutDown);
        }

        if state.active < self.inner.max_concurrency {
            state.active += 1;
            drop(state);
            self.spawn_slot(task);
        } else {
            state.queue.push_back(task);
            debug!("任务已排队，队列长度: {}", state.queue.len());
        }

        Ok(())
    }

    fn spawn_slot(&self, first: PoolTask) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut next = Some(first);
            while let Some(task) = next {
                // panic 的任务同样归还槽位
                if AssertUnwindSafe(task).catch_unwind().await.is_err() {
                    warn!("线程池任务 panic");
                }
                next = inner.finish_one();
            }
        });
    }

    /// 停止接收新任务，丢弃排队任务，最多等待 `grace` 让活跃任务结束
    ///
    /// 超时后直接返回，仍在运行的任务在后台自行完成，不再被跟踪。
    pub async fn shutdown(&self, grace: Duration) -> ShutdownReport {
        let dropped = {
            let mut state = self.inner.lock_state();
            state.accepting = false;
            std::mem::take(&mut state.queue)
        };
        let discarded = dropped.len();
        drop(dropped);

        let wait_idle = async {
            loop {
                let notified = self.inner.idle.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if self.active_count() == 0 {
                    break;
                }
                notified.await;
            }
        };

        if tokio::time::timeout(grace, wait_idle).await.is_err() {
            warn!("线程池宽限期 {:?} 已到，仍有任务运行", grace);
        }

        let report = ShutdownReport {
            discarded,
            stragglers: self.active_count(),
        };
        info!(
            "线程池已关闭: 丢弃 {} 个排队任务, {} 个任务仍在后台运行",
            report.discarded, report.stragglers
        );
        report
    }
}
