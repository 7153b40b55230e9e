use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::types::{MonitorError, MonitorState};
use crate::bridge::DeviceBridge;
use crate::config::{BridgeConfig, MonitorConfig, ProvisioningPlan};
use crate::logger::EventSender;
use crate::pool::{PoolError, ShutdownReport, WorkerPool};
use crate::worker::DeviceWorker;

/// 一次运行（start 到 stop 之间）持有的资源
struct MonitorRun {
    run_id: Uuid,
    config: MonitorConfig,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    pool: WorkerPool,
}

/// 设备监控器
///
/// 丢弃 `Monitor` 会关闭停止信号，轮询循环随之退出；已开始的流水线在后台跑完。
pub struct Monitor {
    bridge: Arc<dyn DeviceBridge>,
    settings: Arc<BridgeConfig>,
    plan: Arc<ProvisioningPlan>,
    events: EventSender,
    state: MonitorState,
    run: Option<MonitorRun>,
}

impl Monitor {
    pub fn new(
        bridge: Arc<dyn DeviceBridge>,
        settings: BridgeConfig,
        plan: ProvisioningPlan,
        events: EventSender,
    ) -> Self {
        Self {
            bridge,
            settings: Arc::new(settings),
            plan: Arc::new(plan),
            events,
            state: MonitorState::Stopped,
            run: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// 启动轮询，只能在 Stopped 状态调用
    pub fn start(&mut self, config: MonitorConfig) -> Result<(), MonitorError> {
        if self.state != MonitorState::Stopped {
            return Err(MonitorError::InvalidTransition {
                state: self.state,
                action: "start",
            });
        }
        config.validate()?;

        let pool = WorkerPool::new(config.max_concurrent_devices)?;
        debug!("线程池并发上限: {}", pool.max_concurrency());
        let (stop_tx, stop_rx) = watch::channel(false);
        let run_id = Uuid::new_v4();

        let poller = Poller {
            bridge: Arc::clone(&self.bridge),
            settings: Arc::clone(&self.settings),
            plan: Arc::clone(&self.plan),
            events: self.events.clone(),
            pool: pool.clone(),
            config: config.clone(),
            stop_rx,
        };

        info!(%run_id, "启动设备监控 (最大并发 {})", config.max_concurrent_devices);
        self.events.log(format!(
            "Monitoring started (max {} devices)",
            config.max_concurrent_devices
        ));

        let handle = tokio::spawn(
            poller
                .run()
                .instrument(info_span!("monitor", run_id = %run_id)),
        );

        self.run = Some(MonitorRun {
            run_id,
            config,
            stop_tx,
            handle,
            pool,
        });
        self.state = MonitorState::Running;
        Ok(())
    }

    /// 停止轮询并关闭线程池
    ///
    /// 已停止时为空操作。最多等待 `shutdown_grace_ms`，之后不再跟踪仍在运行的流水线。
    pub async fn stop(&mut self) -> Result<ShutdownReport, MonitorError> {
        let Some(run) = self.run.take() else {
            self.state = MonitorState::Stopped;
            return Ok(ShutdownReport::default());
        };

        self.state = MonitorState::Stopping;
        let deadline = Instant::now() + run.config.shutdown_grace();

        // 先停循环，之后不会再有新的提交
        let _ = run.stop_tx.send(true);
        let mut handle = run.handle;
        if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
            warn!(run_id = %run.run_id, "轮询循环未在宽限期内退出，强制中止");
            handle.abort();
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        let report = run.pool.shutdown(remaining).await;

        self.state = MonitorState::Stopped;
        info!(run_id = %run.run_id, "设备监控已停止");
        self.events.log("Provisioning stopped");
        Ok(report)
    }
}

/// 在监控任务中运行的轮询循环
struct Poller {
    bridge: Arc<dyn DeviceBridge>,
    settings: Arc<BridgeConfig>,
    plan: Arc<ProvisioningPlan>,
    events: EventSender,
    pool: WorkerPool,
    config: MonitorConfig,
    stop_rx: watch::Receiver<bool>,
}

/// 收到停止信号或发送端被丢弃时返回
async fn stop_requested(stop_rx: &mut watch::Receiver<bool>) {
    let _ = stop_rx.wait_for(|stop| *stop).await;
}

impl Poller {
    async fn run(mut self) {
        loop {
            let listed = tokio::select! {
                _ = stop_requested(&mut self.stop_rx) => break,
                listed = self.bridge.list_devices() => listed,
            };

            let pause = match listed {
                Ok(devices) => {
                    self.events.device_count(devices.len());
                    debug!("发现 {} 台设备", devices.len());

                    for device in devices {
                        if *self.stop_rx.borrow() {
                            break;
                        }

                        let worker = DeviceWorker::new(
                            device,
                            Arc::clone(&self.bridge),
                            Arc::clone(&self.settings),
                            Arc::clone(&self.plan),
                            self.events.clone(),
                        );
                        if let Err(PoolError::ShutDown) = self.pool.submit(worker.into_task()) {
                            break;
                        }
                    }
                    self.config.poll_interval()
                }
                Err(e) => {
                    warn!("设备枚举失败: {}", e);
                    self.events.log(format!("[!] Poll error: {}", e));
                    self.events.device_count(0);
                    self.config.poll_error_backoff()
                }
            };

            tokio::select! {
                _ = stop_requested(&mut self.stop_rx) => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        debug!(
            "轮询循环退出 (活跃 {}, 排队 {})",
            self.pool.active_count(),
            self.pool.queued_count()
        );
    }
}
