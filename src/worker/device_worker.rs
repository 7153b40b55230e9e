use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

use crate::bridge::{DeviceBridge, DeviceId};
use crate::config::{BridgeConfig, ProvisioningPlan};
use crate::logger::{DeviceLogger, EventSender};

/// 单台设备的流水线状态，只会向前推进
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    WaitReady,
    Wake,
    Apply { index: usize, total: usize },
    Done,
    Failed { reason: String },
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::WaitReady => write!(f, "wait-ready"),
            WorkerState::Wake => write!(f, "wake"),
            WorkerState::Apply { index, total } => write!(f, "apply {}/{}", index + 1, total),
            WorkerState::Done => write!(f, "done"),
            WorkerState::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// 流水线结果，线程池不消费它
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// 所有命令都尝试过一次
    Done { failed_commands: usize },
    /// 开机检查未通过，没有执行任何配置命令
    Failed { reason: String },
}

/// 设备 worker，每个轮询周期为每台设备新建一个
pub struct DeviceWorker {
    device: DeviceId,
    bridge: Arc<dyn DeviceBridge>,
    settings: Arc<BridgeConfig>,
    plan: Arc<ProvisioningPlan>,
    logger: DeviceLogger,
}

impl DeviceWorker {
    pub fn new(
        device: DeviceId,
        bridge: Arc<dyn DeviceBridge>,
        settings: Arc<BridgeConfig>,
        plan: Arc<ProvisioningPlan>,
        events: EventSender,
    ) -> Self {
        let logger = DeviceLogger::new(device.as_str(), events);
        Self {
            device,
            bridge,
            settings,
            plan,
            logger,
        }
    }

    /// 包装成线程池任务，结果只体现在日志事件中
    pub fn into_task(self) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let _ = self.run().await;
        })
    }

    fn enter(&self, state: &WorkerState) {
        self.logger.debug(&format!("state -> {}", state));
    }

    /// 执行流水线；所有错误都转换为日志事件，不会向外传播
    pub async fn run(&self) -> ProvisionOutcome {
        let serial = self.device.as_str();
        self.logger.info(&format!("[+] Processing {}", serial));

        // ---- 等待开机完成 ----
        self.enter(&WorkerState::WaitReady);
        match self
            .bridge
            .get_property(
                &self.device,
                &self.settings.boot_property,
                self.settings.boot_timeout(),
            )
            .await
        {
            Ok(value) if value == self.settings.boot_ready_value => {}
            Ok(value) => {
                self.logger.warn(&format!("[!] {} boot timeout", serial));
                return self.fail(format!(
                    "readiness timeout ({} = {:?})",
                    self.settings.boot_property, value
                ));
            }
            Err(e) => {
                self.logger.error(&format!("[!] Boot check failed: {}", e));
                return self.fail(format!("boot check failed: {}", e));
            }
        }

        // ---- 唤醒设备，失败不影响后续 ----
        self.enter(&WorkerState::Wake);
        match self
            .bridge
            .send_key_event(
                &self.device,
                self.settings.wake_key_code,
                self.settings.command_timeout(),
            )
            .await
        {
            Ok(output) if !output.success() => {
                self.logger.debug(&format!("wake ignored: {}", output.failure_detail()));
            }
            Ok(_) => {}
            Err(e) => self.logger.warn(&format!("[!] {} wake failed: {}", serial, e)),
        }

        // ---- 配置命令，逐条执行，单条失败不终止批次 ----
        let total = self.plan.commands.len();
        let mut failed_commands = 0;
        for (index, command) in self.plan.commands.iter().enumerate() {
            self.enter(&WorkerState::Apply { index, total });

            match self
                .bridge
                .run_command(&self.device, command, self.settings.command_timeout())
                .await
            {
                Ok(output) if output.success() => {}
                Ok(output) => {
                    failed_commands += 1;
                    self.logger.error(&format!(
                        "[!] {} command failed `{}` ({})",
                        serial,
                        command.join(" "),
                        output.failure_detail()
                    ));
                }
                Err(e) => {
                    failed_commands += 1;
                    self.logger.error(&format!(
                        "[!] {} command failed `{}`: {}",
                        serial,
                        command.join(" "),
                        e
                    ));
                }
            }
        }

        // 单条命令的失败已在上面记录，批次跑完即视为完成
        self.enter(&WorkerState::Done);
        if failed_commands > 0 {
            self.logger.debug(&format!("{}/{} commands failed", failed_commands, total));
        }
        self.logger.info(&format!("[✓] Done {}", serial));

        ProvisionOutcome::Done { failed_commands }
    }

    fn fail(&self, reason: String) -> ProvisionOutcome {
        self.enter(&WorkerState::Failed {
            reason: reason.clone(),
        });
        ProvisionOutcome::Failed { reason }
    }
}
