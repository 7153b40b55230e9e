use anyhow::{bail, Context};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use adb_provision::logger::is_failure_line;
use adb_provision::{AdbBridge, EventSender, Monitor, MonitorObserver, ProvisionConfig};

const DEFAULT_CONFIG_PATH: &str = "provision.toml";

/// 未设置 RUST_LOG 时的过滤规则
///
/// 设备事件行已经由控制台输出到 stdout，stderr 上的 tracing 只保留警告和错误。
const DEFAULT_LOG_DIRECTIVE: &str = "adb_provision=warn";

/// 失败行红色加粗，其余绿色
fn render_line(ts: &str, message: &str) -> String {
    if is_failure_line(message) {
        format!("[{}] \x1b[1;31m{}\x1b[0m", ts, message)
    } else {
        format!("[{}] \x1b[32m{}\x1b[0m", ts, message)
    }
}

/// 控制台协作者：接收时打时间戳，失败行高亮
#[derive(Default)]
struct Console {
    device_count: Option<usize>,
}

impl Console {
    /// 只在数量变化时返回要输出的行
    fn count_line(&mut self, count: usize) -> Option<String> {
        if self.device_count == Some(count) {
            return None;
        }
        self.device_count = Some(count);
        Some(format!("Devices: {}", count))
    }
}

impl MonitorObserver for Console {
    fn on_log(&mut self, message: &str) {
        let ts = chrono::Local::now().format("%H:%M:%S").to_string();
        println!("{}", render_line(&ts, message));
    }

    fn on_device_count(&mut self, count: usize) {
        if let Some(line) = self.count_line(count) {
            println!("{}", line);
        }
    }
}

fn config_path() -> String {
    std::env::var("ADB_PROVISION_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

fn load_config() -> anyhow::Result<ProvisionConfig> {
    let path = config_path();
    let config = if Path::new(&path).exists() {
        info!("加载配置: {}", path);
        ProvisionConfig::from_file_with_env(&path)
            .with_context(|| format!("failed to load {}", path))?
    } else {
        let mut config = ProvisionConfig::default();
        config.apply_env()?;
        config
    };

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统，tracing 输出到 stderr，事件行输出到 stdout
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => {}
        Some("init-config") => {
            let path = args.next().unwrap_or_else(config_path);
            ProvisionConfig::default()
                .save_to_file(&path)
                .with_context(|| format!("failed to write {}", path))?;
            println!("Default config written to {}", path);
            return Ok(());
        }
        Some(other) => bail!("unknown command: {} (expected `init-config [path]`)", other),
    }

    let config = load_config()?;
    let bridge = AdbBridge::from_config(&config.bridge);
    info!("使用 adb: {}", bridge.executable().display());

    let (events, mut rx) = EventSender::channel();
    let consumer = tokio::spawn(async move {
        let mut console = Console::default();
        while let Some(event) = rx.recv().await {
            event.deliver(&mut console);
        }
    });

    let mut monitor = Monitor::new(
        Arc::new(bridge),
        config.bridge.clone(),
        config.provisioning.clone(),
        events,
    );
    monitor.start(config.monitor.clone())?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    let report = monitor.stop().await?;
    if !report.is_clean() {
        warn!("{} 条流水线在宽限期后仍在运行，随进程退出", report.stragglers);
    }

    // 后台流水线仍持有发送端，只给控制台一点时间输出剩余事件
    drop(monitor);
    let _ = tokio::time::timeout(Duration::from_millis(200), consumer).await;
    Ok(())
}
