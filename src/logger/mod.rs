mod events;

pub use events::{
    is_failure_line, DeviceCountEvent, EventReceiver, EventSender, LogEvent, MonitorEvent,
    MonitorObserver,
};

/// 设备日志记录器
///
/// 每行日志既作为 `LogEvent` 发给协作者，也写入 tracing（带 device 字段）。
#[derive(Clone)]
pub struct DeviceLogger {
    device_serial: String,
    events: EventSender,
}

impl DeviceLogger {
    /// 为指定设备创建一个新的日志记录器
    pub fn new(device_serial: &str, events: EventSender) -> Self {
        DeviceLogger {
            device_serial: device_serial.to_string(),
            events,
        }
    }

    /// 记录 INFO 级别日志
    pub fn info(&self, message: &str) {
        tracing::info!(device = %self.device_serial, "{}", message);
        self.events.log(message);
    }

    /// 记录 WARN 级别日志
    pub fn warn(&self, message: &str) {
        tracing::warn!(device = %self.device_serial, "{}", message);
        self.events.log(message);
    }

    /// 记录 ERROR 级别日志
    pub fn error(&self, message: &str) {
        tracing::error!(device = %self.device_serial, "{}", message);
        self.events.log(message);
    }

    /// 记录 DEBUG 级别日志，只进 tracing，不发给协作者
    pub fn debug(&self, message: &str) {
        tracing::debug!(device = %self.device_serial, "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_debug_is_not_forwarded() {
        let (events, mut rx) = EventSender::channel();
        let logger = DeviceLogger::new("emulator-5554", events);

        logger.debug("getprop sys.boot_completed");
        logger.info("[+] Processing emulator-5554");
        logger.error("[!] emulator-5554 boot timeout");
        drop(logger);

        let mut messages = Vec::new();
        while let Some(event) = rx.recv().await {
            if let MonitorEvent::Log(log) = event {
                messages.push(log.message);
            }
        }

        assert_eq!(
            messages,
            vec![
                "[+] Processing emulator-5554".to_string(),
                "[!] emulator-5554 boot timeout".to_string(),
            ]
        );
    }
}
