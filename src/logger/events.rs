//! 面向外部协作者（UI/控制台）的事件

use tokio::sync::mpsc;

/// 一行自由文本日志，时间戳由消费方在接收时打上
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub message: String,
}

/// 最近一次设备枚举的数量，只有最新值有意义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCountEvent {
    pub count: usize,
}

/// 监控事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    Log(LogEvent),
    DeviceCount(DeviceCountEvent),
}

impl MonitorEvent {
    /// 把事件分发给观察者
    pub fn deliver<O: MonitorObserver + ?Sized>(self, observer: &mut O) {
        match self {
            MonitorEvent::Log(event) => observer.on_log(&event.message),
            MonitorEvent::DeviceCount(event) => observer.on_device_count(event.count),
        }
    }
}

/// 协作者接口
pub trait MonitorObserver {
    fn on_log(&mut self, message: &str);
    fn on_device_count(&mut self, count: usize);
}

/// 事件发送端，可在多个流水线之间克隆
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<MonitorEvent>,
}

/// 单消费者的事件接收端
pub type EventReceiver = mpsc::UnboundedReceiver<MonitorEvent>;

impl EventSender {
    pub fn channel() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn log(&self, message: impl Into<String>) {
        // 接收端已关闭时丢弃
        let _ = self.tx.send(MonitorEvent::Log(LogEvent {
            message: message.into(),
        }));
    }

    pub fn device_count(&self, count: usize) {
        let _ = self.tx.send(MonitorEvent::DeviceCount(DeviceCountEvent { count }));
    }
}

/// 判断日志行是否为失败行，供消费方高亮
pub fn is_failure_line(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["!", "error", "failed", "timeout"]
        .iter()
        .any(|marker| lower.contains(marker))
}
