//! 测试用的脚本化设备桥接

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{CommandOutput, DeviceBridge, DeviceId};
use crate::error::{AppError, Result};

#[derive(Default)]
pub struct FakeBridge {
    devices: Mutex<Vec<DeviceId>>,
    list_error: Mutex<Option<String>>,
    boot_values: Mutex<HashMap<DeviceId, String>>,
    boot_error: Mutex<Option<String>>,
    failing: Mutex<Vec<Vec<String>>>,
    delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<(DeviceId, Vec<String>)>>,
    list_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeBridge {
    pub fn with_devices(serials: &[&str]) -> Self {
        let bridge = Self::default();
        bridge.set_devices(serials);
        bridge
    }

    pub fn set_devices(&self, serials: &[&str]) {
        *self.devices.lock().unwrap() = serials.iter().map(|s| DeviceId::from(*s)).collect();
    }

    pub fn fail_listing(&self, message: Option<&str>) {
        *self.list_error.lock().unwrap() = message.map(String::from);
    }

    pub fn set_boot_value(&self, serial: &str, value: &str) {
        self.boot_values
            .lock()
            .unwrap()
            .insert(DeviceId::from(serial), value.to_string());
    }

    pub fn fail_boot_check(&self, message: &str) {
        *self.boot_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_command(&self, args: &[&str]) {
        self.failing
            .lock()
            .unwrap()
            .push(args.iter().map(|s| s.to_string()).collect());
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<(DeviceId, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, serial: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|(id, _)| id.as_str() == serial)
            .map(|(_, args)| args)
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceBridge for FakeBridge {
    async fn list_devices(&self) -> Result<Vec<DeviceId>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.list_error.lock().unwrap().clone() {
            return Err(AppError::ExecutionError(message));
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn run_command(
        &self,
        device: &DeviceId,
        args: &[String],
        _timeout: Duration,
    ) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((device.clone(), args.to_vec()));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if args.len() >= 2 && args[0] == "shell" && args[1] == "getprop" {
            if let Some(message) = self.boot_error.lock().unwrap().clone() {
                return Err(AppError::ExecutionError(message));
            }
            let value = self
                .boot_values
                .lock()
                .unwrap()
                .get(device)
                .cloned()
                .unwrap_or_else(|| "1".to_string());
            return Ok(CommandOutput {
                stdout: format!("{}\n", value),
                stderr: String::new(),
                exit_code: Some(0),
            });
        }

        if self.failing.lock().unwrap().iter().any(|f| f.as_slice() == args) {
            return Ok(CommandOutput {
                stdout: String::new(),
                stderr: "Error: command failed".to_string(),
                exit_code: Some(1),
            });
        }

        Ok(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
        })
    }
}

/// 在临时目录写一个可执行的 shell 脚本，充当外部 adb 程序
#[cfg(unix)]
pub fn adb_script(body: &str) -> (std::path::PathBuf, std::path::PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let dir = std::env::temp_dir().join(format!("adb-provision-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let script = dir.join("adb");
    std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    (dir, script)
}

/// 三行设备列表：两台就绪，一台离线
#[cfg(unix)]
pub const MIXED_DEVICE_TABLE: &str = "printf 'List of devices attached\\nemulator-5554\\tdevice\\nR58M12ABCDE\\tdevice\\n0123456789ABCDEF\\toffline\\n\\n'";
