//! Mock 开关设备

use crate::error::HalError;
use crate::tools::Switchable;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Mock 开关设备（泵或激光器）
///
/// 记录开/关调用次数，`turn_off` 总是成功。
#[derive(Debug)]
pub struct MockSwitch {
    name: String,
    on: AtomicBool,
    on_calls: AtomicUsize,
    off_calls: AtomicUsize,
    fail_on: AtomicBool,
}

impl MockSwitch {
    pub fn new(name: impl Into<String>) -> Self {
        MockSwitch {
            name: name.into(),
            on: AtomicBool::new(false),
            on_calls: AtomicUsize::new(0),
            off_calls: AtomicUsize::new(0),
            fail_on: AtomicBool::new(false),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    pub fn on_count(&self) -> usize {
        self.on_calls.load(Ordering::SeqCst)
    }

    pub fn off_count(&self) -> usize {
        self.off_calls.load(Ordering::SeqCst)
    }

    /// 之后的 `turn_on` 全部失败
    pub fn fail_turn_on(&self) {
        self.fail_on.store(true, Ordering::SeqCst);
    }
}

impl Switchable for MockSwitch {
    fn name(&self) -> &str {
        &self.name
    }

    fn turn_on(&self) -> Result<(), HalError> {
        self.on_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.load(Ordering::SeqCst) {
            return Err(HalError::device(&self.name, "injected turn-on failure"));
        }
        self.on.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn turn_off(&self) -> Result<(), HalError> {
        self.off_calls.fetch_add(1, Ordering::SeqCst);
        self.on.store(false, Ordering::SeqCst);
        Ok(())
    }
}
