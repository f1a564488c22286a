//! 用户提示与确认 - 业务能力层
//!
//! 流程层只通过这两个接口和"人"打交道：
//! - [`Notifier`]：短暂提示（toast）
//! - [`Confirmer`]：危险操作前的确认

use async_trait::async_trait;
use std::sync::Mutex;
use tracing::{error, info, warn};

/// 提示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// 一条提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// 短暂提示
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// 把提示写入日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!("✅ {}", notice.message),
            NoticeLevel::Warning => warn!("⚠️ {}", notice.message),
            NoticeLevel::Error => error!("❌ {}", notice.message),
        }
    }
}

/// 把提示保存在内存中，供调用方稍后读取
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取出并清空已有提示
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notice);
    }
}

/// 危险操作前的确认
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// 固定回答的确认器（无人值守运行时使用）
#[derive(Debug, Clone, Copy)]
pub struct StaticConfirmer {
    answer: bool,
}

impl StaticConfirmer {
    pub fn always_yes() -> Self {
        Self { answer: true }
    }

    pub fn always_no() -> Self {
        Self { answer: false }
    }
}

#[async_trait]
impl Confirmer for StaticConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        info!("❓ {} -> {}", prompt, if self.answer { "确认" } else { "取消" });
        self.answer
    }
}
