use alloc::sync::Arc;
use core::time::Duration;

use crate::{Result, SessionId, WriteError};

use super::{WriteFuture, WriteFutureListener};

static UNUSED_WRITE_FUTURE: UnusedWriteFuture = UnusedWriteFuture { _private: () };

const NO_INTEREST: &str = "the write request declared no interest in completion";

/// 调用方未提供写完成凭证时使用的共享兜底实例。
///
/// # 契约说明（What）
/// - 阻塞与轮询接口退化为“视为已完成”：`join` 立即返回，`join_timeout` 恒为 `true`，
///   `is_ready` 恒为 `true`；
/// - `is_written` 恒为 `false`，`set_written` 被接受并丢弃，`session` 恒为 `None`；
/// - `add_listener`/`remove_listener` 返回 [`WriteError::InvalidOperation`]：
///   静默丢弃监听器会让显式请求通知的调用方永远等不到回调，因此直接拒绝。
///
/// # 实现要点（How）
/// - 零尺寸、无状态、不可变；整个进程只存在 [`UnusedWriteFuture::shared`] 返回的一个实例。
#[derive(Debug)]
pub struct UnusedWriteFuture {
    _private: (),
}

impl UnusedWriteFuture {
    /// 返回进程级单例。
    pub fn shared() -> &'static UnusedWriteFuture {
        &UNUSED_WRITE_FUTURE
    }
}

impl WriteFuture for UnusedWriteFuture {
    fn is_written(&self) -> bool {
        false
    }

    fn set_written(&self, _written: bool) {}

    fn session(&self) -> Option<SessionId> {
        None
    }

    fn join(&self) {}

    fn join_timeout(&self, _timeout: Duration) -> bool {
        true
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn add_listener(&self, _listener: Arc<dyn WriteFutureListener>) -> Result<()> {
        Err(WriteError::InvalidOperation {
            operation: "add_listener",
            reason: NO_INTEREST,
        })
    }

    fn remove_listener(&self, _listener: &Arc<dyn WriteFutureListener>) -> Result<()> {
        Err(WriteError::InvalidOperation {
            operation: "remove_listener",
            reason: NO_INTEREST,
        })
    }
}
