//! 写完成凭证（WriteFuture）契约。
//!
//! ## 设计目标（Why）
//! - 一次写操作的结果需要被任意数量的观察者获知：写线程负责解析，其它线程或任务可以阻塞等待、
//!   非阻塞轮询或注册监听器；
//! - 调用方若声明“不关心写完成”，仍需拿到统一的非空句柄，但不应为此分配真实的同步状态。
//!
//! ## 契约说明（What）
//! - [`WriteFuture`] 是能力集本身，恰有两类实现：共享兜底的 [`UnusedWriteFuture`] 与 `std` 下的
//!   [`DefaultWriteFuture`]；
//! - [`WriteFutureHandle`] 是写请求中保存的句柄，`Unused` 分支不分配内存，解引用到进程级单例；
//! - [`WriteFutureListener`] 在解析时恰好被调用一次，参数为被解析的凭证本身。
//!
//! ## 状态机（How）
//! - 真实凭证：`Pending → Resolved(outcome)`，`Resolved` 为终态；
//! - 首次 `set_written` 生效，后续调用为空操作（不会覆盖结果、不会重复触发监听器）。

use alloc::sync::Arc;
use core::{fmt, ops::Deref, time::Duration};

use crate::{Result, SessionId};

#[cfg(feature = "std")]
mod default;
#[cfg(feature = "std")]
mod sync;
mod unused;

#[cfg(feature = "std")]
pub use default::{DefaultWriteFuture, WriteCompletion};
pub use unused::UnusedWriteFuture;

/// 单次写操作的异步结果句柄。
///
/// # 契约维度速览
/// - **语义**：`is_written` 在未解析时返回 `false`，不区分“待定”与“失败”；需要区分时请使用
///   `is_ready` 或阻塞等待；
/// - **并发**：`join`/`join_timeout` 只挂起调用线程，不阻塞解析方；`is_written`/`is_ready` 永不阻塞；
/// - **超时**：`join_timeout(Duration::ZERO)` 仅检查一次，不阻塞；超时通过返回 `false` 表达而非错误；
/// - **监听器**：解析后注册的监听器在 `add_listener` 内同步触发；解析前注册的监听器按注册顺序在
///   `set_written` 时触发；
/// - **取消**：本契约不提供取消；不再关心结果的调用方停止等待并可选地移除监听器即可。
pub trait WriteFuture: Send + Sync + fmt::Debug {
    /// 返回当前写结果；未解析时为 `false`。
    fn is_written(&self) -> bool;

    /// 解析凭证。首次调用生效，重复调用被忽略。
    fn set_written(&self, written: bool);

    /// 所属会话身份；兜底实例恒为 `None`。
    fn session(&self) -> Option<SessionId>;

    /// 阻塞直到凭证被解析，无超时。
    fn join(&self);

    /// 至多阻塞 `timeout`；在窗口内（包括调用前已解析）完成返回 `true`，超时返回 `false`。
    fn join_timeout(&self, timeout: Duration) -> bool;

    /// 非阻塞轮询：当且仅当已解析时返回 `true`。
    fn is_ready(&self) -> bool;

    /// 注册监听器，保证恰好调用一次。
    ///
    /// # 错误
    /// - 兜底实例返回 [`WriteError::InvalidOperation`](crate::WriteError::InvalidOperation)。
    fn add_listener(&self, listener: Arc<dyn WriteFutureListener>) -> Result<()>;

    /// 按 `Arc` 指针身份移除监听器；未注册或已触发的监听器视为空操作。
    ///
    /// # 错误
    /// - 兜底实例返回 [`WriteError::InvalidOperation`](crate::WriteError::InvalidOperation)。
    fn remove_listener(&self, listener: &Arc<dyn WriteFutureListener>) -> Result<()>;
}

/// 写完成监听器。
///
/// 闭包 `Fn(&dyn WriteFuture) + Send + Sync` 自动实现本 trait。
pub trait WriteFutureListener: Send + Sync {
    /// 凭证解析时调用，`future` 即被解析的凭证，此时 `future.is_ready()` 恒为 `true`。
    fn operation_complete(&self, future: &dyn WriteFuture);
}

impl<F> WriteFutureListener for F
where
    F: Fn(&dyn WriteFuture) + Send + Sync,
{
    fn operation_complete(&self, future: &dyn WriteFuture) {
        self(future)
    }
}

/// 判断两个监听器引用是否指向同一实例（忽略 vtable，仅比较数据指针）。
#[cfg(feature = "std")]
pub(crate) fn same_listener(
    left: &Arc<dyn WriteFutureListener>,
    right: &Arc<dyn WriteFutureListener>,
) -> bool {
    core::ptr::eq(
        Arc::as_ptr(left) as *const (),
        Arc::as_ptr(right) as *const (),
    )
}

/// 写请求中保存的写完成凭证句柄，永不为空。
///
/// # 契约说明（What）
/// - `Unused`：调用方声明不关心写完成，解引用到 [`UnusedWriteFuture::shared`] 返回的进程级单例，
///   不产生任何分配；
/// - `Tracked`：共享真实凭证，克隆句柄即共享同一结果。
///
/// # 使用方式（How）
/// - 通过 `Deref<Target = dyn WriteFuture>` 直接调用 `is_ready`、`join` 等方法；
/// - `From<Option<Arc<dyn WriteFuture>>>` 将 `None` 映射为 `Unused`，对应“未提供凭证”的构造路径。
#[derive(Clone, Default)]
pub enum WriteFutureHandle {
    /// 共享兜底凭证。
    #[default]
    Unused,
    /// 真实凭证。
    Tracked(Arc<dyn WriteFuture>),
}

impl WriteFutureHandle {
    /// 返回指向共享兜底凭证的句柄。
    pub const fn unused() -> Self {
        Self::Unused
    }

    /// 包装一个真实凭证。
    pub fn tracked<F>(future: Arc<F>) -> Self
    where
        F: WriteFuture + 'static,
    {
        Self::Tracked(future)
    }

    /// 是否为共享兜底凭证。
    pub fn is_unused(&self) -> bool {
        matches!(self, Self::Unused)
    }

    /// 以 trait 对象形式借出凭证。
    pub fn as_future(&self) -> &(dyn WriteFuture + 'static) {
        match self {
            Self::Unused => UnusedWriteFuture::shared(),
            Self::Tracked(future) => future.as_ref(),
        }
    }

    /// 真实凭证的共享引用；兜底凭证返回 `None`。
    pub fn as_tracked(&self) -> Option<&Arc<dyn WriteFuture>> {
        match self {
            Self::Unused => None,
            Self::Tracked(future) => Some(future),
        }
    }
}

impl Deref for WriteFutureHandle {
    type Target = dyn WriteFuture;

    fn deref(&self) -> &Self::Target {
        self.as_future()
    }
}

impl fmt::Debug for WriteFutureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unused => f.write_str("WriteFutureHandle::Unused"),
            Self::Tracked(future) => f
                .debug_tuple("WriteFutureHandle::Tracked")
                .field(future)
                .finish(),
        }
    }
}

impl From<Arc<dyn WriteFuture>> for WriteFutureHandle {
    fn from(future: Arc<dyn WriteFuture>) -> Self {
        Self::Tracked(future)
    }
}

impl From<Option<Arc<dyn WriteFuture>>> for WriteFutureHandle {
    fn from(future: Option<Arc<dyn WriteFuture>>) -> Self {
        future.map_or(Self::Unused, Self::Tracked)
    }
}

#[cfg(feature = "std")]
impl From<Arc<DefaultWriteFuture>> for WriteFutureHandle {
    fn from(future: Arc<DefaultWriteFuture>) -> Self {
        Self::Tracked(future)
    }
}
