//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义写请求构造与写完成凭证操作的错误语义；
//! - 超时不属于错误：有界等待通过 `bool` 返回值告知调用方。
//!
//! ## 设计要求（What）
//! - 启用 `std` 时派生 `thiserror::Error`，与生态的 `std::error::Error` 兼容；
//! - `no_std` 下手写 `Display`，保持同一套文案；
//! - 变体仅携带 `&'static str` 上下文，失败路径不产生堆分配。

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(feature = "std")]
use thiserror::Error;

/// 写路径错误域。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - 构造期错误（`InvalidArgument`）同步返回给调用方，不存在延迟的异步错误通道；
///   - `InvalidOperation` 仅由共享的 [`UnusedWriteFuture`](crate::UnusedWriteFuture) 在注册/移除监听器时产生；
///   - 所有变体均为 `Send + Sync + 'static`，可安全跨线程传播。
/// - **执行逻辑 (How)**：[`WriteError::code`] 为每个变体提供稳定错误码，便于日志与指标打标签。
#[cfg_attr(feature = "std", derive(Error))]
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum WriteError {
    /// 构造写请求时缺少必填参数。
    ///
    /// - **契约 (What)**：`argument` 为缺失参数名，目前仅可能是 `"message"`；
    /// - **风险 (Trade-offs)**：属于编程错误，调用方不应重试。
    #[cfg_attr(feature = "std", error("write request argument `{argument}` is required"))]
    InvalidArgument { argument: &'static str },

    /// 在不支持该操作的写完成凭证上调用了观测接口。
    ///
    /// - **契约 (What)**：`operation` 为被拒绝的方法名，`reason` 为人类可读说明。
    #[cfg_attr(
        feature = "std",
        error("invalid write future operation `{operation}`: {reason}")
    )]
    InvalidOperation {
        operation: &'static str,
        reason: &'static str,
    },
}

impl WriteError {
    /// 返回稳定错误码，形如 `write.<域>.<类别>`。
    pub fn code(&self) -> &'static str {
        match self {
            WriteError::InvalidArgument { .. } => "write.request.invalid_argument",
            WriteError::InvalidOperation { .. } => "write.future.invalid_operation",
        }
    }
}

#[cfg(not(feature = "std"))]
impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::InvalidArgument { argument } => {
                write!(f, "write request argument `{argument}` is required")
            }
            WriteError::InvalidOperation { operation, reason } => {
                write!(f, "invalid write future operation `{operation}`: {reason}")
            }
        }
    }
}
