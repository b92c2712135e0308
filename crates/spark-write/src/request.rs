//! 写请求值对象。
//!
//! ## 契约说明（What）
//! - [`WriteRequest`] 在构造后不可变：消息、写完成凭证与可选目标地址一次绑定，交由写调度器消费；
//! - 未提供凭证时落到共享的 [`UnusedWriteFuture`](crate::UnusedWriteFuture)，保证凭证永不为空；
//! - 目标地址为 `None` 表示“使用会话默认目标”；不支持逐次改写目标的传输可以静默忽略该字段；
//! - `Display` 直接委托给消息本身，日志链路无需了解具体消息类型即可打印请求。
//!
//! ## 构造路径（How）
//! - 消息在类型层面必填，[`WriteRequest::new`] 等构造函数不会失败；
//! - 当消息来自可选来源（例如编解码器的中间结果）时，使用 [`WriteRequestBuilder`]，
//!   缺少消息会以 [`WriteError::InvalidArgument`] 同步返回，与凭证、目标地址的取值无关。

use core::{fmt, net::SocketAddr};

use crate::{Result, WriteError, WriteFutureHandle};

/// 一次待写出的消息及其写完成凭证。
///
/// `A` 为目标地址类型，由传输层决定，默认使用 [`SocketAddr`]；
/// [`WriteRequest::new`] 与 [`WriteRequest::with_future`] 仅针对默认地址类型提供。
#[derive(Clone)]
pub struct WriteRequest<M, A = SocketAddr> {
    message: M,
    future: WriteFutureHandle,
    destination: Option<A>,
}

impl<M> WriteRequest<M> {
    /// 仅携带消息，凭证为共享兜底实例，目标地址为会话默认值。
    pub fn new(message: M) -> Self {
        Self::with_destination(message, WriteFutureHandle::Unused, None)
    }

    /// 携带消息与写完成凭证；传入 `Option::<Arc<dyn WriteFuture>>::None` 等价于 [`WriteRequest::new`]。
    pub fn with_future(message: M, future: impl Into<WriteFutureHandle>) -> Self {
        Self::with_destination(message, future, None)
    }

    /// 返回构造器，用于消息来源可能缺失的场景。
    ///
    /// 自定义地址类型请使用 `WriteRequestBuilder::<M, A>::new()`。
    pub fn builder() -> WriteRequestBuilder<M> {
        WriteRequestBuilder::new()
    }
}

impl<M, A> WriteRequest<M, A> {
    /// 完整构造：消息、凭证与可选目标地址。
    pub fn with_destination(
        message: M,
        future: impl Into<WriteFutureHandle>,
        destination: Option<A>,
    ) -> Self {
        Self {
            message,
            future: future.into(),
            destination,
        }
    }

    /// 写完成凭证，永不为空。
    pub fn future(&self) -> &WriteFutureHandle {
        &self.future
    }

    /// 待写出的消息，即构造时传入的同一对象。
    pub fn message(&self) -> &M {
        &self.message
    }

    /// 目标地址；`None` 表示使用会话默认目标。
    pub fn destination(&self) -> Option<&A> {
        self.destination.as_ref()
    }

    /// 拆分为消息、凭证与目标地址，供调度器按值接管。
    pub fn into_parts(self) -> (M, WriteFutureHandle, Option<A>) {
        (self.message, self.future, self.destination)
    }
}

impl<M: fmt::Display, A> fmt::Display for WriteRequest<M, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.message, f)
    }
}

impl<M: fmt::Debug, A: fmt::Debug> fmt::Debug for WriteRequest<M, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteRequest")
            .field("message", &self.message)
            .field("future", &self.future)
            .field("destination", &self.destination)
            .finish()
    }
}

/// [`WriteRequest`] 的构造器。
///
/// # 契约说明（What）
/// - `build` 在未设置消息时返回 `WriteError::InvalidArgument { argument: "message" }`；
/// - 未设置凭证等价于共享兜底凭证，未设置目标地址等价于会话默认目标。
#[derive(Debug)]
pub struct WriteRequestBuilder<M, A = SocketAddr> {
    message: Option<M>,
    future: WriteFutureHandle,
    destination: Option<A>,
}

impl<M, A> WriteRequestBuilder<M, A> {
    /// 创建空构造器。
    pub fn new() -> Self {
        Self {
            message: None,
            future: WriteFutureHandle::Unused,
            destination: None,
        }
    }

    /// 设置待写出的消息。
    pub fn message(mut self, message: M) -> Self {
        self.message = Some(message);
        self
    }

    /// 设置可能缺失的消息，`None` 会在 `build` 时被拒绝。
    pub fn message_opt(mut self, message: Option<M>) -> Self {
        self.message = message;
        self
    }

    /// 设置写完成凭证。
    pub fn future(mut self, future: impl Into<WriteFutureHandle>) -> Self {
        self.future = future.into();
        self
    }

    /// 设置目标地址。
    pub fn destination(mut self, destination: A) -> Self {
        self.destination = Some(destination);
        self
    }

    /// 生成写请求。
    pub fn build(self) -> Result<WriteRequest<M, A>> {
        let message = self.message.ok_or(WriteError::InvalidArgument {
            argument: "message",
        })?;
        Ok(WriteRequest {
            message,
            future: self.future,
            destination: self.destination,
        })
    }
}

impl<M, A> Default for WriteRequestBuilder<M, A> {
    fn default() -> Self {
        Self::new()
    }
}
