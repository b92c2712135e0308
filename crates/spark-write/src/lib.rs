#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![doc = "spark-write: 传输写路径上的写请求（WriteRequest）与写完成凭证（WriteFuture）契约。"]
#![doc = ""]
#![doc = "== 使命概述 =="]
#![doc = "- **Why**：调用方把待发送消息交给调度器后，需要一个统一句柄来观测“是否已真正写出”。"]
#![doc = "- **What**：定义 [`WriteFuture`] 能力集、共享的 [`UnusedWriteFuture`] 兜底实例、`std` 下的 [`DefaultWriteFuture`] 与不可变的 [`WriteRequest`]。"]
#![doc = "- **How**：Socket 读写、调度与 Pipeline 链路均为外部协作者，它们只负责构造、入队并最终调用 `set_written`。"]

extern crate alloc;

pub mod error;
pub mod future;
pub mod request;
pub mod session;

pub use error::WriteError;
#[cfg(feature = "std")]
pub use future::{DefaultWriteFuture, WriteCompletion};
pub use future::{UnusedWriteFuture, WriteFuture, WriteFutureHandle, WriteFutureListener};
pub use request::{WriteRequest, WriteRequestBuilder};
pub use session::SessionId;

/// `Result` 是本 crate 内部使用的统一返回别名，错误类型默认为 [`WriteError`]。
pub type Result<T, E = WriteError> = core::result::Result<T, E>;
