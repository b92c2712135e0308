//! 会话标识。
//!
//! 写完成凭证只需要知道“属于哪个会话”，会话本身的生命周期由上层会话管理器负责，
//! 因此这里仅提供一个不透明、可复制的身份值。

use core::fmt;

/// 会话身份，供 [`WriteFuture::session`](crate::WriteFuture::session) 返回。
///
/// # 契约定义（What）
/// - 仅用于相等性比较与日志输出，不携带任何会话状态；
/// - 数值由会话层分配，本类型不保证全局唯一。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// 由会话层分配的原始数值构造身份。
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// 返回原始数值。
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SessionId {
    fn from(raw: u64) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}
