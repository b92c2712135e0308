use std::{
    fmt, mem,
    panic::{self, AssertUnwindSafe},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, Waker},
    time::{Duration, Instant},
};

use crate::{Result, SessionId};

use super::{
    WriteFuture, WriteFutureListener, same_listener,
    sync::{Condvar, Mutex},
};

/// 写完成凭证的默认实现，由写调度器在真正写出后解析。
///
/// # 教案级注释
///
/// ## 契约说明（What）
/// - 状态机 `Pending → Resolved(outcome)`；首次 [`set_written`](WriteFuture::set_written) 生效，
///   之后的调用不会改变结果，也不会重复触发监听器；
/// - 解析前注册的监听器按注册顺序由解析方调用；解析后注册的监听器由注册方同步调用；
///   两条路径由同一把锁裁决，因此每个监听器恰好被调用一次；
/// - 监听器 panic 会被捕获并记录 `warn` 日志，不影响其余监听器，也不会让凭证失效。
///
/// ## 执行逻辑（How）
/// - `parking_lot::Mutex` 同时保护结果、监听器列表与异步任务的 `Waker`（Loom 模型下换成 Loom 的锁）；
/// - 每个 [`WriteCompletion`] 在锁内占用一个按键登记的 `Waker` 槽位，被丢弃时归还；
/// - 阻塞等待方挂在配对的 `Condvar` 上，解析后统一 `notify_all`；
/// - 回调在释放锁之后执行，监听器内部可以安全地再次访问本凭证。
pub struct DefaultWriteFuture {
    session: Option<SessionId>,
    state: Mutex<State>,
    resolved: Condvar,
}

#[derive(Default)]
struct State {
    outcome: Option<bool>,
    listeners: Vec<Arc<dyn WriteFutureListener>>,
    wakers: Vec<(usize, Waker)>,
    next_waiter: usize,
}

impl DefaultWriteFuture {
    /// 创建处于待定状态的凭证。
    pub fn new(session: Option<SessionId>) -> Self {
        Self::with_state(session, State::default())
    }

    /// 创建已解析为“写出成功”的凭证。
    pub fn new_written(session: Option<SessionId>) -> Self {
        Self::resolved_with(session, true)
    }

    /// 创建已解析为“未写出”的凭证，常用于会话已关闭时直接拒绝写请求。
    pub fn new_not_written(session: Option<SessionId>) -> Self {
        Self::resolved_with(session, false)
    }

    fn resolved_with(session: Option<SessionId>, written: bool) -> Self {
        Self::with_state(
            session,
            State {
                outcome: Some(written),
                ..State::default()
            },
        )
    }

    fn with_state(session: Option<SessionId>, state: State) -> Self {
        Self {
            session,
            state: Mutex::new(state),
            resolved: Condvar::new(),
        }
    }

    /// 创建待定凭证并直接放入 `Arc`，便于同时交给写请求与观察者。
    pub fn shared(session: Option<SessionId>) -> Arc<Self> {
        Arc::new(Self::new(session))
    }

    /// 非阻塞读取结果：`None` 表示尚未解析。
    pub fn outcome(&self) -> Option<bool> {
        self.state.lock().outcome
    }

    /// 返回在解析时完成的异步等待句柄，输出即写结果。
    pub fn completion(&self) -> WriteCompletion<'_> {
        WriteCompletion {
            future: self,
            slot: None,
        }
    }

    fn notify(&self, listener: &Arc<dyn WriteFutureListener>) {
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
            listener.operation_complete(self);
        }));
        if delivered.is_err() {
            tracing::warn!(
                session = ?self.session,
                "write future listener panicked; remaining listeners are still notified"
            );
        }
    }
}

impl Default for DefaultWriteFuture {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for DefaultWriteFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DefaultWriteFuture")
            .field("session", &self.session)
            .field("outcome", &state.outcome)
            .field("listeners", &state.listeners.len())
            .field("waiters", &state.wakers.len())
            .finish()
    }
}

impl WriteFuture for DefaultWriteFuture {
    fn is_written(&self) -> bool {
        self.state.lock().outcome.unwrap_or(false)
    }

    fn set_written(&self, written: bool) {
        let (listeners, wakers) = {
            let mut state = self.state.lock();
            if let Some(previous) = state.outcome {
                tracing::debug!(
                    session = ?self.session,
                    previous,
                    ignored = written,
                    "write future already resolved; repeated resolution ignored"
                );
                return;
            }
            state.outcome = Some(written);
            (
                mem::take(&mut state.listeners),
                mem::take(&mut state.wakers),
            )
        };

        tracing::trace!(
            session = ?self.session,
            written,
            listeners = listeners.len(),
            waiters = wakers.len(),
            "write future resolved"
        );

        self.resolved.notify_all();
        for (_, waker) in wakers {
            waker.wake();
        }
        for listener in &listeners {
            self.notify(listener);
        }
    }

    fn session(&self) -> Option<SessionId> {
        self.session
    }

    fn join(&self) {
        let mut state = self.state.lock();
        while state.outcome.is_none() {
            state = self.resolved.wait(state);
        }
    }

    fn join_timeout(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        if state.outcome.is_some() {
            return true;
        }
        if timeout.is_zero() {
            return false;
        }

        // 超大超时会让截止时间溢出，此时等价于无超时等待。
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            while state.outcome.is_none() {
                state = self.resolved.wait(state);
            }
            return true;
        };

        while state.outcome.is_none() {
            let (guard, timed_out) = self.resolved.wait_until(state, deadline);
            if timed_out {
                return guard.outcome.is_some();
            }
            state = guard;
        }
        true
    }

    fn is_ready(&self) -> bool {
        self.state.lock().outcome.is_some()
    }

    fn add_listener(&self, listener: Arc<dyn WriteFutureListener>) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.outcome.is_none() {
                state.listeners.push(listener);
                return Ok(());
            }
        }
        self.notify(&listener);
        Ok(())
    }

    fn remove_listener(&self, listener: &Arc<dyn WriteFutureListener>) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(index) = state
            .listeners
            .iter()
            .position(|registered| same_listener(registered, listener))
        {
            state.listeners.remove(index);
        }
        Ok(())
    }
}

/// [`DefaultWriteFuture::completion`] 返回的异步等待句柄。
///
/// 首次轮询前已解析则立即就绪；否则登记当前任务的 `Waker`，由 `set_written` 唤醒。
/// 每个句柄只占一个槽位，重复轮询替换旧 `Waker`；句柄被丢弃（例如超时或取消）时归还槽位。
#[must_use = "futures do nothing unless polled"]
pub struct WriteCompletion<'a> {
    future: &'a DefaultWriteFuture,
    slot: Option<usize>,
}

impl fmt::Debug for WriteCompletion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteCompletion")
            .field("future", self.future)
            .field("slot", &self.slot)
            .finish()
    }
}

impl core::future::Future for WriteCompletion<'_> {
    type Output = bool;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut state = this.future.state.lock();
        if let Some(written) = state.outcome {
            this.slot = None;
            return Poll::Ready(written);
        }

        let registered = this
            .slot
            .and_then(|key| state.wakers.iter_mut().find(|(slot, _)| *slot == key));
        match registered {
            Some((_, waker)) => {
                if !waker.will_wake(cx.waker()) {
                    waker.clone_from(cx.waker());
                }
            }
            None => {
                let key = state.next_waiter;
                state.next_waiter = state.next_waiter.wrapping_add(1);
                state.wakers.push((key, cx.waker().clone()));
                this.slot = Some(key);
            }
        }
        Poll::Pending
    }
}

impl Drop for WriteCompletion<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.slot.take() {
            self.future
                .state
                .lock()
                .wakers
                .retain(|(slot, _)| *slot != key);
        }
    }
}

#[cfg(all(test, not(any(loom, spark_loom))))]
mod tests {
    use core::future::Future;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        task::Wake,
    };

    use super::*;

    /// 记录被唤醒次数的 `Waker`。
    #[derive(Default)]
    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn poll_once(completion: &mut WriteCompletion<'_>, waker: &Waker) -> Poll<bool> {
        let mut cx = Context::from_waker(waker);
        Pin::new(completion).poll(&mut cx)
    }

    fn waiters(future: &DefaultWriteFuture) -> usize {
        future.state.lock().wakers.len()
    }

    #[test]
    fn pre_resolved_constructors_skip_pending_state() {
        let written = DefaultWriteFuture::new_written(Some(SessionId::new(3)));
        let failed = DefaultWriteFuture::new_not_written(None);

        assert_eq!(written.outcome(), Some(true));
        assert!(written.join_timeout(Duration::ZERO));
        assert_eq!(failed.outcome(), Some(false));
        assert!(failed.is_ready());
        assert!(!failed.is_written());
    }

    #[test]
    fn debug_output_reports_pending_listeners() {
        let future = DefaultWriteFuture::new(Some(SessionId::new(9)));
        future
            .add_listener(Arc::new(|_: &dyn WriteFuture| {}))
            .expect("真实凭证必须接受监听器");
        let rendered = format!("{future:?}");
        assert!(rendered.contains("listeners: 1"), "{rendered}");
        assert!(rendered.contains("outcome: None"), "{rendered}");
    }

    #[test]
    fn dropped_completions_release_their_wakers() {
        let future = DefaultWriteFuture::new(None);

        for _ in 0..1000 {
            let waker = Waker::from(Arc::new(CountingWaker::default()));
            let mut completion = future.completion();
            assert!(poll_once(&mut completion, &waker).is_pending());
        }

        assert_eq!(waiters(&future), 0, "被丢弃的等待句柄不得滞留 Waker");
    }

    #[test]
    fn repolling_replaces_waker_in_the_same_slot() {
        let future = DefaultWriteFuture::new(None);
        let first = Arc::new(CountingWaker::default());
        let second = Arc::new(CountingWaker::default());
        let mut completion = future.completion();

        assert!(poll_once(&mut completion, &Waker::from(Arc::clone(&first))).is_pending());
        assert!(poll_once(&mut completion, &Waker::from(Arc::clone(&second))).is_pending());
        assert_eq!(waiters(&future), 1, "同一句柄只占一个槽位");

        future.set_written(true);
        assert_eq!(first.0.load(Ordering::SeqCst), 0, "旧 Waker 已被替换");
        assert_eq!(second.0.load(Ordering::SeqCst), 1);
        assert_eq!(poll_once(&mut completion, &Waker::from(second)), Poll::Ready(true));
    }

    #[test]
    fn dropping_one_completion_keeps_others_registered() {
        let future = DefaultWriteFuture::new(None);
        let abandoned = Arc::new(CountingWaker::default());
        let kept = Arc::new(CountingWaker::default());

        let mut cancelled = future.completion();
        assert!(poll_once(&mut cancelled, &Waker::from(Arc::clone(&abandoned))).is_pending());
        let mut awaited = future.completion();
        assert!(poll_once(&mut awaited, &Waker::from(Arc::clone(&kept))).is_pending());
        drop(cancelled);
        assert_eq!(waiters(&future), 1);

        future.set_written(false);
        assert_eq!(abandoned.0.load(Ordering::SeqCst), 0, "已取消的等待不应被唤醒");
        assert_eq!(kept.0.load(Ordering::SeqCst), 1);
        assert_eq!(waiters(&future), 0);
        drop(awaited);
    }
}
