//! 写完成凭证的并发竞态测试。
//!
//! # 教案级导览
//!
//! - **Why**：监听器注册与解析可能同时发生，二者必须由同一把锁裁决：
//!   要么注册方走“已解析”路径同步触发，要么解析方在待定列表中看到它，绝不能两边都触发或都遗漏。
//! - **How**：使用 `Barrier` 让注册线程与解析线程尽量同时起跑，重复多轮以覆盖不同交错。
//! - **What**：每一轮结束后，每个监听器的调用次数都恰好为 1，等待线程全部返回。

#![cfg(not(any(loom, spark_loom)))]

use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use spark_write::{DefaultWriteFuture, WriteFuture, WriteFutureListener};

const ROUNDS: usize = 200;
const REGISTRARS: usize = 4;

struct Counter(AtomicUsize);

impl WriteFutureListener for Counter {
    fn operation_complete(&self, future: &dyn WriteFuture) {
        assert!(future.is_ready(), "回调时凭证必须已解析");
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn concurrent_registration_and_resolution_deliver_exactly_once() {
    for round in 0..ROUNDS {
        let future = DefaultWriteFuture::shared(None);
        let barrier = Arc::new(Barrier::new(REGISTRARS + 1));
        let counters: Vec<_> = (0..REGISTRARS)
            .map(|_| Arc::new(Counter(AtomicUsize::new(0))))
            .collect();

        let registrars: Vec<_> = counters
            .iter()
            .map(|counter| {
                let future = Arc::clone(&future);
                let barrier = Arc::clone(&barrier);
                let listener = Arc::clone(counter) as Arc<dyn WriteFutureListener>;
                thread::spawn(move || {
                    barrier.wait();
                    future.add_listener(listener).expect("真实凭证必须接受监听器");
                })
            })
            .collect();

        barrier.wait();
        future.set_written(round % 2 == 0);

        for registrar in registrars {
            registrar.join().expect("注册线程不应 panic");
        }
        for counter in &counters {
            assert_eq!(
                counter.0.load(Ordering::SeqCst),
                1,
                "第 {round} 轮：每个监听器必须恰好触发一次"
            );
        }
    }
}

#[test]
fn concurrent_resolvers_fire_listeners_once() {
    for _ in 0..ROUNDS {
        let future = DefaultWriteFuture::shared(None);
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        future
            .add_listener(Arc::clone(&counter) as Arc<dyn WriteFutureListener>)
            .expect("注册成功");

        let barrier = Arc::new(Barrier::new(2));
        let resolvers: Vec<_> = [true, false]
            .into_iter()
            .map(|outcome| {
                let future = Arc::clone(&future);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    future.set_written(outcome);
                })
            })
            .collect();

        for resolver in resolvers {
            resolver.join().expect("解析线程不应 panic");
        }
        assert_eq!(counter.0.load(Ordering::SeqCst), 1, "并发解析也只能触发一次");
        assert!(future.is_ready());
    }
}

#[test]
fn bounded_joiners_all_observe_single_resolution() {
    let future = DefaultWriteFuture::shared(None);
    let barrier = Arc::new(Barrier::new(5));

    let joiners: Vec<_> = (0..4)
        .map(|_| {
            let future = Arc::clone(&future);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                future.join_timeout(Duration::from_secs(10))
            })
        })
        .collect();

    barrier.wait();
    future.set_written(true);

    for joiner in joiners {
        assert!(joiner.join().expect("等待线程不应 panic"), "窗口内必须观察到解析");
    }
}
