//! 状态遥测发布
//!
//! 每次转换完成后，状态机向 broker 发布 `(topic, state_name)`，
//! 并通知所有 [`TransitionObserver`]。
//!
//! # 非阻塞要求
//!
//! 发布在执行线程上同步进行，实现不得阻塞。
//! [`ChannelPublisher`] 使用有界通道 + `try_send`，队列满时丢弃消息并计数。

use crate::state::MachineState;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// 消息发布端（pub/sub broker 的发布接口）
pub trait StatePublisher: Send + Sync {
    fn publish(&self, topic: &str, payload: &str);
}

/// 转换观察者
pub trait TransitionObserver<S: MachineState>: Send + Sync {
    /// 转换完成后调用（`on_enter` 之后）
    fn on_transition(&self, from: S, to: S);
}

/// 一条状态消息
#[derive(Debug, Clone, PartialEq)]
pub struct StateMessage {
    pub topic: String,
    pub payload: String,
    pub published_at: Instant,
}

/// 基于有界通道的发布端
pub struct ChannelPublisher {
    tx: Sender<StateMessage>,
    dropped: Arc<AtomicU64>,
}

impl ChannelPublisher {
    /// 默认队列容量
    pub const DEFAULT_CAPACITY: usize = 1024;

    #[must_use]
    pub fn new() -> (Self, Receiver<StateMessage>) {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> (Self, Receiver<StateMessage>) {
        let (tx, rx) = bounded(capacity);
        let publisher = ChannelPublisher {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (publisher, rx)
    }

    /// 因队列满或接收端关闭而丢弃的消息数
    pub fn dropped_messages(&self) -> &Arc<AtomicU64> {
        &self.dropped
    }
}

impl StatePublisher for ChannelPublisher {
    fn publish(&self, topic: &str, payload: &str) {
        let message = StateMessage {
            topic: topic.to_string(),
            payload: payload.to_string(),
            published_at: Instant::now(),
        };
        if self.tx.try_send(message).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// 把状态消息写入日志的发布端
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

impl StatePublisher for LogPublisher {
    fn publish(&self, topic: &str, payload: &str) {
        tracing::info!(topic, state = payload, "state published");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_publisher_delivers() {
        let (publisher, rx) = ChannelPublisher::new();
        publisher.publish("TOPIC", "IDLE");
        publisher.publish("TOPIC", "RUNNING");

        let payloads: Vec<String> = rx.try_iter().map(|m| m.payload).collect();
        assert_eq!(payloads, vec!["IDLE", "RUNNING"]);
    }

    #[test]
    fn test_channel_publisher_drops_when_full() {
        let (publisher, rx) = ChannelPublisher::with_capacity(2);
        for _ in 0..5 {
            publisher.publish("TOPIC", "X");
        }
        assert_eq!(rx.len(), 2);
        assert_eq!(publisher.dropped_messages().load(Ordering::Relaxed), 3);
    }
}
