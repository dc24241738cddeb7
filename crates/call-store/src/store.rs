//! 状态存储抽象
//!
//! get/set/subscribe三件套。set为整文档原子替换，独立写入方之间按「后写覆盖先写」
//! 收敛：两个终端基于同一旧快照各自修改再写回时，先写的一方会被整体覆盖。
//! 这是本设计明确接受并记录在案的一致性弱点；引擎侧不做乐观并发控制，
//! 生产级加固需改为逐操作CAS或命令日志回放。

use async_trait::async_trait;
use call_core::{QueueState, Result};
use tokio::sync::watch;

/// 状态订阅
///
/// 基于watch通道的惰性无界快照序列。订阅方每次醒来拿到的是当时最新的快照，
/// 中间快照可能被合并跳过，但最终收敛状态必达——恰好是断线重连要求的
/// 「至少一次、以末态为准」语义。
pub struct StateSubscription {
    rx: watch::Receiver<QueueState>,
}

impl StateSubscription {
    pub(crate) fn new(mut rx: watch::Receiver<QueueState>) -> Self {
        // 新订阅者第一次next()立即返回当前快照
        rx.mark_changed();
        Self { rx }
    }

    /// 等待下一个快照；存储端关闭后返回None
    pub async fn next(&mut self) -> Option<QueueState> {
        if self.rx.changed().await.is_err() {
            return None;
        }
        Some(self.rx.borrow_and_update().clone())
    }
}

/// 状态存储接口
#[async_trait]
pub trait StateStore: Send + Sync {
    /// 读取当前快照
    async fn get(&self) -> Result<QueueState>;

    /// 整文档替换并向所有订阅者扇出
    async fn set(&self, state: QueueState) -> Result<()>;

    /// 建立新订阅
    fn subscribe(&self) -> StateSubscription;
}

/// 内存状态存储
///
/// 单进程内的参考实现，测试与演示用。
pub struct MemoryStateStore {
    tx: watch::Sender<QueueState>,
}

impl MemoryStateStore {
    /// 创建空的内存存储
    pub fn new() -> Self {
        let (tx, _) = watch::channel(QueueState::new());
        Self { tx }
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self) -> Result<QueueState> {
        Ok(self.tx.borrow().clone())
    }

    async fn set(&self, state: QueueState) -> Result<()> {
        self.tx.send_replace(state);
        Ok(())
    }

    fn subscribe(&self) -> StateSubscription {
        StateSubscription::new(self.tx.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use call_core::PatientRecord;
    use chrono::Utc;

    fn state_with(numbers: &[u32]) -> QueueState {
        let mut state = QueueState::new();
        for &n in numbers {
            state.waiting.push(PatientRecord::new(n, "1234567", Utc::now()));
        }
        state
    }

    #[tokio::test]
    async fn test_set_then_get_round_trip() {
        let store = MemoryStateStore::new();
        assert!(store.get().await.unwrap().waiting.is_empty());

        store.set(state_with(&[1, 2])).await.unwrap();
        assert_eq!(store.get().await.unwrap().waiting.len(), 2);
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_latest_snapshot() {
        let store = MemoryStateStore::new();
        store.set(state_with(&[1])).await.unwrap();
        store.set(state_with(&[1, 2, 3])).await.unwrap();

        // 订阅发生在两次写入之后，仍立即拿到末态
        let mut sub = store.subscribe();
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.waiting.len(), 3);
    }

    #[tokio::test]
    async fn test_intermediate_snapshots_may_coalesce() {
        let store = MemoryStateStore::new();
        let mut sub = store.subscribe();
        // 消费初始快照
        assert!(sub.next().await.unwrap().waiting.is_empty());

        for i in 1..=5 {
            store.set(state_with(&(1..=i).collect::<Vec<_>>())).await.unwrap();
        }
        // 醒来后观察到的是收敛末态
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.waiting.len(), 5);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = MemoryStateStore::new();
        // 两个写入方基于同一旧快照写回，后写整体覆盖
        let a = state_with(&[1]);
        let b = state_with(&[2]);
        store.set(a).await.unwrap();
        store.set(b).await.unwrap();

        let current = store.get().await.unwrap();
        assert_eq!(current.waiting.len(), 1);
        assert_eq!(current.waiting[0].reception_number, 2);
    }
}
