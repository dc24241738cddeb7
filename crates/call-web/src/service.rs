//! 队列服务
//!
//! 把队列引擎与共享状态存储串联起来：每个前台操作都是
//! 「读取快照 → 引擎计算新状态 → 整文档写回」。两个终端基于同一旧快照
//! 同时写回时按后写覆盖先写收敛，这是随存储契约一并记录的设计取舍。
//! 存储失败原样上报，不在此层重试，避免重复追加完成记录。

use call_core::{QueueState, Result};
use call_engine::{CallPolicy, QueueEngine};
use call_store::{StateStore, StateSubscription};
use chrono::{FixedOffset, Utc};
use std::sync::Arc;

/// 队列服务
pub struct QueueService {
    store: Arc<dyn StateStore>,
    engine: QueueEngine,
}

impl QueueService {
    /// 创建服务，呼叫策略在此一次性固定
    pub fn new(store: Arc<dyn StateStore>, policy: CallPolicy) -> Self {
        Self {
            store,
            engine: QueueEngine::new(policy),
        }
    }

    /// 当前状态快照
    pub async fn state(&self) -> Result<QueueState> {
        self.store.get().await
    }

    /// 建立状态订阅（显示端用）
    pub fn subscribe(&self) -> StateSubscription {
        self.store.subscribe()
    }

    /// 受理登记
    pub async fn register(&self, reception_number: u32, patient_id: &str) -> Result<QueueState> {
        let current = self.store.get().await?;
        let next = self
            .engine
            .register(&current, reception_number, patient_id, Utc::now())?;
        self.store.set(next.clone()).await?;
        Ok(next)
    }

    /// 呼叫
    pub async fn call(&self, reception_number: u32) -> Result<QueueState> {
        let current = self.store.get().await?;
        let next = self.engine.call(&current, reception_number)?;
        self.store.set(next.clone()).await?;
        Ok(next)
    }

    /// 转入离席
    pub async fn mark_absent(&self, reception_number: u32) -> Result<QueueState> {
        let current = self.store.get().await?;
        let next = self.engine.mark_absent(&current, reception_number)?;
        self.store.set(next.clone()).await?;
        Ok(next)
    }

    /// 离席返回等待
    pub async fn recall(&self, reception_number: u32) -> Result<QueueState> {
        let current = self.store.get().await?;
        let next = self.engine.recall(&current, reception_number)?;
        self.store.set(next.clone()).await?;
        Ok(next)
    }

    /// 完成
    ///
    /// 完成时刻由本写入方统一盖章，避免各客户端时钟偏差打乱日志顺序。
    pub async fn complete(&self, reception_number: u32) -> Result<QueueState> {
        let current = self.store.get().await?;
        let next = self.engine.complete(&current, reception_number, Utc::now())?;
        self.store.set(next.clone()).await?;
        Ok(next)
    }

    /// 取消受理
    pub async fn cancel(&self, reception_number: u32) -> Result<QueueState> {
        let current = self.store.get().await?;
        let next = self.engine.cancel(&current, reception_number)?;
        self.store.set(next.clone()).await?;
        Ok(next)
    }

    /// 修改受理号码
    pub async fn renumber(&self, old_number: u32, new_number: u32) -> Result<QueueState> {
        let current = self.store.get().await?;
        let next = self.engine.renumber(&current, old_number, new_number)?;
        self.store.set(next.clone()).await?;
        Ok(next)
    }

    /// 重置活跃列表（完成记录日志保留）
    pub async fn reset(&self) -> Result<QueueState> {
        let current = self.store.get().await?;
        let next = self.engine.reset(&current)?;
        self.store.set(next.clone()).await?;
        Ok(next)
    }
}

/// 共享应用状态
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueueService>,
    /// 诊所相对UTC的固定时差，报表换算用
    pub clinic_offset: FixedOffset,
}

impl AppState {
    pub fn new(service: Arc<QueueService>, clinic_offset: FixedOffset) -> Self {
        Self {
            service,
            clinic_offset,
        }
    }
}
