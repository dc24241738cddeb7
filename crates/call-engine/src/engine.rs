//! 队列引擎
//!
//! 对队列状态执行受理、呼叫、离席、完成等操作的状态机。
//! 所有操作都是输入状态上的纯函数：成功时返回新状态，失败时返回类型化错误，
//! 输入状态永远不被原地修改。

use call_core::utils::is_valid_patient_id;
use call_core::{CallError, CompletionLogEntry, PatientRecord, QueueState, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 呼叫排序策略
///
/// 不同部署对「呼叫是否调整队列顺序」要求不同，必须在引擎构造时显式选定，
/// 运行期间不可混用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPolicy {
    /// 呼叫后移动到等待列表头部（优先服务）
    #[default]
    MoveToFront,
    /// 呼叫后保持原位置（公平顺序）
    KeepPosition,
}

/// 队列引擎
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueEngine {
    policy: CallPolicy,
}

impl QueueEngine {
    /// 创建指定呼叫策略的引擎
    pub fn new(policy: CallPolicy) -> Self {
        Self { policy }
    }

    /// 当前呼叫策略
    pub fn policy(&self) -> CallPolicy {
        self.policy
    }

    /// 受理登记
    ///
    /// 号码与等待、离席、完成号码集合中的任一号码冲突时拒绝。
    pub fn register(
        &self,
        state: &QueueState,
        reception_number: u32,
        patient_id: &str,
        now: DateTime<Utc>,
    ) -> Result<QueueState> {
        if reception_number == 0 {
            return Err(CallError::InvalidNumber(reception_number.to_string()));
        }
        if !is_valid_patient_id(patient_id) {
            return Err(CallError::InvalidPatientId(patient_id.to_string()));
        }
        if state.is_number_taken(reception_number) {
            return Err(CallError::DuplicateNumber(reception_number));
        }

        let mut next = state.clone();
        next.waiting
            .push(PatientRecord::new(reception_number, patient_id, now));
        tracing::info!("Registered reception number {}", reception_number);
        Ok(next)
    }

    /// 呼叫等待中的患者
    pub fn call(&self, state: &QueueState, reception_number: u32) -> Result<QueueState> {
        let pos = state
            .position_in_waiting(reception_number)
            .ok_or(CallError::NotFound(reception_number))?;

        let mut next = state.clone();
        next.waiting[pos].is_calling = true;
        if self.policy == CallPolicy::MoveToFront && pos != 0 {
            let record = next.waiting.remove(pos);
            next.waiting.insert(0, record);
        }
        tracing::info!("Calling reception number {}", reception_number);
        Ok(next)
    }

    /// 将等待中的患者转入离席列表
    pub fn mark_absent(&self, state: &QueueState, reception_number: u32) -> Result<QueueState> {
        let pos = state
            .position_in_waiting(reception_number)
            .ok_or(CallError::NotFound(reception_number))?;

        let mut next = state.clone();
        let mut record = next.waiting.remove(pos);
        record.is_calling = false;
        next.absent.push(record);
        tracing::info!("Marked reception number {} absent", reception_number);
        Ok(next)
    }

    /// 将离席患者移回等待列表末尾
    pub fn recall(&self, state: &QueueState, reception_number: u32) -> Result<QueueState> {
        let pos = state
            .position_in_absent(reception_number)
            .ok_or(CallError::NotFound(reception_number))?;

        let mut next = state.clone();
        let record = next.absent.remove(pos);
        next.waiting.push(record);
        tracing::info!("Recalled reception number {} to waiting", reception_number);
        Ok(next)
    }

    /// 完成
    ///
    /// 从等待或离席列表移除记录，追加一条完成记录并把号码并入完成号码集合。
    /// 完成时刻由调用方传入，同一写入方统一赋值以避免时钟偏差打乱顺序。
    pub fn complete(
        &self,
        state: &QueueState,
        reception_number: u32,
        now: DateTime<Utc>,
    ) -> Result<QueueState> {
        let mut next = state.clone();
        let record = if let Some(pos) = next.position_in_waiting(reception_number) {
            next.waiting.remove(pos)
        } else if let Some(pos) = next.position_in_absent(reception_number) {
            next.absent.remove(pos)
        } else {
            return Err(CallError::NotFound(reception_number));
        };

        next.completion_log.push(CompletionLogEntry {
            reception_number: record.reception_number,
            patient_id: record.patient_id,
            registered_at: record.registered_at,
            completed_at: now,
        });
        // 集合插入天然幂等，同号重复完成不会产生重复展示
        next.completed_numbers.insert(reception_number);
        tracing::info!("Completed reception number {}", reception_number);
        Ok(next)
    }

    /// 取消受理
    ///
    /// 从活跃列表及完成号码集合中移除；完成记录日志一经写入不可回退。
    pub fn cancel(&self, state: &QueueState, reception_number: u32) -> Result<QueueState> {
        let mut next = state.clone();
        let mut removed = false;

        if let Some(pos) = next.position_in_waiting(reception_number) {
            next.waiting.remove(pos);
            removed = true;
        }
        if let Some(pos) = next.position_in_absent(reception_number) {
            next.absent.remove(pos);
            removed = true;
        }
        if next.completed_numbers.remove(&reception_number) {
            removed = true;
        }

        if !removed {
            return Err(CallError::NotFound(reception_number));
        }
        tracing::info!("Canceled reception number {}", reception_number);
        Ok(next)
    }

    /// 修改受理号码
    ///
    /// 原位置与呼叫中标记保持不变。改回原号码视为无操作而非冲突。
    pub fn renumber(
        &self,
        state: &QueueState,
        old_number: u32,
        new_number: u32,
    ) -> Result<QueueState> {
        if new_number == 0 {
            return Err(CallError::InvalidNumber(new_number.to_string()));
        }
        if new_number != old_number && state.is_number_taken(new_number) {
            return Err(CallError::DuplicateNumber(new_number));
        }

        let mut next = state.clone();
        let record = if let Some(pos) = next.position_in_waiting(old_number) {
            &mut next.waiting[pos]
        } else if let Some(pos) = next.position_in_absent(old_number) {
            &mut next.absent[pos]
        } else {
            return Err(CallError::NotFound(old_number));
        };
        record.reception_number = new_number;
        tracing::info!("Renumbered reception {} to {}", old_number, new_number);
        Ok(next)
    }

    /// 重置
    ///
    /// 清空等待、离席与完成号码集合。完成记录日志与重置解耦，永远保留。
    pub fn reset(&self, state: &QueueState) -> Result<QueueState> {
        let mut next = state.clone();
        next.waiting.clear();
        next.absent.clear();
        next.completed_numbers.clear();
        tracing::info!("Queue state reset, completion log preserved");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn engine() -> QueueEngine {
        QueueEngine::new(CallPolicy::MoveToFront)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn state_with(numbers: &[u32]) -> QueueState {
        let mut state = QueueState::new();
        for &n in numbers {
            state = engine().register(&state, n, "1234567", now()).unwrap();
        }
        state
    }

    #[test]
    fn test_register_appends_to_waiting() {
        let state = QueueState::new();
        let next = engine().register(&state, 1, "1234567", now()).unwrap();

        assert_eq!(next.waiting.len(), state.waiting.len() + 1);
        assert!(!next.waiting[0].is_calling);
        assert_eq!(next.waiting[0].registered_at, now());
    }

    #[test]
    fn test_register_rejects_invalid_input() {
        let state = QueueState::new();
        assert!(matches!(
            engine().register(&state, 0, "1234567", now()),
            Err(CallError::InvalidNumber(_))
        ));
        assert!(matches!(
            engine().register(&state, 1, "12345", now()),
            Err(CallError::InvalidPatientId(_))
        ));
        assert!(matches!(
            engine().register(&state, 1, "12345a7", now()),
            Err(CallError::InvalidPatientId(_))
        ));
    }

    #[test]
    fn test_register_rejects_duplicates_in_any_collection() {
        let mut state = state_with(&[1]);
        state = engine().mark_absent(&state, 1).unwrap();
        state = engine().register(&state, 2, "1234567", now()).unwrap();
        state = engine().complete(&state, 2, now()).unwrap();
        state = engine().register(&state, 3, "1234567", now()).unwrap();

        // 1在离席，2在完成号码集合，3在等待
        for n in [1, 2, 3] {
            assert!(matches!(
                engine().register(&state, n, "1234567", now()),
                Err(CallError::DuplicateNumber(m)) if m == n
            ));
        }
    }

    #[test]
    fn test_call_moves_to_front_and_sets_flag() {
        let state = state_with(&[1, 2, 3]);
        let next = engine().call(&state, 3).unwrap();

        assert_eq!(next.waiting[0].reception_number, 3);
        assert!(next.waiting[0].is_calling);
        assert_eq!(next.waiting[1].reception_number, 1);
        // 输入状态未被修改
        assert_eq!(state.waiting[0].reception_number, 1);
    }

    #[test]
    fn test_call_keep_position_policy() {
        let fair = QueueEngine::new(CallPolicy::KeepPosition);
        let state = state_with(&[1, 2, 3]);
        let next = fair.call(&state, 3).unwrap();

        assert_eq!(next.waiting[2].reception_number, 3);
        assert!(next.waiting[2].is_calling);
    }

    #[test]
    fn test_call_rejects_absent_number() {
        let mut state = state_with(&[1]);
        state = engine().mark_absent(&state, 1).unwrap();
        assert!(matches!(
            engine().call(&state, 1),
            Err(CallError::NotFound(1))
        ));
    }

    #[test]
    fn test_mark_absent_clears_calling() {
        let mut state = state_with(&[1]);
        state = engine().call(&state, 1).unwrap();
        let next = engine().mark_absent(&state, 1).unwrap();

        assert!(next.waiting.is_empty());
        assert_eq!(next.absent[0].reception_number, 1);
        assert!(!next.absent[0].is_calling);
    }

    #[test]
    fn test_recall_appends_to_waiting_tail() {
        let mut state = state_with(&[1, 2]);
        state = engine().mark_absent(&state, 1).unwrap();
        let next = engine().recall(&state, 1).unwrap();

        assert!(next.absent.is_empty());
        assert_eq!(next.waiting.last().unwrap().reception_number, 1);
        assert!(!next.waiting.last().unwrap().is_calling);
        assert!(matches!(
            engine().recall(&next, 2),
            Err(CallError::NotFound(2))
        ));
    }

    #[test]
    fn test_complete_from_either_list() {
        let mut state = state_with(&[1, 2]);
        state = engine().mark_absent(&state, 2).unwrap();

        let next = engine().complete(&state, 1, now()).unwrap();
        assert!(next.completed_numbers.contains(&1));
        assert_eq!(next.completion_log.len(), 1);
        assert_eq!(next.completion_log[0].completed_at, now());

        let next = engine().complete(&next, 2, now()).unwrap();
        assert!(next.absent.is_empty());
        assert_eq!(next.completion_log.len(), 2);

        assert!(matches!(
            engine().complete(&next, 9, now()),
            Err(CallError::NotFound(9))
        ));
    }

    #[test]
    fn test_cancel_after_complete_keeps_log() {
        let mut state = state_with(&[1]);
        state = engine().complete(&state, 1, now()).unwrap();
        let next = engine().cancel(&state, 1).unwrap();

        assert!(!next.completed_numbers.contains(&1));
        // 历史不可变：完成记录仍在
        assert_eq!(next.completion_log.len(), 1);
        assert_eq!(next.completion_log[0].reception_number, 1);

        assert!(matches!(
            engine().cancel(&next, 1),
            Err(CallError::NotFound(1))
        ));
    }

    #[test]
    fn test_renumber_preserves_position_and_flag() {
        let mut state = state_with(&[1, 2, 3]);
        state = engine().call(&state, 2).unwrap();
        let next = engine().renumber(&state, 2, 9).unwrap();

        assert_eq!(next.waiting[0].reception_number, 9);
        assert!(next.waiting[0].is_calling);

        // 改回自身号码不算冲突
        assert!(engine().renumber(&next, 9, 9).is_ok());
        assert!(matches!(
            engine().renumber(&next, 9, 1),
            Err(CallError::DuplicateNumber(1))
        ));
        assert!(matches!(
            engine().renumber(&next, 9, 0),
            Err(CallError::InvalidNumber(_))
        ));
        assert!(matches!(
            engine().renumber(&next, 42, 50),
            Err(CallError::NotFound(42))
        ));
    }

    #[test]
    fn test_reset_is_idempotent_and_keeps_log() {
        let mut state = state_with(&[1, 2]);
        state = engine().complete(&state, 1, now()).unwrap();

        let once = engine().reset(&state).unwrap();
        let twice = engine().reset(&once).unwrap();

        assert!(once.waiting.is_empty());
        assert!(once.completed_numbers.is_empty());
        assert_eq!(once.completion_log.len(), 1);
        assert_eq!(once, twice);
    }
}
