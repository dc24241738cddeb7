//! 呼叫提醒检测
//!
//! 消费连续的队列状态快照，精确检测「进入呼叫中」的状态变迁，
//! 保证跨断线重连既不漏报也不重报。

use call_core::QueueState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 呼叫提醒事件
///
/// 核心只产出抽象事件，展示与音频播放由消费端决定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallingAlert {
    pub reception_number: u32,
}

/// 提醒检测器
///
/// 每个显示端会话各持有一个实例，基准集合从空开始。边沿触发：
/// 呼叫集合未变化的重复快照不会重复提醒；一次更新中出现多个新呼叫时，
/// 只提醒其中编号最小的一个（提醒具有打断性，合并更稳妥）。
#[derive(Debug, Default)]
pub struct NotificationDetector {
    last_calling: BTreeSet<u32>,
}

impl NotificationDetector {
    /// 创建新的检测器（会话级，基准集合为空）
    pub fn new() -> Self {
        Self::default()
    }

    /// 处理一个快照，必要时产出至多一条提醒
    pub fn observe(&mut self, state: &QueueState) -> Option<CallingAlert> {
        let current = state.calling_numbers();
        let alert = current
            .difference(&self.last_calling)
            .next()
            .copied()
            .map(|reception_number| CallingAlert { reception_number });

        // 无论是否提醒都替换基准集合，快照重放下保持幂等
        self.last_calling = current;

        if let Some(alert) = &alert {
            tracing::debug!("New calling alert for {}", alert.reception_number);
        }
        alert
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use call_core::PatientRecord;
    use chrono::Utc;

    fn snapshot(calling: &[u32], waiting: &[u32]) -> QueueState {
        let mut state = QueueState::new();
        for &n in calling {
            let mut record = PatientRecord::new(n, "1234567", Utc::now());
            record.is_calling = true;
            state.waiting.push(record);
        }
        for &n in waiting {
            state.waiting.push(PatientRecord::new(n, "1234567", Utc::now()));
        }
        state
    }

    #[test]
    fn test_alert_sequence_is_edge_triggered() {
        let mut detector = NotificationDetector::new();

        // 快照序列 [{}, {7}, {7}, {7,8}] 恰好触发两次提醒
        assert_eq!(detector.observe(&snapshot(&[], &[])), None);
        assert_eq!(
            detector.observe(&snapshot(&[7], &[])),
            Some(CallingAlert {
                reception_number: 7
            })
        );
        assert_eq!(detector.observe(&snapshot(&[7], &[])), None);
        assert_eq!(
            detector.observe(&snapshot(&[7, 8], &[])),
            Some(CallingAlert {
                reception_number: 8
            })
        );
    }

    #[test]
    fn test_simultaneous_new_calls_alert_lowest_only() {
        let mut detector = NotificationDetector::new();
        let alert = detector.observe(&snapshot(&[12, 4, 8], &[])).unwrap();
        assert_eq!(alert.reception_number, 4);

        // 同一快照重放不再提醒
        assert_eq!(detector.observe(&snapshot(&[12, 4, 8], &[])), None);
    }

    #[test]
    fn test_baseline_updates_even_without_alert() {
        let mut detector = NotificationDetector::new();
        detector.observe(&snapshot(&[5], &[]));
        // 5退出呼叫后再次呼叫要重新提醒
        assert_eq!(detector.observe(&snapshot(&[], &[5])), None);
        assert_eq!(
            detector.observe(&snapshot(&[5], &[])),
            Some(CallingAlert {
                reception_number: 5
            })
        );
    }
}
