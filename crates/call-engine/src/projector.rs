//! 显示投影
//!
//! 从队列状态快照派生只读展示数据。展示层永远只是派生结果，不是权威数据源。

use call_core::{PatientRecord, QueueState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 把完成号码集合渲染为分组字符串
///
/// 升序排列后合并最长连续区间：长度≥2的区间渲染为`起-止`，孤立号码原样输出，
/// 以`", "`连接；空集合渲染为`"---"`。纯函数，与插入顺序无关。
pub fn group_consecutive(numbers: &BTreeSet<u32>) -> String {
    if numbers.is_empty() {
        return "---".to_string();
    }

    let mut runs: Vec<(u32, u32)> = Vec::new();
    for &n in numbers {
        match runs.last_mut() {
            Some((_, end)) if *end + 1 == n => *end = n,
            _ => runs.push((n, n)),
        }
    }

    runs.iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{}-{}", start, end)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// 等待队列的预计等待分钟数
///
/// 以等待列表中最早的受理时刻为基准取整分钟。呼叫策略可能把新呼叫的记录移到队首，
/// 因此取最小受理时刻而非队首元素。等待列表为空时返回None，由展示端渲染中性提示。
pub fn elapsed_wait_minutes(waiting: &[PatientRecord], now: DateTime<Utc>) -> Option<i64> {
    waiting
        .iter()
        .map(|r| r.registered_at)
        .min()
        .map(|earliest| (now - earliest).num_minutes())
}

/// 等待列表中的单个展示条目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingSlot {
    pub reception_number: u32,
    pub is_calling: bool,
}

/// 显示端视图
///
/// 患者端屏幕渲染所需的全部数据：等待号码（快照顺序）、完成号码分组串、预计等待时间。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayView {
    pub waiting: Vec<WaitingSlot>,
    pub completed_display: String,
    pub elapsed_wait_minutes: Option<i64>,
}

impl DisplayView {
    /// 从状态快照投影出显示端视图
    pub fn project(state: &QueueState, now: DateTime<Utc>) -> Self {
        Self {
            waiting: state
                .waiting
                .iter()
                .map(|r| WaitingSlot {
                    reception_number: r.reception_number,
                    is_calling: r.is_calling,
                })
                .collect(),
            completed_display: group_consecutive(&state.completed_numbers),
            elapsed_wait_minutes: elapsed_wait_minutes(&state.waiting, now),
        }
    }
}
