//! 核心数据模型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 患者受理记录
///
/// 受理号码在活跃记录（等待+离席）中全局唯一；患者ID为固定长度数字串，不要求唯一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub reception_number: u32,        // 受理号码
    pub patient_id: String,           // 患者ID
    pub registered_at: DateTime<Utc>, // 受理时刻，创建后不变
    pub is_calling: bool,             // 呼叫中标记，仅等待列表中可为true
}

impl PatientRecord {
    /// 创建新的受理记录（初始不处于呼叫状态）
    pub fn new(
        reception_number: u32,
        patient_id: impl Into<String>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            reception_number,
            patient_id: patient_id.into(),
            registered_at,
            is_calling: false,
        }
    }
}

/// 完成记录
///
/// 追加后不可变，构成CSV导出用的权威历史。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionLogEntry {
    pub reception_number: u32,
    pub patient_id: String,
    pub registered_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>, // 由写入方在完成时刻赋值
}

/// 队列全量状态
///
/// 共享文档的根聚合。所有变更只经由队列引擎产生新值，调用方不得原地修改。
/// 完成号码集合仅用于展示分组；完成记录日志是追加式的权威历史，重置操作不会清空它。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueState {
    pub waiting: Vec<PatientRecord>,
    pub absent: Vec<PatientRecord>,
    pub completed_numbers: BTreeSet<u32>,
    pub completion_log: Vec<CompletionLogEntry>,
}

impl QueueState {
    /// 创建空状态
    pub fn new() -> Self {
        Self::default()
    }

    /// 号码是否已被占用（等待、离席或完成号码集合）
    pub fn is_number_taken(&self, number: u32) -> bool {
        self.position_in_waiting(number).is_some()
            || self.position_in_absent(number).is_some()
            || self.completed_numbers.contains(&number)
    }

    /// 号码在等待列表中的位置
    pub fn position_in_waiting(&self, number: u32) -> Option<usize> {
        self.waiting
            .iter()
            .position(|r| r.reception_number == number)
    }

    /// 号码在离席列表中的位置
    pub fn position_in_absent(&self, number: u32) -> Option<usize> {
        self.absent
            .iter()
            .position(|r| r.reception_number == number)
    }

    /// 当前处于呼叫中的号码集合
    pub fn calling_numbers(&self) -> BTreeSet<u32> {
        self.waiting
            .iter()
            .filter(|r| r.is_calling)
            .map(|r| r.reception_number)
            .collect()
    }
}
