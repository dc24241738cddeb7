//! 完成记录CSV导出
//!
//! 按诊所本地日期对完成时刻做闭区间过滤，每条完成记录输出一行。
//! 输出为带BOM的UTF-8（表格软件识别编码所需），文件名内嵌所选日期范围。

use call_core::{CallError, CompletionLogEntry, Result};
use chrono::{FixedOffset, NaiveDate};

/// UTF-8字节序标记
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// 表头沿用诊所现场使用的列名
const HEADER: &str = "\"受付番号\",\"患者ID\",\"受付日\",\"受付時刻\",\"完了日\",\"完了時刻\"";

/// 导出结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content: Vec<u8>,
}

/// 按日期范围导出完成记录
///
/// `start`/`end`为诊所本地日期（闭区间），`offset`为诊所相对UTC的固定时差——
/// 文档内的时间戳统一为UTC，换算用配置的时差而非主机时区，保证导出可复现。
/// 范围内没有记录时返回`Ok(None)`，由调用方转成用户提示而不是生成空文件。
pub fn export_completion_log(
    log: &[CompletionLogEntry],
    start: NaiveDate,
    end: NaiveDate,
    offset: FixedOffset,
) -> Result<Option<CsvExport>> {
    if end < start {
        return Err(CallError::Config(format!(
            "导出日期范围无效: {} 至 {}",
            start, end
        )));
    }

    let rows: Vec<&CompletionLogEntry> = log
        .iter()
        .filter(|entry| {
            let local_date = entry.completed_at.with_timezone(&offset).date_naive();
            start <= local_date && local_date <= end
        })
        .collect();

    if rows.is_empty() {
        return Ok(None);
    }

    let mut csv = String::from(HEADER);
    csv.push('\n');
    for entry in &rows {
        let registered = entry.registered_at.with_timezone(&offset);
        let completed = entry.completed_at.with_timezone(&offset);
        let row = [
            entry.reception_number.to_string(),
            entry.patient_id.clone(),
            registered.format("%Y/%m/%d").to_string(),
            registered.format("%H:%M:%S").to_string(),
            completed.format("%Y/%m/%d").to_string(),
            completed.format("%H:%M:%S").to_string(),
        ]
        .iter()
        .map(|value| format!("\"{}\"", value))
        .collect::<Vec<_>>()
        .join(",");
        csv.push_str(&row);
        csv.push('\n');
    }

    let mut content = Vec::with_capacity(UTF8_BOM.len() + csv.len());
    content.extend_from_slice(UTF8_BOM);
    content.extend_from_slice(csv.as_bytes());

    tracing::info!("Exported {} completion rows for {} - {}", rows.len(), start, end);
    Ok(Some(CsvExport {
        filename: format!("完了ログ_{}_to_{}.csv", start, end),
        content,
    }))
}
