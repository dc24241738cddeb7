//! # Call Report
//!
//! 完成记录的只读报表投影，目前提供CSV导出。
//! 报表层只需要完成记录日志的读权限，不触碰核心状态机。

pub mod export;

pub use export::{export_completion_log, CsvExport};
