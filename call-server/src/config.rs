//! 服务器配置
//!
//! 缺省值、配置文件与环境变量（CALL前缀）三层来源，命令行参数最后覆盖。

use call_core::{CallError, Result};
use call_engine::CallPolicy;
use chrono::FixedOffset;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// 服务器完整配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 状态存储配置
    pub store: StoreConfig,
    /// 队列行为配置
    pub queue: QueueConfig,
    /// 报表配置
    pub report: ReportConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 状态存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 状态文档路径
    pub state_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            state_file: "./data/queue-state.json".to_string(),
        }
    }
}

/// 队列行为配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// 呼叫排序策略（部署级选择，运行期间不可混用）
    pub call_policy: CallPolicy,
}

/// 报表配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// 诊所相对UTC的时差（小时）
    pub clinic_utc_offset_hours: i32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            clinic_utc_offset_hours: 9,
        }
    }
}

impl AppConfig {
    /// 加载配置
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("CALL").separator("__"))
            .build()
            .map_err(|e| CallError::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| CallError::Config(e.to_string()))
    }

    /// 诊所本地时差
    pub fn clinic_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.report.clinic_utc_offset_hours * 3600).ok_or_else(|| {
            CallError::Config(format!(
                "无效的诊所时差: {}小时",
                self.report.clinic_utc_offset_hours
            ))
        })
    }
}
