//! 叫号服务器主程序

use call_core::{CallError, Result};
use call_engine::CallPolicy;
use call_store::FileStateStore;
use call_web::{AppState, QueueService, WebServer};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod config;
use config::AppConfig;

/// 叫号服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "call-server")]
#[command(about = "诊所受理叫号系统服务器")]
struct Args {
    /// 监听主机
    #[arg(long)]
    host: Option<String>,

    /// 监听端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 状态文档路径
    #[arg(short, long)]
    state_file: Option<String>,

    /// 呼叫排序策略 (move_to_front | keep_position)
    #[arg(long)]
    call_policy: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(&args.log_level)
        .init();

    info!("启动叫号服务器...");

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(path) = args.state_file {
        config.store.state_file = path;
    }
    if let Some(policy) = args.call_policy.as_deref() {
        config.queue.call_policy = match policy {
            "move_to_front" => CallPolicy::MoveToFront,
            "keep_position" => CallPolicy::KeepPosition,
            other => {
                return Err(CallError::Config(format!("未知的呼叫策略: {}", other)));
            }
        };
    }

    info!("叫号服务器配置:");
    info!("  监听地址: {}:{}", config.server.host, config.server.port);
    info!("  状态文档: {}", config.store.state_file);
    info!("  呼叫策略: {:?}", config.queue.call_policy);

    let store = Arc::new(FileStateStore::open(&config.store.state_file).await?);
    let service = Arc::new(QueueService::new(store, config.queue.call_policy));
    let app_state = AppState::new(service, config.clinic_offset()?);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| CallError::Config(format!("监听地址无效: {}", e)))?;

    WebServer::new(addr, app_state).run().await
}
