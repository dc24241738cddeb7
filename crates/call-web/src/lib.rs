//! # Call Web
//!
//! 面向前台终端与显示端的HTTP/SSE薄壳。展示层只是派生投影，
//! 所有状态变更都经由队列引擎与共享存储。

pub mod handlers;
pub mod server;
pub mod service;
pub mod sse;

pub use server::WebServer;
pub use service::{AppState, QueueService};
