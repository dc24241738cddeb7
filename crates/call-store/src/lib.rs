//! # Call Store
//!
//! 队列状态的可订阅共享存储：整文档原子替换，后写覆盖先写，
//! 新订阅者立即观察到最新快照。

pub mod file_store;
pub mod store;

pub use file_store::FileStateStore;
pub use store::{MemoryStateStore, StateStore, StateSubscription};
