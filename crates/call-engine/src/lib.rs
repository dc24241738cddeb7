//! # Call Engine
//!
//! 队列状态机、呼叫提醒检测与显示投影。

pub mod engine;
pub mod notification;
pub mod projector;

pub use engine::{CallPolicy, QueueEngine};
pub use notification::{CallingAlert, NotificationDetector};
pub use projector::{DisplayView, WaitingSlot};
