//! 文件文档状态存储
//!
//! 把整个队列状态持久化为磁盘上的单个JSON文档（对应原型中浏览器端的单键存储），
//! 每次set先落盘再向订阅者扇出。读写失败作为暂时性错误上报给调用方，
//! 存储自身从不自动重试，以免重复产生完成记录之类的副作用。

use crate::store::{StateStore, StateSubscription};
use async_trait::async_trait;
use call_core::{CallError, QueueState, Result};
use std::path::PathBuf;
use tokio::sync::{watch, Mutex};
use tracing::info;

/// 文件文档状态存储
pub struct FileStateStore {
    path: PathBuf,
    tx: watch::Sender<QueueState>,
    // 序列化本进程内的落盘；跨进程仍是整文档后写覆盖先写
    write_lock: Mutex<()>,
}

impl FileStateStore {
    /// 打开状态文档；文件不存在时从空状态开始
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("State document {} not found, starting empty", path.display());
                QueueState::new()
            }
            Err(e) => {
                return Err(CallError::TransientStore(format!(
                    "read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let (tx, _) = watch::channel(state);
        Ok(Self {
            path,
            tx,
            write_lock: Mutex::new(()),
        })
    }

    /// 文档路径
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self) -> Result<QueueState> {
        Ok(self.tx.borrow().clone())
    }

    async fn set(&self, state: QueueState) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let bytes = serde_json::to_vec_pretty(&state)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    CallError::TransientStore(format!("mkdir {}: {}", parent.display(), e))
                })?;
            }
        }
        tokio::fs::write(&self.path, bytes).await.map_err(|e| {
            CallError::TransientStore(format!("write {}: {}", self.path.display(), e))
        })?;

        self.tx.send_replace(state);
        Ok(())
    }

    fn subscribe(&self) -> StateSubscription {
        StateSubscription::new(self.tx.subscribe())
    }
}
