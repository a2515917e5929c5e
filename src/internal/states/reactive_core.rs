//! # ReactiveProperty 响应式属性内核
//!
//! 下载器对外暴露的状态（下载状态机、已下载字节数）都基于本模块实现，
//! 内部使用 [`tokio::sync::watch`]：写入不阻塞，监听方只关心最新值。
//!
//! 对外通过 [`super::unlock_reactive`] 导出。

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::sync::watch::error::RecvError;

// ──────────────────────────── Error ────────────────────────────

/// 响应式属性统一错误类型
#[derive(Debug, Error)]
pub enum ReactivePropertyError {
    /// 属性已被销毁，监听器不会再收到新值
    #[error("属性已被销毁")]
    Destroyed,

    /// watch 通道接收失败
    #[error("接收失败: {0}")]
    RecvError(#[from] RecvError),
}

// ──────────────────────────── Inner ────────────────────────────

/// 内部共享状态。最后一个属性句柄释放时向监听者广播 `None`，表示属性已销毁。
#[derive(Debug)]
pub(crate) struct Inner<T> {
    pub(crate) sender: watch::Sender<Option<T>>,
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        let _ = self.sender.send(None);
    }
}

// ──────────────────────────── ReactiveProperty ────────────────────────────

/// 响应式属性内核：可克隆的共享句柄，克隆后的句柄读写同一个值。
#[derive(Clone, Debug)]
pub struct ReactiveProperty<T: Clone + Send + Sync> {
    pub(crate) inner: Arc<Inner<T>>,
}

impl<T> ReactiveProperty<T>
where
    T: Clone + Send + Sync,
{
    /// 创建一个新的响应式属性。
    pub fn new(value: T) -> Self {
        let (sender, _) = watch::channel(Some(value));
        Self {
            inner: Arc::new(Inner { sender }),
        }
    }

    /// 覆盖当前值，所有监听者都会收到通知。
    pub fn update(&self, new_value: T) {
        self.inner.sender.send_replace(Some(new_value));
    }

    /// 在通道锁内原地修改当前值。
    ///
    /// 多个分片任务并发上报进度时，读-改-写在同一把锁内完成，不会互相覆盖。
    pub fn update_field<F>(&self, updater: F)
    where
        F: FnOnce(&mut T),
    {
        self.inner.sender.send_modify(|current| {
            if let Some(value) = current.as_mut() {
                updater(value);
            }
        });
    }

    /// 获取当前值的快照（会 clone）。
    pub fn get_current(&self) -> Option<T> {
        self.inner.sender.borrow().clone()
    }

    /// 对当前值应用转换函数；属性已销毁时返回 `None`。
    pub fn map<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        self.inner.sender.borrow().as_ref().map(f)
    }

    /// 创建一个监听器，用于异步监听属性值的变化。
    pub fn watch(&self) -> PropertyWatcher<T> {
        PropertyWatcher {
            receiver: self.inner.sender.subscribe(),
        }
    }
}

// ──────────────────────────── PropertyWatcher ────────────────────────────

/// 属性监听器，用于异步接收属性值的变化。
pub struct PropertyWatcher<T> {
    receiver: watch::Receiver<Option<T>>,
}

impl<T> PropertyWatcher<T>
where
    T: Clone + Send + Sync,
{
    /// 异步等待属性值的变化，返回新值。
    pub async fn changed(&mut self) -> Result<T, ReactivePropertyError> {
        self.receiver.changed().await?;
        match self.receiver.borrow_and_update().as_ref() {
            None => Err(ReactivePropertyError::Destroyed),
            Some(value) => Ok(value.clone()),
        }
    }

    /// 等待直到当前值满足条件，返回满足条件的值。
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Result<T, ReactivePropertyError>
    where
        F: FnMut(&T) -> bool,
    {
        let value = self
            .receiver
            .wait_for(|v| v.as_ref().is_none_or(&mut predicate))
            .await?;
        match value.as_ref() {
            None => Err(ReactivePropertyError::Destroyed),
            Some(v) => Ok(v.clone()),
        }
    }

    /// 同步获取当前值的克隆。
    pub fn borrow(&self) -> Option<T> {
        self.receiver.borrow().clone()
    }
}
