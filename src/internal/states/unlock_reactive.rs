//! # UnlockReactiveProperty
//!
//! 无锁响应式属性容器，基于 [`tokio::sync::watch`] 实现。
//!
//! 下载器用它发布下载状态与进度，调用方在下载进行中随时读取或监听：
//! ```rust,no_run
//! use range_fetch::states::unlock_reactive::UnlockReactiveProperty;
//!
//! let prop = UnlockReactiveProperty::new(0u64);
//! prop.update(1);
//! prop.update_field(|v| *v += 1);
//! assert_eq!(prop.get_current(), Some(2));
//! ```

pub use super::reactive_core::{
    PropertyWatcher, ReactivePropertyError as UnlockReactivePropertyError,
};

/// 轻量级响应式属性容器，读写不阻塞，适合高频更新场景（如下载进度）。
pub type UnlockReactiveProperty<T> = super::reactive_core::ReactiveProperty<T>;
