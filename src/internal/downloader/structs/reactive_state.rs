use crate::internal::states::unlock_reactive::UnlockReactiveProperty;

use super::download_progress::DownloadProgress;
use super::download_status::DownloadStatus;

/// 下载器响应式状态
#[derive(Debug, Clone)]
pub struct ParallelDownloaderReactiveState {
    /// 下载状态（只读）：内部随下载阶段更新，外部通过 watch 监听
    pub download_status: UnlockReactiveProperty<DownloadStatus>,
    /// 下载进度（只读）：各分片任务写盘后累加
    pub progress: UnlockReactiveProperty<DownloadProgress>,
}

impl Default for ParallelDownloaderReactiveState {
    fn default() -> Self {
        Self {
            download_status: UnlockReactiveProperty::new(DownloadStatus::Planning),
            progress: UnlockReactiveProperty::new(DownloadProgress::default()),
        }
    }
}
