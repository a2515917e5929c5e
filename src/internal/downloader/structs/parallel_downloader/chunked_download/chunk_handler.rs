//! 分片下载：处理响应体中的单块数据，写入文件并更新进度。

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::internal::downloader::structs::{
    ChunkRange, DownloadError, DownloadProgress, StorageError,
};
use crate::internal::states::unlock_reactive::UnlockReactiveProperty;

/// 处理单块数据时的参数（形参超过 3 个，用 struct 承载）。
pub struct HandleOneChunkParams<'a> {
    pub chunk: bytes::Bytes,
    pub range: ChunkRange,
    /// 本分片已写入的字节数
    pub written: &'a mut u64,
    /// 已定位到本分片当前写入位置的文件句柄
    pub file: &'a mut File,
    pub path: &'a Path,
    pub bytes_done: &'a AtomicU64,
    pub progress: &'a UnlockReactiveProperty<DownloadProgress>,
}

/// 将一块数据写入文件并更新整体进度。
///
/// 超出分片区间的部分被丢弃，保证不会覆盖相邻分片的字节。
pub async fn handle_one_chunk(params: HandleOneChunkParams<'_>) -> Result<(), DownloadError> {
    let remaining = params.range.len().saturating_sub(*params.written);
    let take = (params.chunk.len() as u64).min(remaining) as usize;
    if take == 0 {
        return Ok(());
    }

    params
        .file
        .write_all(&params.chunk[..take])
        .await
        .map_err(|source| StorageError::Write {
            path: params.path.to_path_buf(),
            source,
        })?;
    *params.written += take as u64;

    let current = params.bytes_done.fetch_add(take as u64, Ordering::Relaxed) + take as u64;
    params.progress.update_field(|p| {
        p.bytes_done = p.bytes_done.max(current);
    });

    Ok(())
}
