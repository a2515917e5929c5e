//! 分片下载入口：规划分片、按并发上限执行全部分片任务。

use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::internal::downloader::structs::{DownloadError, DownloadProgress, ResolvedConfig};
use crate::internal::states::unlock_reactive::UnlockReactiveProperty;

use super::download_one_range::{download_one_range, DownloadOneRangeParams};
use super::planner::{concurrency_ceiling, effective_chunk_size, plan_chunks};
use super::spawn_tasks::run_chunk_tasks;

/// 分片下载参数（形参超过 3 个，用 struct 承载）。
pub struct RunChunkedDownloadParams {
    pub client: reqwest::Client,
    pub url: String,
    pub path: PathBuf,
    pub total: u64,
    pub config: ResolvedConfig,
    pub progress: UnlockReactiveProperty<DownloadProgress>,
}

/// 分片下载入口：已知 total，目标文件已由调用方预分配，按分片并发下载。
///
/// 失败时不清理文件，由调用方统一删除。
pub(crate) async fn run_chunked_download(
    params: RunChunkedDownloadParams,
) -> Result<(), DownloadError> {
    let chunk_size = effective_chunk_size(params.total, &params.config);
    let ranges = plan_chunks(params.total, chunk_size);
    if ranges.is_empty() {
        debug!("文件大小为 0，无需下载分片");
        return Ok(());
    }
    let ceiling = concurrency_ceiling(&params.config, ranges.len());
    debug!(
        chunks = ranges.len(),
        chunk_size,
        ceiling,
        "分片规划完成"
    );

    let client = params.client;
    let url: Arc<str> = Arc::from(params.url);
    let path = Arc::new(params.path);
    let total = params.total;
    let retries = params.config.max_retries;
    let retry_delay = params.config.retry_delay;
    let bytes_done = Arc::new(AtomicU64::new(0));
    let progress = params.progress;

    run_chunk_tasks(ranges, ceiling, CancellationToken::new(), move |range, cancel| {
        download_one_range(DownloadOneRangeParams {
            client: client.clone(),
            url: Arc::clone(&url),
            path: Arc::clone(&path),
            range,
            total,
            retries,
            retry_delay,
            cancel,
            bytes_done: Arc::clone(&bytes_done),
            progress: progress.clone(),
        })
    })
    .await
}
