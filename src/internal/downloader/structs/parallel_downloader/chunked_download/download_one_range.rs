//! 分片下载：单个分片任务的主体，请求成功后把响应体流式写入文件对应偏移。

use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::internal::downloader::structs::{
    ChunkRange, DownloadError, DownloadProgress, StorageError,
};
use crate::internal::states::unlock_reactive::UnlockReactiveProperty;
use crate::internal::storage::local_sink;

use super::chunk_handler::{handle_one_chunk, HandleOneChunkParams};
use super::range_request::{fetch_range_response, FetchRangeParams};

/// 执行单段 Range 下载时的参数（形参超过 3 个，用 struct 承载）。
pub struct DownloadOneRangeParams {
    pub client: reqwest::Client,
    pub url: Arc<str>,
    pub path: Arc<PathBuf>,
    pub range: ChunkRange,
    pub total: u64,
    pub retries: usize,
    pub retry_delay: Duration,
    pub cancel: CancellationToken,
    pub bytes_done: Arc<AtomicU64>,
    pub progress: UnlockReactiveProperty<DownloadProgress>,
}

/// 执行单段 Range 下载：拿到响应后打开独立的文件句柄，定位到分片起点，逐块写入。
pub async fn download_one_range(params: DownloadOneRangeParams) -> Result<(), DownloadError> {
    let resp = fetch_range_response(FetchRangeParams {
        client: &params.client,
        url: &params.url,
        range: params.range,
        total: params.total,
        retries: params.retries,
        retry_delay: params.retry_delay,
        cancel: &params.cancel,
    })
    .await?;

    let mut file = local_sink::open_at(&params.path, params.range.start).await?;
    let mut stream = resp.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|source| DownloadError::ChunkBody {
            range: params.range,
            source,
        })?;

        handle_one_chunk(HandleOneChunkParams {
            chunk,
            range: params.range,
            written: &mut written,
            file: &mut file,
            path: &params.path,
            bytes_done: &params.bytes_done,
            progress: &params.progress,
        })
        .await?;

        if written >= params.range.len() {
            break;
        }
    }

    file.flush().await.map_err(|source| StorageError::Write {
        path: params.path.to_path_buf(),
        source,
    })?;

    if written < params.range.len() {
        return Err(DownloadError::ShortBody {
            range: params.range,
            expected: params.range.len(),
            received: written,
        });
    }

    debug!(range = %params.range, bytes = written, "分片写入完成");
    Ok(())
}
