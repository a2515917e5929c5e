//! 分片下载：发起单段 Range 请求，失败时按配置重试，返回响应供流式读取。

use std::time::Duration;

use reqwest::header::RANGE;
use reqwest::{Client, Response, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::internal::downloader::structs::{ChunkFailure, ChunkRange, DownloadError};

use super::planner::range_header;

/// 发起 Range 请求时的参数（形参超过 3 个，用 struct 承载）。
pub struct FetchRangeParams<'a> {
    pub client: &'a Client,
    pub url: &'a str,
    pub range: ChunkRange,
    /// 文件总大小，用于判断 200 响应是否合法
    pub total: u64,
    /// 首次请求之外的额外尝试次数
    pub retries: usize,
    pub retry_delay: Duration,
    pub cancel: &'a CancellationToken,
}

/// 发起单段 Range GET 请求，返回 2xx 响应供调用方做 `bytes_stream()`。
///
/// 网络错误或状态码 >= 300 视为一次失败，最多再尝试 `retries` 次；
/// 每次尝试前检查取消信号，已取消则不再发送请求。
/// 重试用完后返回 [`DownloadError::ChunkFetch`]，不会把错误响应体当作分片内容。
pub async fn fetch_range_response(
    params: FetchRangeParams<'_>,
) -> Result<Response, DownloadError> {
    let header = range_header(&params.range);
    let covers_whole_file = params.range.start == 0 && params.range.end >= params.total;
    let mut attempts = 0usize;

    loop {
        if params.cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }
        attempts += 1;
        debug!(range = %params.range, attempt = attempts, "发起分片请求");

        let failure = match params
            .client
            .get(params.url)
            .header(RANGE, &header)
            .send()
            .await
        {
            Ok(resp) if resp.status() == StatusCode::OK && !covers_whole_file => {
                return Err(DownloadError::RangeNotSupported {
                    range: params.range,
                });
            }
            Ok(resp) if resp.status().is_success() => return Ok(resp),
            Ok(resp) => ChunkFailure::Status(resp.status()),
            Err(e) => ChunkFailure::Request(e),
        };

        if attempts > params.retries {
            return Err(DownloadError::ChunkFetch {
                range: params.range,
                attempts,
                failure,
            });
        }

        warn!(
            range = %params.range,
            attempt = attempts,
            error = %failure,
            "分片请求失败，准备重试"
        );
        if !params.retry_delay.is_zero() {
            tokio::time::sleep(params.retry_delay).await;
        }
    }
}
