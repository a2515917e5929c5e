//! 分片并发下载器
//!
//! 把一个远程文件按字节区间切成若干分片，用受限的并发数同时下载，
//! 每个分片直接写入预分配好的本地文件的对应偏移，失败的分片请求单独重试。
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! # use range_fetch::downloader::{DownloadConfig, ParallelDownloader};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = ParallelDownloader::with_config(DownloadConfig::default())?
//!     .save_to_dir("downloads")
//!     .max_parallel(4)
//!     .max_retries(3);
//!
//! let progress = downloader.progress();
//! let path = downloader.download("https://example.com/archive.zip").await?;
//! println!("已保存到 {}，共 {:?} 字节", path.display(), progress.map(|p| p.bytes_done));
//! # Ok(())
//! # }
//! ```
//!
//! ## 下载流程
//!
//! 1. 校验配置（负数直接报错，0 填充默认值），校验 URL
//! 2. HEAD 请求获取文件大小与文件名；失败时不创建任何文件
//! 3. 预分配目标文件（失败时不删除已有文件），按分片大小规划区间
//! 4. 每个分片一个任务，信号量限制同时下载的分片数
//! 5. 第一个失败的分片记录错误并发出取消信号，尚未开始的分片不再执行
//! 6. 等待全部任务结束；有错误时删除目标文件并返回该错误
//!
//! ## 内部实现说明
//!
//! - `chunked_download` 子模块：分片规划、单分片请求与重试、任务调度、写盘

mod chunked_download;

use std::path::{Path, PathBuf};

use reqwest::Client;
use tracing::{info, instrument, warn};

use crate::internal::remote_file::probe::{parse_remote_url, probe_remote_file};
use crate::internal::states::unlock_reactive::UnlockReactiveProperty;
use crate::internal::storage::local_sink;

use super::download_config::{DownloadConfig, DEFAULT_REQUEST_TIMEOUT};
use super::download_error::DownloadError;
use super::download_progress::DownloadProgress;
use super::download_status::DownloadStatus;
use super::reactive_state::ParallelDownloaderReactiveState;
use chunked_download::{run_chunked_download, RunChunkedDownloadParams};

#[cfg(test)]
pub(crate) use chunked_download::{planner, range_request, spawn_tasks};

/// 分片并发下载器
///
/// 拥有响应式属性（通过 `status()`、`progress()` 获取），下载进行中可随时读取或监听。
#[derive(Debug)]
pub struct ParallelDownloader {
    client: Client,
    config: DownloadConfig,
    save_dir: Option<PathBuf>,
    reactive_state: ParallelDownloaderReactiveState,
}

impl ParallelDownloader {
    /// 使用调用方提供的 HTTP 客户端创建下载器（超时等设置以该客户端为准）。
    pub fn new(client: Client, config: DownloadConfig) -> Self {
        Self {
            client,
            config,
            save_dir: None,
            reactive_state: ParallelDownloaderReactiveState::default(),
        }
    }

    /// 使用默认 HTTP 客户端（单次请求超时 10 分钟）创建下载器。
    pub fn with_config(config: DownloadConfig) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(DownloadError::ClientBuild)?;
        Ok(Self::new(client, config))
    }

    /// 设置保存目录；不调用则保存到当前工作目录。文件名取自 URL 最后一段路径。
    pub fn save_to_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.save_dir = if dir.as_os_str().is_empty() {
            None
        } else {
            Some(dir.to_path_buf())
        };
        self
    }

    /// 设置最大并发分片数；0 表示每个分片一个任务。
    pub fn max_parallel(mut self, max_parallel: i64) -> Self {
        self.config.max_parallel = max_parallel;
        self
    }

    /// 设置分片大小（字节）
    pub fn chunk_size(mut self, chunk_size: i64) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// 设置分片失败最大重试次数
    pub fn max_retries(mut self, max_retries: i64) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// 设置重试间隔（毫秒）
    pub fn retry_delay_ms(mut self, retry_delay_ms: i64) -> Self {
        self.config.retry_delay_ms = retry_delay_ms;
        self
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// 下载状态；返回可共享句柄，`.watch()` 后 `changed().await` 监听。
    pub fn status(&self) -> UnlockReactiveProperty<DownloadStatus> {
        self.reactive_state.download_status.clone()
    }

    /// 下载进度；返回可共享句柄，`.watch()` 后 `changed().await` 监听。
    pub fn progress(&self) -> UnlockReactiveProperty<DownloadProgress> {
        self.reactive_state.progress.clone()
    }

    /// 执行下载，全部分片结束后返回本地文件路径。
    ///
    /// 任一分片最终失败时返回第一个错误，且目标文件已被删除。
    #[instrument(skip_all, fields(url = %url))]
    pub async fn download(&self, url: &str) -> Result<PathBuf, DownloadError> {
        let status = &self.reactive_state.download_status;
        status.update(DownloadStatus::Planning);

        match self.run(url).await {
            Ok(path) => {
                status.update(DownloadStatus::Succeeded);
                info!(path = %path.display(), "下载完成");
                Ok(path)
            }
            Err(err) => {
                status.update(DownloadStatus::Failed);
                warn!(error = %err, "下载失败");
                Err(err)
            }
        }
    }

    async fn run(&self, url: &str) -> Result<PathBuf, DownloadError> {
        let config = self.config.validate()?;
        let remote_url = parse_remote_url(url)?;
        let stat = probe_remote_file(&self.client, &remote_url).await?;

        let path = match &self.save_dir {
            Some(dir) => dir.join(&stat.suggested_name),
            None => PathBuf::from(&stat.suggested_name),
        };
        info!(
            path = %path.display(),
            total = stat.total_length,
            "开始分片下载"
        );

        // 预分配失败时目标文件未被改动（或已由 preallocate 自行清理），不做删除
        local_sink::preallocate(&path, stat.total_length).await?;

        self.reactive_state.progress.update(DownloadProgress {
            bytes_done: 0,
            total: Some(stat.total_length),
        });
        self.reactive_state
            .download_status
            .update(DownloadStatus::Running);

        let result = run_chunked_download(RunChunkedDownloadParams {
            client: self.client.clone(),
            url: remote_url.to_string(),
            path: path.clone(),
            total: stat.total_length,
            config,
            progress: self.reactive_state.progress.clone(),
        })
        .await;

        if let Err(err) = result {
            if let Err(cleanup_err) = local_sink::remove(&path).await {
                warn!(error = %cleanup_err, "清理未完成的文件失败");
            }
            return Err(err);
        }
        Ok(path)
    }
}
