//! 下载配置：调用方填写的原始配置，以及校验后供下载流程使用的配置。
//!
//! 原始配置允许出现负数（例如从外部输入反序列化而来），负数在校验时被拒绝；
//! 0 表示「使用默认值」，默认值只在 [`DownloadConfig::validate`] 中填入，
//! 校验本身不修改原始配置。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::download_error::ConfigError;

/// 默认分片大小：10MB
pub const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

/// 默认重试次数（首次请求之外的额外尝试次数）
pub const DEFAULT_MAX_RETRIES: usize = 5;

/// 默认重试间隔（毫秒）；0 表示失败后立即重试
pub const DEFAULT_RETRY_DELAY_MS: u64 = 0;

/// 默认单次请求超时：10 分钟
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// 调用方提供的下载配置，所有字段为 0 时全部使用默认值。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// 最大并发分片数；0 表示每个分片一个任务、不设上限。
    /// 未指定分片大小时，分片大小由文件大小和该值推导。
    pub max_parallel: i64,
    /// 每个分片的大小（字节）；0 表示使用默认值或按并发数推导
    pub chunk_size: i64,
    /// 分片失败后的最大重试次数；0 表示使用默认值
    pub max_retries: i64,
    /// 两次重试之间的等待时间（毫秒）
    pub retry_delay_ms: i64,
}

impl DownloadConfig {
    /// 校验并填充默认值，返回下载流程实际使用的配置。
    pub fn validate(&self) -> Result<ResolvedConfig, ConfigError> {
        if self.max_parallel < 0 {
            return Err(ConfigError::NegativeMaxParallel(self.max_parallel));
        }
        if self.chunk_size < 0 {
            return Err(ConfigError::NegativeChunkSize(self.chunk_size));
        }
        if self.max_retries < 0 {
            return Err(ConfigError::NegativeMaxRetries(self.max_retries));
        }
        if self.retry_delay_ms < 0 {
            return Err(ConfigError::NegativeRetryDelay(self.retry_delay_ms));
        }

        let chunk_size = match self.chunk_size {
            0 => ChunkSizing::Default(DEFAULT_CHUNK_SIZE),
            n => ChunkSizing::Fixed(n as u64),
        };
        let max_retries = match self.max_retries {
            0 => DEFAULT_MAX_RETRIES,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };
        let retry_delay = match self.retry_delay_ms {
            0 => Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            n => Duration::from_millis(n as u64),
        };

        Ok(ResolvedConfig {
            max_parallel: usize::try_from(self.max_parallel).unwrap_or(usize::MAX),
            chunk_size,
            max_retries,
            retry_delay,
        })
    }
}

/// 分片大小的来源：调用方显式指定，或使用默认值。
///
/// 未显式指定且设置了最大并发数时，分片规划会改为按并发数推导分片大小。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSizing {
    Default(u64),
    Fixed(u64),
}

impl ChunkSizing {
    pub fn bytes(&self) -> u64 {
        match *self {
            ChunkSizing::Default(n) | ChunkSizing::Fixed(n) => n,
        }
    }
}

/// 校验后的下载配置：分片大小与重试次数一定非 0。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// 最大并发分片数；0 表示每个分片一个任务
    pub max_parallel: usize,
    pub chunk_size: ChunkSizing,
    pub max_retries: usize,
    pub retry_delay: Duration,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            max_parallel: 0,
            chunk_size: ChunkSizing::Default(DEFAULT_CHUNK_SIZE),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}
