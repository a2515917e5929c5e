//! 下载相关错误类型。

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use super::chunk_range::ChunkRange;

/// 下载配置校验失败。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("最大并发数不能为负数: {0}")]
    NegativeMaxParallel(i64),

    #[error("分片大小不能为负数: {0}")]
    NegativeChunkSize(i64),

    #[error("重试次数不能为负数: {0}")]
    NegativeMaxRetries(i64),

    #[error("重试间隔不能为负数: {0}")]
    NegativeRetryDelay(i64),
}

/// 获取远程文件元数据（HEAD 请求）失败。
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("HEAD 请求失败: {0}")]
    Request(#[source] reqwest::Error),

    #[error("HEAD 请求返回异常状态码: {0}")]
    Status(StatusCode),

    /// 响应头中没有可用的 Content-Length，无法规划分片。
    #[error("无法从响应头获取文件大小")]
    UnknownLength,
}

/// 本地文件读写失败。
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("预分配文件空间失败 {}: {source}", .path.display())]
    Preallocate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("打开文件失败 {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("写入文件失败 {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("删除文件失败 {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 单次分片请求失败的原因。
#[derive(Debug, Error)]
pub enum ChunkFailure {
    #[error("HTTP 请求失败: {0}")]
    Request(#[source] reqwest::Error),

    #[error("服务器返回状态码 {0}")]
    Status(StatusCode),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("下载配置无效: {0}")]
    Config(#[from] ConfigError),

    #[error("URL 无效 `{url}`: {reason}")]
    InvalidInput { url: String, reason: String },

    #[error("获取远程文件信息失败: {0}")]
    MetadataProbe(#[from] ProbeError),

    /// 分片在用完重试次数后仍然失败。
    #[error("分片 {range} 下载失败，共尝试 {attempts} 次: {failure}")]
    ChunkFetch {
        range: ChunkRange,
        attempts: usize,
        #[source]
        failure: ChunkFailure,
    },

    /// 服务器忽略了 Range 头，对部分区间返回了 200 整文件。
    #[error("服务器不支持 Range 请求，分片 {range} 收到 200 OK")]
    RangeNotSupported { range: ChunkRange },

    #[error("分片 {range} 读取响应体失败: {source}")]
    ChunkBody {
        range: ChunkRange,
        #[source]
        source: reqwest::Error,
    },

    #[error("分片 {range} 响应体不完整: 期望 {expected} 字节，实际 {received} 字节")]
    ShortBody {
        range: ChunkRange,
        expected: u64,
        received: u64,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("创建 HTTP 客户端失败: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("下载被取消")]
    Cancelled,

    #[error("分片任务失败: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
