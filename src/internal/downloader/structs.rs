pub mod chunk_range;
pub mod download_config;
pub mod download_error;
pub mod download_progress;
pub mod download_status;
pub mod parallel_downloader;
pub mod reactive_state;

// 重导出公共类型
pub use chunk_range::ChunkRange;
pub use download_config::{
    ChunkSizing, DownloadConfig, ResolvedConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_DELAY_MS,
};
pub use download_error::{ChunkFailure, ConfigError, DownloadError, ProbeError, StorageError};
pub use download_progress::DownloadProgress;
pub use download_status::DownloadStatus;
pub use parallel_downloader::ParallelDownloader;
pub use reactive_state::ParallelDownloaderReactiveState;
