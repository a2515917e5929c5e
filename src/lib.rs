/// 内部导出的模块
mod internal;


/// 导出核心入口
pub use internal::downloader::structs::{DownloadConfig, DownloadError, ParallelDownloader};

/// 分片并发下载器：配置、错误、状态与下载入口
pub mod downloader {
    use crate::internal;
    pub use internal::downloader::structs::*;
}

/// 远程文件元数据，可单独用于获取文件大小与文件名
pub mod remote_file {
    use crate::internal;
    pub use internal::remote_file::probe::*;
    pub use internal::remote_file::structs::remote_file_stat::RemoteFileStat;
}

/// 本地文件读写：预分配、按偏移打开、删除
pub mod storage {
    use crate::internal;
    pub use internal::storage::local_sink::*;
}

pub mod states {
    pub mod unlock_reactive {
        use crate::internal;
        pub use internal::states::unlock_reactive::*;
    }
}
