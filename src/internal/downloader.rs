//! 下载器领域模块：分片并发下载的配置、错误、状态与执行逻辑。
//!
//! 使用方式：`ParallelDownloader::new(client, config).save_to_dir(dir).download(url).await`
//! 对外导出以 [`crate::downloader`] 为准，此处仅做模块划分。

pub mod structs;
