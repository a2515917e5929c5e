//! 分片规划：按分片大小把 `[0, total)` 切成首尾相接的区间，并计算并发上限。

use crate::internal::downloader::structs::{ChunkRange, ChunkSizing, ResolvedConfig};

/// 生成单个 Range 请求头：`bytes=start-(end-1)`，区间为左闭右开，请求头为闭区间。
pub(crate) fn range_header(range: &ChunkRange) -> String {
    format!("bytes={}-{}", range.start, range.last_byte())
}

/// 本次下载实际使用的分片大小。
///
/// 调用方没有显式指定分片大小、但指定了最大并发数时，
/// 分片大小取 `ceil(total / max_parallel)`，分片数因此不会超过最大并发数。
pub(crate) fn effective_chunk_size(total: u64, config: &ResolvedConfig) -> u64 {
    match config.chunk_size {
        ChunkSizing::Default(_) if config.max_parallel > 0 => {
            total.div_ceil(config.max_parallel as u64).max(1)
        }
        sizing => sizing.bytes().max(1),
    }
}

/// 从 0 到 total 按 chunk_size 切段；最后一段可能不足 chunk_size。total 为 0 时返回空列表。
pub(crate) fn plan_chunks(total: u64, chunk_size: u64) -> Vec<ChunkRange> {
    let chunk_size = chunk_size.max(1);
    let mut ranges = Vec::with_capacity(total.div_ceil(chunk_size) as usize);
    let mut start = 0u64;
    while start < total {
        let end = start.saturating_add(chunk_size).min(total);
        ranges.push(ChunkRange::new(start, end));
        start = end;
    }
    ranges
}

/// 同时下载的分片数上限；未设置最大并发数时每个分片各占一个名额。
///
/// 上限不超过分片数，任务数本来就不会超过分片数。
pub(crate) fn concurrency_ceiling(config: &ResolvedConfig, chunk_count: usize) -> usize {
    let chunk_count = chunk_count.max(1);
    match config.max_parallel {
        0 => chunk_count,
        n => n.min(chunk_count),
    }
}
