//! 分片字节区间。

use std::fmt;

/// 一个分片在整个文件中的字节区间，左闭右开 `[start, end)`。
///
/// 由分片规划生成，保证 `start < end`；同一次下载的所有区间首尾相接、互不重叠，
/// 覆盖 `[0, 文件大小)`。发往服务器的 `Range` 头使用闭区间写法，见 `range_header`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkRange {
    /// 起始偏移（包含）
    pub start: u64,
    /// 结束偏移（不包含）
    pub end: u64,
}

impl ChunkRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// 区间字节数。
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 区间最后一个字节的偏移（闭区间上界）。
    pub fn last_byte(&self) -> u64 {
        self.end.saturating_sub(1)
    }
}

impl fmt::Display for ChunkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
