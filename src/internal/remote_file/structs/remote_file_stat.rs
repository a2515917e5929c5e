use chrono::{DateTime, FixedOffset};

/// 远程文件元数据，每次下载只获取一次，之后只读。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileStat {
    pub total_length: u64,                            // 文件大小（字节），来自 Content-Length
    pub etag: Option<String>,                         // 清理后的 ETag
    pub suggested_name: String,                       // 由 URL 最后一段路径得到的文件名
    pub last_modified: Option<DateTime<FixedOffset>>, // 原始时间
    pub accept_ranges: bool,                          // 服务器是否声明 Accept-Ranges: bytes
}
