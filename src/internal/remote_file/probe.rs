//! 获取远程文件元数据：只发 HEAD 请求，不传输响应体，也不重试。

use chrono::DateTime;
use percent_encoding::percent_decode_str;
use reqwest::header::{HeaderMap, HeaderName, ACCEPT_RANGES, CONTENT_LENGTH, ETAG, LAST_MODIFIED};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::internal::downloader::structs::{DownloadError, ProbeError};

use super::structs::remote_file_stat::RemoteFileStat;

/// URL 中取不到可用文件名时使用的默认文件名。
pub const DEFAULT_FILE_NAME: &str = "download";

/// 解析并校验下载地址：必须是带主机名的 http/https 绝对地址。
pub fn parse_remote_url(raw: &str) -> Result<Url, DownloadError> {
    let invalid = |reason: String| DownloadError::InvalidInput {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("不支持的协议: {}", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("缺少主机名".to_string()));
    }
    Ok(url)
}

/// 发送 HEAD 请求，读取文件大小、ETag 等元数据。
///
/// 文件大小直接取自 `Content-Length` 响应头；HEAD 响应没有响应体，不能用响应体长度代替。
pub async fn probe_remote_file(client: &Client, url: &Url) -> Result<RemoteFileStat, ProbeError> {
    let resp = client
        .head(url.clone())
        .send()
        .await
        .map_err(ProbeError::Request)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ProbeError::Status(status));
    }

    let headers = resp.headers();
    let total_length = header_str(headers, CONTENT_LENGTH)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or(ProbeError::UnknownLength)?;

    let stat = RemoteFileStat {
        total_length,
        etag: header_str(headers, ETAG).map(clean_etag),
        suggested_name: suggested_file_name(url),
        last_modified: header_str(headers, LAST_MODIFIED)
            .and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok()),
        accept_ranges: header_str(headers, ACCEPT_RANGES)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("bytes")),
    };
    debug!(
        total = stat.total_length,
        name = %stat.suggested_name,
        etag = ?stat.etag,
        "获取远程文件信息完成"
    );
    Ok(stat)
}

/// 由 URL 最后一个非空路径段得到本地文件名（做百分号解码）。
///
/// 没有可用路径段，或解码后是 `.`/`..`、含路径分隔符时，返回 [`DEFAULT_FILE_NAME`]。
pub fn suggested_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .filter(|name| is_usable_file_name(name))
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
}

fn is_usable_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// 去掉弱校验前缀 `W/` 和两侧引号。
fn clean_etag(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw.strip_prefix("W/").unwrap_or(raw);
    raw.trim_matches('"').to_string()
}
