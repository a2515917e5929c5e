//! 基于 tokio fs 的本地文件读写。
//!
//! 各分片任务各自打开独立的文件句柄，写入互不重叠的字节区间，因此写入不需要加锁。

use std::io::SeekFrom;
use std::path::Path;

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncSeekExt;

use crate::internal::downloader::structs::StorageError;

/// 创建（或截断已存在的）文件，并把长度设置为 `size` 字节。
///
/// 打开失败时不改动已有文件；设置长度失败时文件已被截断，删除后再返回错误。
pub async fn preallocate(path: &Path, size: u64) -> Result<(), StorageError> {
    let file = File::create(path)
        .await
        .map_err(|source| StorageError::Preallocate {
            path: path.to_path_buf(),
            source,
        })?;
    if let Err(source) = file.set_len(size).await {
        drop(file);
        let _ = remove(path).await;
        return Err(StorageError::Preallocate {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// 以写方式打开已存在的文件（不截断），并定位到 `offset`。
pub async fn open_at(path: &Path, offset: u64) -> Result<File, StorageError> {
    let open_err = |source| StorageError::Open {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .map_err(open_err)?;
    file.seek(SeekFrom::Start(offset)).await.map_err(open_err)?;
    Ok(file)
}

/// 删除文件；文件本就不存在时视为成功，可重复调用。
pub async fn remove(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StorageError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}
