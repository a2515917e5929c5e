//! 下载器端到端测试：本地 wiremock 服务器提供 HEAD + Range GET，下载到临时目录后逐字节比对。
//!
//! 覆盖：小文件多分片、大文件并发、空文件、分片重试、重试用尽、服务器忽略 Range、
//! 响应体不完整、URL 与配置校验、下载状态与进度。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::{Client, StatusCode};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use crate::downloader::{
    ChunkFailure, ConfigError, DownloadConfig, DownloadError, DownloadProgress, DownloadStatus,
    ParallelDownloader, ProbeError, StorageError,
};
use crate::tests::{
    init_tracing, mount_head, mount_remote_file, parse_range_header, random_bytes,
    FlakyResponder, SAMPLE_TEXT,
};

fn downloader_in(dir: &TempDir, config: DownloadConfig) -> ParallelDownloader {
    ParallelDownloader::with_config(config)
        .unwrap()
        .save_to_dir(dir.path())
}

/// 目录下的文件数
fn file_count(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

// ═══════════════════════════════════════════════════════════════
// 成功路径
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn small_file_in_many_chunks_is_byte_identical() {
    init_tracing();
    let server = MockServer::start().await;
    mount_remote_file(&server, "/file.txt", SAMPLE_TEXT.as_bytes()).await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_in(
        &dir,
        DownloadConfig {
            chunk_size: 10,
            max_retries: 1,
            ..Default::default()
        },
    );

    let saved = downloader
        .download(&format!("{}/file.txt", server.uri()))
        .await
        .unwrap();

    assert_eq!(saved, dir.path().join("file.txt"));
    assert_eq!(std::fs::read(&saved).unwrap(), SAMPLE_TEXT.as_bytes());

    // HEAD 1 次 + 5 个分片各 1 次 GET
    let requests = server.received_requests().await.unwrap();
    let ranges: Vec<_> = requests
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .filter_map(|r| r.headers.get("range"))
        .filter_map(|v| v.to_str().ok().and_then(parse_range_header))
        .collect();
    assert_eq!(ranges.len(), 5);
    assert!(ranges.contains(&(40, 43)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn large_file_with_bounded_parallelism() {
    init_tracing();
    let body = random_bytes(1024 * 1024 + 123);
    let server = MockServer::start().await;
    mount_remote_file(&server, "/blob.bin", &body).await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_in(
        &dir,
        DownloadConfig {
            max_parallel: 3,
            ..Default::default()
        },
    );

    let saved = downloader
        .download(&format!("{}/blob.bin", server.uri()))
        .await
        .unwrap();
    assert_eq!(std::fs::read(&saved).unwrap(), body);

    // 未指定分片大小时按最大并发数均分，恰好 3 个分片
    let gets = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    assert_eq!(gets, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn explicit_chunk_size_and_parallelism() {
    let body = random_bytes(300_001);
    let server = MockServer::start().await;
    mount_remote_file(&server, "/data/part.bin", &body).await;

    let dir = TempDir::new().unwrap();
    let downloader = ParallelDownloader::new(Client::new(), DownloadConfig::default())
        .save_to_dir(dir.path())
        .max_parallel(4)
        .chunk_size(16 * 1024)
        .max_retries(2);

    let saved = downloader
        .download(&format!("{}/data/part.bin", server.uri()))
        .await
        .unwrap();
    assert_eq!(saved.file_name().unwrap(), "part.bin");
    assert_eq!(std::fs::read(&saved).unwrap(), body);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn huge_max_parallel_is_capped_by_chunk_count() {
    let server = MockServer::start().await;
    mount_remote_file(&server, "/file.txt", SAMPLE_TEXT.as_bytes()).await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_in(
        &dir,
        DownloadConfig {
            max_parallel: i64::MAX,
            chunk_size: 10,
            ..Default::default()
        },
    );
    let saved = downloader
        .download(&format!("{}/file.txt", server.uri()))
        .await
        .unwrap();
    assert_eq!(std::fs::read(&saved).unwrap(), SAMPLE_TEXT.as_bytes());
}

#[tokio::test]
async fn zero_length_file_sends_no_range_request() {
    let server = MockServer::start().await;
    mount_head(&server, "/empty.txt", b"").await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_in(&dir, DownloadConfig::default());
    let saved = downloader
        .download(&format!("{}/empty.txt", server.uri()))
        .await
        .unwrap();

    assert_eq!(std::fs::metadata(&saved).unwrap().len(), 0);
    assert_eq!(downloader.status().get_current(), Some(DownloadStatus::Succeeded));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;
    let hits = Arc::new(AtomicUsize::new(0));
    mount_head(&server, "/file.txt", SAMPLE_TEXT.as_bytes()).await;
    Mock::given(method("GET"))
        .and(path("/file.txt"))
        .respond_with(FlakyResponder::new(
            SAMPLE_TEXT.as_bytes(),
            3,
            Arc::clone(&hits),
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_in(
        &dir,
        DownloadConfig {
            chunk_size: 10,
            max_retries: 5,
            ..Default::default()
        },
    );
    let saved = downloader
        .download(&format!("{}/file.txt", server.uri()))
        .await
        .unwrap();

    assert_eq!(std::fs::read(&saved).unwrap(), SAMPLE_TEXT.as_bytes());
    // 5 个分片成功 + 3 次失败
    assert_eq!(hits.load(Ordering::SeqCst), 8);
}

#[tokio::test]
async fn status_and_progress_reach_completion() {
    let server = MockServer::start().await;
    mount_remote_file(&server, "/file.txt", SAMPLE_TEXT.as_bytes()).await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_in(
        &dir,
        DownloadConfig {
            chunk_size: 7,
            ..Default::default()
        },
    );
    assert_eq!(downloader.status().get_current(), Some(DownloadStatus::Planning));

    let mut status_watcher = downloader.status().watch();
    let finished = tokio::spawn(async move {
        status_watcher
            .wait_for(DownloadStatus::is_finished)
            .await
    });

    downloader
        .download(&format!("{}/file.txt", server.uri()))
        .await
        .unwrap();

    assert_eq!(finished.await.unwrap().unwrap(), DownloadStatus::Succeeded);
    let progress = downloader.progress().get_current().unwrap();
    assert_eq!(
        progress,
        DownloadProgress {
            bytes_done: 44,
            total: Some(44),
        }
    );
    assert_eq!(progress.pct(), 100.0);
}

// ═══════════════════════════════════════════════════════════════
// 失败路径：返回第一个错误并删除目标文件
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn permanent_chunk_failure_removes_file() {
    init_tracing();
    let server = MockServer::start().await;
    mount_head(&server, "/file.txt", SAMPLE_TEXT.as_bytes()).await;
    // 并发上限为 1：第一个分片重试用尽后其余分片不再发起请求
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("fail"))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_in(
        &dir,
        DownloadConfig {
            max_parallel: 1,
            chunk_size: 10,
            max_retries: 1,
            retry_delay_ms: 0,
        },
    );
    let err = downloader
        .download(&format!("{}/file.txt", server.uri()))
        .await
        .unwrap_err();

    match err {
        DownloadError::ChunkFetch {
            attempts,
            failure: ChunkFailure::Status(status),
            ..
        } => {
            assert_eq!(attempts, 2);
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        }
        other => panic!("意外的错误: {other:?}"),
    }
    assert!(!dir.path().join("file.txt").exists());
    assert_eq!(downloader.status().get_current(), Some(DownloadStatus::Failed));
}

#[tokio::test]
async fn server_ignoring_range_fails_download() {
    let server = MockServer::start().await;
    mount_head(&server, "/file.txt", SAMPLE_TEXT.as_bytes()).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_TEXT))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_in(
        &dir,
        DownloadConfig {
            chunk_size: 10,
            ..Default::default()
        },
    );
    let err = downloader
        .download(&format!("{}/file.txt", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::RangeNotSupported { .. }));
    assert_eq!(file_count(&dir), 0);
}

#[tokio::test]
async fn truncated_chunk_body_fails_download() {
    let server = MockServer::start().await;
    mount_head(&server, "/file.txt", SAMPLE_TEXT.as_bytes()).await;
    // 每个分片只返回请求区间的前半部分
    Mock::given(method("GET"))
        .respond_with(|request: &Request| {
            let (start, end) = request
                .headers
                .get("range")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_range_header)
                .unwrap();
            let half = (start + (end - start + 1) / 2) as usize;
            ResponseTemplate::new(206)
                .set_body_bytes(SAMPLE_TEXT.as_bytes()[start as usize..half].to_vec())
        })
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_in(
        &dir,
        DownloadConfig {
            chunk_size: 10,
            max_parallel: 1,
            ..Default::default()
        },
    );
    let err = downloader
        .download(&format!("{}/file.txt", server.uri()))
        .await
        .unwrap_err();

    match err {
        DownloadError::ShortBody {
            expected, received, ..
        } => {
            assert_eq!(expected, 10);
            assert_eq!(received, 5);
        }
        other => panic!("意外的错误: {other:?}"),
    }
    assert_eq!(file_count(&dir), 0);
}

#[tokio::test]
async fn preallocate_failure_keeps_existing_file() {
    let server = MockServer::start().await;
    mount_remote_file(&server, "/file.txt", SAMPLE_TEXT.as_bytes()).await;

    let dir = TempDir::new().unwrap();
    let existing = dir.path().join("file.txt");
    std::fs::write(&existing, b"keep me").unwrap();
    let mut perms = std::fs::metadata(&existing).unwrap().permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(&existing, perms).unwrap();
    // root 等不受只读限制的环境下无法构造打开失败，跳过
    if std::fs::OpenOptions::new().write(true).open(&existing).is_ok() {
        return;
    }

    let downloader = downloader_in(&dir, DownloadConfig::default());
    let err = downloader
        .download(&format!("{}/file.txt", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DownloadError::Storage(StorageError::Preallocate { .. })
    ));
    assert_eq!(std::fs::read(&existing).unwrap(), b"keep me");
}

#[tokio::test]
async fn preallocate_failure_in_missing_dir_sends_no_range_request() {
    let server = MockServer::start().await;
    mount_head(&server, "/file.txt", SAMPLE_TEXT.as_bytes()).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let downloader = ParallelDownloader::with_config(DownloadConfig::default())
        .unwrap()
        .save_to_dir(dir.path().join("missing"));
    let err = downloader
        .download(&format!("{}/file.txt", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DownloadError::Storage(StorageError::Preallocate { .. })
    ));
    assert_eq!(downloader.status().get_current(), Some(DownloadStatus::Failed));
}

#[tokio::test]
async fn probe_failure_creates_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_in(&dir, DownloadConfig::default());
    let err = downloader
        .download(&format!("{}/missing.bin", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DownloadError::MetadataProbe(ProbeError::Status(StatusCode::NOT_FOUND))
    ));
    assert_eq!(file_count(&dir), 0);
}

#[tokio::test]
async fn invalid_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    let downloader = downloader_in(&dir, DownloadConfig::default());

    let err = downloader.download("not a url").await.unwrap_err();
    assert!(matches!(err, DownloadError::InvalidInput { .. }));
    assert_eq!(file_count(&dir), 0);
    assert_eq!(downloader.status().get_current(), Some(DownloadStatus::Failed));
}

#[tokio::test]
async fn negative_config_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_in(&dir, DownloadConfig::default()).max_parallel(-10);
    let err = downloader
        .download(&format!("{}/file.txt", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DownloadError::Config(ConfigError::NegativeMaxParallel(-10))
    ));
    assert_eq!(downloader.config().max_parallel, -10);
    assert_eq!(file_count(&dir), 0);
}
