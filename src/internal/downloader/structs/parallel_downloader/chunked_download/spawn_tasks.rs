//! 分片下载：为每个分片 spawn 一个任务，用信号量限制同时执行的任务数，
//! 记录第一个失败并取消尚未开始的任务，最后等待全部任务结束。

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::internal::downloader::structs::{ChunkRange, DownloadError};

/// 单个分片任务句柄：(分片区间, JoinHandle)。
pub type RangeTaskHandle = (ChunkRange, JoinHandle<()>);

/// 第一个错误的存放槽：只保留最先写入的错误，之后的错误直接丢弃。
#[derive(Debug, Default)]
pub struct FirstError(Mutex<Option<DownloadError>>);

impl FirstError {
    /// 写入错误；本次写入成功（即这是第一个错误）时返回 `true`。
    pub fn record(&self, err: DownloadError) -> bool {
        let mut slot = self.0.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(err);
        true
    }

    pub fn take(&self) -> Option<DownloadError> {
        self.0.lock().take()
    }
}

/// 生成并 spawn 分片任务时的参数（形参超过 3 个，用 struct 承载）。
pub struct SpawnRangeTasksParams<F> {
    pub ranges: Vec<ChunkRange>,
    pub semaphore: Arc<Semaphore>,
    pub cancel: CancellationToken,
    pub first_error: Arc<FirstError>,
    pub job: Arc<F>,
}

/// 为每个分片 spawn 一个任务，返回任务句柄列表。
///
/// 任务先等待信号量名额，拿到名额后检查取消信号：已取消则直接返回，不执行任务主体；
/// 已在执行中的任务不会被打断。第一个失败会关闭信号量，仍在排队的任务拿不到名额，直接返回。
pub fn spawn_range_tasks<F, Fut>(params: SpawnRangeTasksParams<F>) -> Vec<RangeTaskHandle>
where
    F: Fn(ChunkRange, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), DownloadError>> + Send + 'static,
{
    let mut handles = Vec::with_capacity(params.ranges.len());
    for range in params.ranges {
        let sem = Arc::clone(&params.semaphore);
        let cancel = params.cancel.clone();
        let first_error = Arc::clone(&params.first_error);
        let job = Arc::clone(&params.job);

        let handle = tokio::spawn(async move {
            let _permit = match Arc::clone(&sem).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    debug!(range = %range, "调度已停止，跳过分片");
                    return;
                }
            };
            if cancel.is_cancelled() {
                debug!(range = %range, "下载已取消，跳过分片");
                return;
            }

            match job(range, cancel.clone()).await {
                Ok(()) | Err(DownloadError::Cancelled) => {}
                Err(e) => {
                    if first_error.record(e) {
                        cancel.cancel();
                        // 排队中的任务立即被唤醒并跳过
                        sem.close();
                    }
                }
            }
        });
        handles.push((range, handle));
    }
    handles
}

/// 等待全部分片任务结束；任务 panic 时按普通失败记录。
pub async fn join_range_handles(
    handles: Vec<RangeTaskHandle>,
    first_error: &FirstError,
    cancel: &CancellationToken,
) {
    for (range, h) in handles {
        if let Err(join_err) = h.await {
            debug!(range = %range, "分片任务异常退出");
            if first_error.record(DownloadError::TaskJoin(join_err)) {
                cancel.cancel();
            }
        }
    }
}

/// 以 `ceiling` 为并发上限执行所有分片任务，全部结束后返回第一个错误（如有）。
pub async fn run_chunk_tasks<F, Fut>(
    ranges: Vec<ChunkRange>,
    ceiling: usize,
    cancel: CancellationToken,
    job: F,
) -> Result<(), DownloadError>
where
    F: Fn(ChunkRange, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), DownloadError>> + Send + 'static,
{
    let first_error = Arc::new(FirstError::default());
    let handles = spawn_range_tasks(SpawnRangeTasksParams {
        ranges,
        semaphore: Arc::new(Semaphore::new(ceiling.clamp(1, Semaphore::MAX_PERMITS))),
        cancel: cancel.clone(),
        first_error: Arc::clone(&first_error),
        job: Arc::new(job),
    });

    join_range_handles(handles, &first_error, &cancel).await;

    match first_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
