mod chunk_handler;
mod chunked;
mod download_one_range;
pub(crate) mod planner;
pub(crate) mod range_request;
pub(crate) mod spawn_tasks;

pub(super) use chunked::{run_chunked_download, RunChunkedDownloadParams};
