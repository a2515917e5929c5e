pub mod downloader;
pub mod remote_file;
pub mod states;
pub mod storage;
