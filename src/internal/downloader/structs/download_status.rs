/// 下载状态（由下载器内部维护，外部只读监听）
///
/// `Planning → Running → Succeeded | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    /// 校验配置、获取元数据、规划分片
    Planning,
    /// 分片任务执行中
    Running,
    Succeeded,
    /// 任一分片最终失败，目标文件已删除
    Failed,
}

impl DownloadStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, DownloadStatus::Succeeded | DownloadStatus::Failed)
    }
}
