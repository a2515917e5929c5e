//! 本地文件存储：预分配目标文件、在指定偏移写入、失败后删除。

pub mod local_sink;
