//! 远程文件：元数据模型，以及通过 HEAD 请求获取元数据。

pub mod probe;
pub mod structs;
