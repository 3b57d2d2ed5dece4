//! Extent 操作模块
//!
//! QNX 1.2 的文件和目录由 extent 链组成：每个 extent 是一段连续扇区，
//! 开头是 16 字节的 extent 头（前驱/后继块号、数据大小），后面紧跟数据。

mod reader;

pub use reader::*;
