//! Superblock 操作模块
//!
//! 块 1 保存卷的 extent 头、创建日期和根目录项。

mod read;

pub use read::*;
