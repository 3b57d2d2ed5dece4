//! 文件系统高级 API
//!
//! 这个模块提供 QNX 1.2 镜像的文件游标和只读文件系统接口。

mod filesystem;
mod file;
mod metadata;

pub use filesystem::QnxFileSystem;
pub use file::{CursorFlags, FileCursor};
pub use metadata::{FileMetadata, FileType};
