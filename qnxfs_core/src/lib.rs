//! qnxfs-core: QNX 1.2 磁盘镜像只读访问层
//!
//! 支持在镜像中按路径定位文件、按字节读取文件内容以及遍历目录。

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

// 公共模块
pub mod consts;
pub mod types;
pub mod error;
pub mod block;
pub mod extent;
pub mod superblock;
pub mod dir;
pub mod fs;

#[cfg(any(test, feature = "testing"))]
pub mod testutil;

// 重新导出常用类型
pub use consts::*;
pub use error::{Error, ErrorKind, Result};
pub use types::*;

// 重新导出核心API
pub use block::{BlockDevice, DiskImage, MemDevice};
#[cfg(feature = "std")]
pub use block::FileDevice;
pub use dir::{lookup_entry, lookup_entry_from, open_root, resolve_path, search_dir, DirectoryStream};
pub use extent::ExtentReader;
pub use fs::{CursorFlags, FileCursor, FileMetadata, QnxFileSystem};
pub use superblock::Superblock;
