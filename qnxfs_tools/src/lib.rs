//! qnxfs-tools: 基于 `qnxfs_core` 的命令行工具
//!
//! - `qdump`：列目录、提取文件或目录树、输出文件内容
//! - `qobj`：解码 QNX 可执行加载文件

// 标准错误日志输出
pub mod logger;
// 命令行选项
pub mod options;
// 目录列表格式化
pub mod listing;
// 文件提取
pub mod extract;
// 文本转换
pub mod convert;
// 加载文件解码
pub mod loadrec;

pub use extract::{dump_file, extract_dir, extract_file, ExtractOptions, ExtractStats};
pub use listing::{collect_entries, format_entry, list_directory};
pub use options::{Command, Operation, Options, USAGE};
