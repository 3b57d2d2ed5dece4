//! 目录列表格式化

use std::io::Write;

use anyhow::Result;
use log::warn;
use qnxfs_core::{BlockDevice, DirEntry, FileCursor, QnxFileSystem};

/// 格式化一行目录列表
///
/// 目录以 `+` 开头，普通文件以空格开头；名称左对齐占 17 列，
/// 大小右对齐占 12 列。大小未知时为 -1。
pub fn format_entry(entry: &DirEntry, size: i64) -> String {
    let marker = if entry.is_directory() { '+' } else { ' ' };
    let name = String::from_utf8_lossy(entry.name_bytes());
    format!("{marker}{name:<17}{size:>12}")
}

/// 读取目录项，直到目录结束或第一次读取失败
///
/// 失败时记录警告，已读到的目录项照常返回。
///
/// # 错误
///
/// 只有目录无法打开为目录流时返回错误
pub fn collect_entries<D: BlockDevice>(
    fs: &mut QnxFileSystem<D>,
    dir: &mut FileCursor,
) -> Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for entry in fs.entries(dir)? {
        match entry {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!("error reading directory after {} entries: {}", entries.len(), e);
                break;
            }
        }
    }
    Ok(entries)
}

/// 列出目录中已使用的目录项
///
/// # 返回
///
/// 输出的行数
pub fn list_directory<D: BlockDevice, W: Write>(
    fs: &mut QnxFileSystem<D>,
    dir: &mut FileCursor,
    out: &mut W,
) -> Result<usize> {
    let entries = collect_entries(fs, dir)?;
    let mut lines = 0;

    for entry in entries.iter().filter(|e| e.is_used()) {
        let size = match fs.file_size(entry) {
            Ok(size) => size as i64,
            Err(e) => {
                warn!(
                    "can't determine size of {}: {}",
                    String::from_utf8_lossy(entry.name_bytes()),
                    e
                );
                -1
            }
        };
        writeln!(out, "{}", format_entry(entry, size))?;
        lines += 1;
    }

    Ok(lines)
}
