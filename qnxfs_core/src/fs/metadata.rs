//! 文件元数据

use alloc::string::String;

use crate::types::{DirEntry, FileAttributes};

/// 文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    RegularFile,
    Directory,
}

/// 文件元数据
///
/// 由目录项和遍历 extent 链得到的字节大小组合而成。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// 文件名（非 UTF-8 字节按替换字符显示）
    pub name: String,
    pub file_type: FileType,
    /// 字节大小
    pub size: u32,
    pub first_extent: u32,
    pub num_blocks: u32,
    pub num_extents: u16,
    pub owner: u8,
    pub group: u8,
    pub perms: u8,
    pub group_perms: u8,
    pub attributes: FileAttributes,
    pub seconds: u32,
    pub date: [u16; 2],
}

impl FileMetadata {
    pub fn from_entry(entry: &DirEntry, size: u32) -> Self {
        let file_type = if entry.is_directory() {
            FileType::Directory
        } else {
            FileType::RegularFile
        };

        Self {
            name: String::from_utf8_lossy(entry.name_bytes()).into_owned(),
            file_type,
            size,
            first_extent: entry.first_extent,
            num_blocks: entry.num_blocks,
            num_extents: entry.num_extents,
            owner: entry.owner,
            group: entry.group,
            perms: entry.perms,
            group_perms: entry.group_perms,
            attributes: entry.attributes(),
            seconds: entry.seconds,
            date: entry.date,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::RegularFile
    }
}
