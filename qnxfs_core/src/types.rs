//! QNX 1.2 磁盘数据结构
//!
//! 所有结构都按字段逐个编解码（小端序），不依赖宿主的内存布局或对齐。
//! 字段注释中的数字是该字段在磁盘记录中的字节偏移。

use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};

use crate::consts::*;
use crate::error::{Error, ErrorKind, Result};

fn check_len(buf: &[u8], need: usize, message: &'static str) -> Result<()> {
    if buf.len() < need {
        return Err(Error::new(ErrorKind::InvalidInput, message));
    }
    Ok(())
}

bitflags! {
    /// 目录项中的文件属性字节
    ///
    /// 目前只确认了目录位，其余位按原样保留。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FileAttributes: u8 {
        const DIRECTORY = QNX_ATTR_DIRECTORY;
    }
}

/// Extent 头
///
/// 位于每个 extent 的第一个扇区开头，后面紧跟 extent 数据。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtentHeader {
    pub prev: u32,  // 0: 前一个 extent 的块号（0 表示无）
    pub next: u32,  // 4: 下一个 extent 的块号（0 表示链结束）
    pub size: u32,  // 8: extent 数据字节数
    pub bound: u32, // 12: 含义未确认
}

impl ExtentHeader {
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, QNX_XTNT_HEADER_SIZE, "extent header buffer too short")?;
        Ok(Self {
            prev: LittleEndian::read_u32(&buf[0..4]),
            next: LittleEndian::read_u32(&buf[4..8]),
            size: LittleEndian::read_u32(&buf[8..12]),
            bound: LittleEndian::read_u32(&buf[12..16]),
        })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<()> {
        check_len(buf, QNX_XTNT_HEADER_SIZE, "extent header buffer too short")?;
        LittleEndian::write_u32(&mut buf[0..4], self.prev);
        LittleEndian::write_u32(&mut buf[4..8], self.next);
        LittleEndian::write_u32(&mut buf[8..12], self.size);
        LittleEndian::write_u32(&mut buf[12..16], self.bound);
        Ok(())
    }

    /// 是否还有后继 extent
    pub fn has_next(&self) -> bool {
        self.next != 0
    }
}

/// 目录项
///
/// 布局参考 QNX 2.1 技术说明。QNX 1.2 的目录项只记录整块数，
/// 不记录字节数，文件大小需要遍历 extent 链求和。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub status: u8,                       // 0: 状态
    pub first_extent: u32,                // 1: 第一个 extent 的块号
    pub last_extent: u32,                 // 5: 最后一个 extent 的块号
    pub num_blocks: u32,                  // 9: 块数
    pub num_extents: u16,                 // 13: extent 数
    pub owner: u8,                        // 15: 所有者
    pub group: u8,                        // 16: 组
    pub chars_free: u16,                  // 17: 最后一块中的空闲字节数
    pub seconds: u32,                     // 19: 时间戳
    pub file_type: u8,                    // 23: 类型
    pub group_perms: u8,                  // 24: 组权限
    pub perms: u8,                        // 25: 权限
    pub attributes: u8,                   // 26: 属性（0x20 = 目录）
    pub date: [u16; 2],                   // 27: 日期
    pub name: [u8; QNX_NAME_FIELD_LEN],   // 31: 文件名（16 字符 + 填充）
}

impl Default for DirEntry {
    fn default() -> Self {
        Self {
            status: 0,
            first_extent: 0,
            last_extent: 0,
            num_blocks: 0,
            num_extents: 0,
            owner: 0,
            group: 0,
            chars_free: 0,
            seconds: 0,
            file_type: 0,
            group_perms: 0,
            perms: 0,
            attributes: 0,
            date: [0; 2],
            name: [0; QNX_NAME_FIELD_LEN],
        }
    }
}

impl DirEntry {
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, QNX_DIR_ENTRY_SIZE, "directory entry buffer too short")?;
        let mut name = [0u8; QNX_NAME_FIELD_LEN];
        name.copy_from_slice(&buf[31..31 + QNX_NAME_FIELD_LEN]);
        Ok(Self {
            status: buf[0],
            first_extent: LittleEndian::read_u32(&buf[1..5]),
            last_extent: LittleEndian::read_u32(&buf[5..9]),
            num_blocks: LittleEndian::read_u32(&buf[9..13]),
            num_extents: LittleEndian::read_u16(&buf[13..15]),
            owner: buf[15],
            group: buf[16],
            chars_free: LittleEndian::read_u16(&buf[17..19]),
            seconds: LittleEndian::read_u32(&buf[19..23]),
            file_type: buf[23],
            group_perms: buf[24],
            perms: buf[25],
            attributes: buf[26],
            date: [
                LittleEndian::read_u16(&buf[27..29]),
                LittleEndian::read_u16(&buf[29..31]),
            ],
            name,
        })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<()> {
        check_len(buf, QNX_DIR_ENTRY_SIZE, "directory entry buffer too short")?;
        buf[0] = self.status;
        LittleEndian::write_u32(&mut buf[1..5], self.first_extent);
        LittleEndian::write_u32(&mut buf[5..9], self.last_extent);
        LittleEndian::write_u32(&mut buf[9..13], self.num_blocks);
        LittleEndian::write_u16(&mut buf[13..15], self.num_extents);
        buf[15] = self.owner;
        buf[16] = self.group;
        LittleEndian::write_u16(&mut buf[17..19], self.chars_free);
        LittleEndian::write_u32(&mut buf[19..23], self.seconds);
        buf[23] = self.file_type;
        buf[24] = self.group_perms;
        buf[25] = self.perms;
        buf[26] = self.attributes;
        LittleEndian::write_u16(&mut buf[27..29], self.date[0]);
        LittleEndian::write_u16(&mut buf[29..31], self.date[1]);
        buf[31..31 + QNX_NAME_FIELD_LEN].copy_from_slice(&self.name);
        Ok(())
    }

    /// 文件名字节（截止到第一个 NUL）
    pub fn name_bytes(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.name.len());
        &self.name[..len]
    }

    /// 文件名（UTF-8 字符串）
    pub fn name_str(&self) -> Option<&str> {
        core::str::from_utf8(self.name_bytes()).ok()
    }

    /// 设置文件名，超过 16 字节时返回错误
    pub fn set_name(&mut self, name: &[u8]) -> Result<()> {
        if name.len() > QNX_MAX_NAME_LEN {
            return Err(Error::new(ErrorKind::InvalidInput, "file name longer than 16 bytes"));
        }
        self.name = [0; QNX_NAME_FIELD_LEN];
        self.name[..name.len()].copy_from_slice(name);
        Ok(())
    }

    /// 文件名为空表示未使用（或已删除）的槽位
    pub fn is_used(&self) -> bool {
        self.name[0] != 0
    }

    pub fn attributes(&self) -> FileAttributes {
        FileAttributes::from_bits_retain(self.attributes)
    }

    pub fn is_directory(&self) -> bool {
        self.attributes().contains(FileAttributes::DIRECTORY)
    }
}

/// 目录容器记录
///
/// 目录字节流开头的记录，后面跟着连续的目录项。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirContainer {
    pub parent_extent: u16, // 0: 父目录 extent
    pub dir_index: u16,     // 2: 目录索引
}

impl DirContainer {
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, QNX_DIR_CONT_SIZE, "directory container buffer too short")?;
        Ok(Self {
            parent_extent: LittleEndian::read_u16(&buf[0..2]),
            dir_index: LittleEndian::read_u16(&buf[2..4]),
        })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<()> {
        check_len(buf, QNX_DIR_CONT_SIZE, "directory container buffer too short")?;
        LittleEndian::write_u16(&mut buf[0..2], self.parent_extent);
        LittleEndian::write_u16(&mut buf[2..4], self.dir_index);
        Ok(())
    }
}

/// Superblock（块 1）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSuperblock {
    pub header: ExtentHeader,  // 0: extent 头
    // 16: 4 字节保留
    pub creation_date: [u16; 2], // 20: 创建日期
    // 24: 44 字节保留
    pub root: DirEntry,        // 68: 根目录项
}

impl RawSuperblock {
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, QNX_SUPERBLOCK_SIZE, "superblock buffer too short")?;
        Ok(Self {
            header: ExtentHeader::decode(&buf[0..QNX_XTNT_HEADER_SIZE])?,
            creation_date: [
                LittleEndian::read_u16(&buf[20..22]),
                LittleEndian::read_u16(&buf[22..24]),
            ],
            root: DirEntry::decode(&buf[QNX_ROOT_ENTRY_OFFSET..QNX_SUPERBLOCK_SIZE])?,
        })
    }

    /// 编码到 buf，保留字节不会被改动
    pub fn encode(&self, buf: &mut [u8]) -> Result<()> {
        check_len(buf, QNX_SUPERBLOCK_SIZE, "superblock buffer too short")?;
        self.header.encode(&mut buf[0..QNX_XTNT_HEADER_SIZE])?;
        LittleEndian::write_u16(&mut buf[20..22], self.creation_date[0]);
        LittleEndian::write_u16(&mut buf[22..24], self.creation_date[1]);
        self.root
            .encode(&mut buf[QNX_ROOT_ENTRY_OFFSET..QNX_SUPERBLOCK_SIZE])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_header_little_endian() {
        let raw = [
            0x01, 0x00, 0x00, 0x00, // prev
            0x34, 0x12, 0x00, 0x00, // next
            0x2c, 0x01, 0x00, 0x00, // size = 300
            0xff, 0xff, 0xff, 0xff, // bound
        ];
        let h = ExtentHeader::decode(&raw).unwrap();
        assert_eq!(h.prev, 1);
        assert_eq!(h.next, 0x1234);
        assert_eq!(h.size, 300);
        assert_eq!(h.bound, u32::MAX);
        assert!(h.has_next());

        let mut out = [0u8; QNX_XTNT_HEADER_SIZE];
        h.encode(&mut out).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn test_dir_entry_field_offsets() {
        let mut raw = [0u8; QNX_DIR_ENTRY_SIZE];
        raw[0] = 0x07;
        raw[1..5].copy_from_slice(&5u32.to_le_bytes());
        raw[5..9].copy_from_slice(&9u32.to_le_bytes());
        raw[13..15].copy_from_slice(&2u16.to_le_bytes());
        raw[17..19].copy_from_slice(&100u16.to_le_bytes());
        raw[26] = QNX_ATTR_DIRECTORY | 0x01;
        raw[27..29].copy_from_slice(&0x1981u16.to_le_bytes());
        raw[31..36].copy_from_slice(b"HELLO");

        let de = DirEntry::decode(&raw).unwrap();
        assert_eq!(de.status, 0x07);
        assert_eq!(de.first_extent, 5);
        assert_eq!(de.last_extent, 9);
        assert_eq!(de.num_extents, 2);
        assert_eq!(de.chars_free, 100);
        assert_eq!(de.date[0], 0x1981);
        assert_eq!(de.name_bytes(), b"HELLO");
        assert_eq!(de.name_str(), Some("HELLO"));
        assert!(de.is_directory());
        // 未知属性位保留
        assert_eq!(de.attributes().bits(), 0x21);
    }

    #[test]
    fn test_dir_entry_name_full_width() {
        let mut de = DirEntry::default();
        de.set_name(b"ABCDEFGHIJKLMNOP").unwrap();
        assert_eq!(de.name_bytes().len(), QNX_MAX_NAME_LEN);
        assert!(de.set_name(b"ABCDEFGHIJKLMNOPQ").is_err());
    }

    #[test]
    fn test_unused_slot() {
        let de = DirEntry::decode(&[0u8; QNX_DIR_ENTRY_SIZE]).unwrap();
        assert!(!de.is_used());
        assert!(de.name_bytes().is_empty());
    }

    #[test]
    fn test_short_buffers_rejected() {
        assert!(ExtentHeader::decode(&[0u8; 15]).is_err());
        assert!(DirEntry::decode(&[0u8; 47]).is_err());
        assert!(RawSuperblock::decode(&[0u8; 100]).is_err());
    }

    #[test]
    fn test_superblock_root_offset() {
        let mut raw = [0u8; QNX_SUPERBLOCK_SIZE];
        raw[20..22].copy_from_slice(&0x0102u16.to_le_bytes());
        raw[QNX_ROOT_ENTRY_OFFSET + 1..QNX_ROOT_ENTRY_OFFSET + 5]
            .copy_from_slice(&2u32.to_le_bytes());
        raw[QNX_ROOT_ENTRY_OFFSET + 26] = QNX_ATTR_DIRECTORY;

        let sb = RawSuperblock::decode(&raw).unwrap();
        assert_eq!(sb.creation_date[0], 0x0102);
        assert_eq!(sb.root.first_extent, 2);
        assert!(sb.root.is_directory());
    }
}
