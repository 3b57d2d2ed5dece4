//! 合成镜像构造工具
//!
//! 仅用于测试：在内存中按块拼出 QNX 1.2 镜像。构造错误直接 panic。

use alloc::vec;
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::consts::*;
use crate::types::{DirContainer, DirEntry, ExtentHeader, FileAttributes};

/// 内存镜像构造器
pub struct ImageBuilder {
    data: Vec<u8>,
}

impl ImageBuilder {
    /// 创建 `blocks` 个全零块的镜像
    pub fn new(blocks: usize) -> Self {
        Self {
            data: vec![0u8; blocks * QNX_BLOCK_SIZE],
        }
    }

    fn block_start(block: u32) -> usize {
        assert!(block > 0, "block numbers start at 1");
        (block as usize - 1) * QNX_BLOCK_SIZE
    }

    /// 在块 `block` 写入 extent 头和数据
    pub fn write_extent(&mut self, block: u32, prev: u32, next: u32, payload: &[u8]) -> &mut Self {
        let start = Self::block_start(block);
        let end = start + QNX_XTNT_HEADER_SIZE + payload.len();
        assert!(end <= self.data.len(), "extent does not fit in image");

        let header = ExtentHeader {
            prev,
            next,
            size: payload.len() as u32,
            bound: 0,
        };
        header
            .encode(&mut self.data[start..start + QNX_XTNT_HEADER_SIZE])
            .unwrap();
        self.data[start + QNX_XTNT_HEADER_SIZE..end].copy_from_slice(payload);
        self
    }

    /// 设置 superblock 中的根目录项
    pub fn set_root(&mut self, root: DirEntry) -> &mut Self {
        root.encode(&mut self.data[QNX_ROOT_ENTRY_OFFSET..QNX_SUPERBLOCK_SIZE])
            .unwrap();
        self
    }

    pub fn set_creation_date(&mut self, date: [u16; 2]) -> &mut Self {
        LittleEndian::write_u16(&mut self.data[20..22], date[0]);
        LittleEndian::write_u16(&mut self.data[22..24], date[1]);
        self
    }

    /// 直接改写任意字节
    pub fn patch(&mut self, offset: usize, bytes: &[u8]) -> &mut Self {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.data.clone()
    }
}

/// 构造一个目录项
pub fn dir_entry(name: &[u8], first_extent: u32, attributes: FileAttributes) -> DirEntry {
    let mut entry = DirEntry {
        status: 1,
        first_extent,
        last_extent: first_extent,
        num_blocks: 1,
        num_extents: 1,
        perms: 0o7,
        attributes: attributes.bits(),
        ..DirEntry::default()
    };
    entry.set_name(name).unwrap();
    entry
}

/// 目录字节流：容器记录后接目录项
pub fn dir_payload(entries: &[DirEntry]) -> Vec<u8> {
    let mut payload = vec![0u8; QNX_DIR_CONT_SIZE + entries.len() * QNX_DIR_ENTRY_SIZE];
    DirContainer::default()
        .encode(&mut payload[..QNX_DIR_CONT_SIZE])
        .unwrap();
    for (i, entry) in entries.iter().enumerate() {
        let start = QNX_DIR_CONT_SIZE + i * QNX_DIR_ENTRY_SIZE;
        entry
            .encode(&mut payload[start..start + QNX_DIR_ENTRY_SIZE])
            .unwrap();
    }
    payload
}

/// `/HELLO` 的内容，分布在两个 extent 中（300 + 50 字节）
pub fn hello_contents() -> Vec<u8> {
    (0..350u32).map(|i| b'a' + (i % 26) as u8).collect()
}

/// `/SUB/NOTE` 的内容，用 0x1e 作行分隔
pub const NOTE_CONTENTS: &[u8] = b"line one\x1eline two\x1e";

/// 标准测试镜像
///
/// ```text
/// 块 1  superblock，根目录项指向块 2
/// 块 2  /      HELLO, (空槽位), SUB, EMPTY
/// 块 3  HELLO  第一个 extent，300 字节，next = 4
/// 块 4  HELLO  第二个 extent，50 字节
/// 块 5  /SUB   NOTE
/// 块 6  NOTE
/// 块 7  EMPTY  0 字节
/// ```
pub fn hello_image() -> Vec<u8> {
    let hello = hello_contents();
    let mut b = ImageBuilder::new(8);

    b.set_root(dir_entry(b"/", 2, FileAttributes::DIRECTORY));
    b.set_creation_date([0x0102, 0x0304]);

    let root = dir_payload(&[
        dir_entry(b"HELLO", 3, FileAttributes::empty()),
        DirEntry::default(),
        dir_entry(b"SUB", 5, FileAttributes::DIRECTORY),
        dir_entry(b"EMPTY", 7, FileAttributes::empty()),
    ]);
    b.write_extent(2, 0, 0, &root);
    b.write_extent(3, 0, 4, &hello[..300]);
    b.write_extent(4, 3, 0, &hello[300..]);

    let sub = dir_payload(&[dir_entry(b"NOTE", 6, FileAttributes::empty())]);
    b.write_extent(5, 0, 0, &sub);
    b.write_extent(6, 0, 0, NOTE_CONTENTS);
    b.write_extent(7, 0, 0, &[]);

    b.build()
}

/// 根目录 extent 声明 964 字节，但镜像在第一个扇区后结束
///
/// ```text
/// 块 1  superblock，根目录项指向块 3
/// 块 2  F0..F9 共用的数据 "data"
/// 块 3  /  F0..F9，extent 大小被改为 964
/// ```
///
/// 前 10 个目录项可读，第 11 个越过镜像末尾。
pub fn overrun_dir_image() -> Vec<u8> {
    let mut b = ImageBuilder::new(3);
    b.set_root(dir_entry(b"/", 3, FileAttributes::DIRECTORY));

    let names: Vec<Vec<u8>> = (0..10).map(|i| alloc::format!("F{i}").into_bytes()).collect();
    let entries: Vec<DirEntry> = names
        .iter()
        .map(|n| dir_entry(n, 2, FileAttributes::empty()))
        .collect();
    b.write_extent(2, 0, 0, b"data");
    b.write_extent(3, 0, 0, &dir_payload(&entries));
    b.patch(2 * QNX_BLOCK_SIZE + 8, &964u32.to_le_bytes());

    b.build()
}
