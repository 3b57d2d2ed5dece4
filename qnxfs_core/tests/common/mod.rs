//! 集成测试公共工具：构造合成镜像并写入临时文件

#![allow(dead_code)]

use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};
use qnxfs_core::{
    DirContainer, DirEntry, FileAttributes, QNX_BLOCK_SIZE, QNX_DIR_CONT_SIZE, QNX_DIR_ENTRY_SIZE,
    QNX_ROOT_ENTRY_OFFSET, QNX_SUPERBLOCK_SIZE, QNX_XTNT_HEADER_SIZE,
};
use tempfile::NamedTempFile;

/// 按块号写入 extent
pub fn put_extent(image: &mut [u8], block: u32, prev: u32, next: u32, payload: &[u8]) {
    let start = (block as usize - 1) * QNX_BLOCK_SIZE;
    LittleEndian::write_u32(&mut image[start..start + 4], prev);
    LittleEndian::write_u32(&mut image[start + 4..start + 8], next);
    LittleEndian::write_u32(&mut image[start + 8..start + 12], payload.len() as u32);
    let data = start + QNX_XTNT_HEADER_SIZE;
    image[data..data + payload.len()].copy_from_slice(payload);
}

pub fn entry(name: &str, first_extent: u32, attributes: FileAttributes) -> DirEntry {
    let mut e = DirEntry {
        status: 1,
        first_extent,
        attributes: attributes.bits(),
        ..DirEntry::default()
    };
    e.set_name(name.as_bytes()).unwrap();
    e
}

pub fn directory(entries: &[DirEntry]) -> Vec<u8> {
    let mut out = vec![0u8; QNX_DIR_CONT_SIZE];
    DirContainer::default().encode(&mut out).unwrap();
    for e in entries {
        let mut raw = [0u8; QNX_DIR_ENTRY_SIZE];
        e.encode(&mut raw).unwrap();
        out.extend_from_slice(&raw);
    }
    out
}

/// `/DATA/BIG` 的内容：1000 + 700 字节，跨越多个扇区
pub fn big_contents() -> Vec<u8> {
    (0..1700u32).map(|i| (i * 7 % 256) as u8).collect()
}

/// 测试镜像
///
/// ```text
/// 块 2      /       README, DATA
/// 块 3      README  "hello from qnx\x1e"
/// 块 4      /DATA   BIG
/// 块 10-11  BIG     1000 字节，next = 14
/// 块 14-15  BIG     700 字节
/// ```
pub fn sample_image() -> Vec<u8> {
    let mut image = vec![0u8; 16 * QNX_BLOCK_SIZE];

    let root = entry("/", 2, FileAttributes::DIRECTORY);
    root.encode(&mut image[QNX_ROOT_ENTRY_OFFSET..QNX_SUPERBLOCK_SIZE])
        .unwrap();

    let root_dir = directory(&[
        entry("README", 3, FileAttributes::empty()),
        entry("DATA", 4, FileAttributes::DIRECTORY),
    ]);
    put_extent(&mut image, 2, 0, 0, &root_dir);
    put_extent(&mut image, 3, 0, 0, b"hello from qnx\x1e");
    put_extent(
        &mut image,
        4,
        0,
        0,
        &directory(&[entry("BIG", 10, FileAttributes::empty())]),
    );

    let big = big_contents();
    put_extent(&mut image, 10, 0, 14, &big[..1000]);
    put_extent(&mut image, 14, 10, 0, &big[1000..]);

    image
}

/// 写入临时文件，文件在返回值被丢弃时删除
pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
