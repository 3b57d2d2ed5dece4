//! Superblock 读取

use log::debug;

use crate::{
    block::{BlockDevice, DiskImage},
    consts::*,
    error::Result,
    types::{DirEntry, ExtentHeader, RawSuperblock},
};

/// 从镜像读取 superblock
///
/// # 参数
///
/// * `image` - 磁盘镜像
///
/// # 返回
///
/// 成功返回 superblock 结构
pub fn read_superblock<D: BlockDevice>(image: &mut DiskImage<D>) -> Result<RawSuperblock> {
    let mut sb_buf = [0u8; QNX_SUPERBLOCK_SIZE];

    // superblock 位于块 1，即偏移 0
    image.read_bytes(0, &mut sb_buf)?;

    let sb = RawSuperblock::decode(&sb_buf)?;
    debug!(
        "superblock: root first_extent={} attributes={:#x}",
        sb.root.first_extent, sb.root.attributes
    );

    Ok(sb)
}

/// Superblock 包装器
#[derive(Debug, Clone)]
pub struct Superblock {
    inner: RawSuperblock,
}

impl Superblock {
    /// 从镜像加载 superblock
    pub fn load<D: BlockDevice>(image: &mut DiskImage<D>) -> Result<Self> {
        let inner = read_superblock(image)?;
        Ok(Self { inner })
    }

    /// 获取内部 superblock 结构的引用
    pub fn inner(&self) -> &RawSuperblock {
        &self.inner
    }

    /// 根目录项
    pub fn root_entry(&self) -> &DirEntry {
        &self.inner.root
    }

    /// 卷创建日期（原始两个字）
    pub fn creation_date(&self) -> [u16; 2] {
        self.inner.creation_date
    }

    /// 块 1 的 extent 头
    pub fn header(&self) -> &ExtentHeader {
        &self.inner.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemDevice;
    use crate::error::ErrorKind;
    use crate::testutil::{dir_entry, ImageBuilder};
    use crate::types::FileAttributes;

    #[test]
    fn test_load_superblock() {
        let mut b = ImageBuilder::new(4);
        b.set_root(dir_entry(b"/", 2, FileAttributes::DIRECTORY));
        b.set_creation_date([0x1234, 0x5678]);
        let mut image = DiskImage::new(MemDevice::new(b.build()), 0).unwrap();

        let sb = Superblock::load(&mut image).unwrap();
        assert_eq!(sb.root_entry().first_extent, 2);
        assert!(sb.root_entry().is_directory());
        assert_eq!(sb.creation_date(), [0x1234, 0x5678]);
    }

    #[test]
    fn test_superblock_on_tiny_image() {
        let mut image = DiskImage::new(MemDevice::new(alloc::vec![0u8; 100]), 0).unwrap();
        let err = Superblock::load(&mut image).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }
}
