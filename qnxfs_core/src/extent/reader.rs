//! Extent 头解析和 extent 内数据读取

use log::{debug, warn};

use crate::{
    block::{BlockDevice, DiskImage},
    consts::*,
    error::{Error, ErrorKind, Result},
    types::ExtentHeader,
};

/// 块号（从 1 开始）对应的字节偏移
fn block_offset(block: u32) -> u64 {
    (block as u64 - 1) * QNX_BLOCK_SIZE as u64
}

/// Extent 读取器
///
/// 借用磁盘镜像，按块号读取 extent 头和 extent 数据。
pub struct ExtentReader<'a, D: BlockDevice> {
    image: &'a mut DiskImage<D>,
}

impl<'a, D: BlockDevice> ExtentReader<'a, D> {
    /// 创建新的 extent 读取器
    pub fn new(image: &'a mut DiskImage<D>) -> Self {
        Self { image }
    }

    /// 读取块 `block` 处的 extent 头
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 块号为 0（块号从 1 开始）
    /// - 镜像读取错误
    pub fn read_header(&mut self, block: u32) -> Result<ExtentHeader> {
        if block == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "invalid extent block number (0)",
            ));
        }

        let mut raw = [0u8; QNX_XTNT_HEADER_SIZE];
        self.image.read_bytes(block_offset(block), &mut raw)?;
        ExtentHeader::decode(&raw)
    }

    /// 读取 extent 数据
    ///
    /// # 参数
    ///
    /// * `block` - extent 所在块号
    /// * `offset` - extent 数据区内的偏移（不含 extent 头）
    /// * `buf` - 输出缓冲区
    ///
    /// # 返回
    ///
    /// 实际读取的字节数。读取范围会被截断到 extent 声明的大小以内。
    ///
    /// # 错误
    ///
    /// - `ErrorKind::Bounds` - `offset` 超出 extent 大小
    pub fn read_data(&mut self, block: u32, offset: u32, buf: &mut [u8]) -> Result<usize> {
        let header = self.read_header(block)?;

        if offset > header.size {
            warn!("offset {} outside extent {}", offset, block);
            return Err(Error::new(ErrorKind::Bounds, "offset outside extent"));
        }

        // 限制在 extent 范围内
        let count = core::cmp::min(buf.len(), (header.size - offset) as usize);
        if count == 0 {
            return Ok(0);
        }

        let pos = block_offset(block) + QNX_XTNT_HEADER_SIZE as u64 + offset as u64;
        self.image.read_bytes(pos, &mut buf[..count])?;

        Ok(count)
    }

    /// 计算 extent 链的总字节数
    ///
    /// QNX 1.2 目录项只记录整块数，字节数只能通过遍历整条链、
    /// 累加每个 extent 的大小得到。
    ///
    /// # 错误
    ///
    /// - 第一个 extent 头读取失败时返回原始错误
    /// - `ErrorKind::ChainCorruption` - 链中途的 extent 头无法读取，或链形成环
    pub fn chain_size(&mut self, first: u32) -> Result<u32> {
        let header = self.read_header(first)?;
        let mut total = header.size as u64;
        let mut next = header.next;

        // 链长度不可能超过镜像中的块数
        let limit = self.image.block_count();
        let mut links = 0u64;

        while next != 0 {
            links += 1;
            if links > limit {
                warn!("extent chain starting at {} does not terminate", first);
                return Err(Error::new(ErrorKind::ChainCorruption, "extent chain loops"));
            }
            let header = self.read_header(next).map_err(|e| {
                warn!("can't read extent {}: {}", next, e);
                Error::new(ErrorKind::ChainCorruption, "unreadable extent in chain")
            })?;
            total += header.size as u64;
            next = header.next;
        }

        if total > QNX_MAX_IMAGE_SIZE {
            return Err(Error::new(
                ErrorKind::ChainCorruption,
                "extent chain larger than image limit",
            ));
        }

        debug!("chain_size: first={} size={}", first, total);
        Ok(total as u32)
    }
}
