//! 块设备核心类型

use log::{debug, warn};

use crate::consts::*;
use crate::error::{Error, ErrorKind, Result};

/// 镜像后端接口
///
/// 实现此 trait 以提供对镜像字节的只读访问（普通文件、内存缓冲区等）。
///
/// # 示例
///
/// ```rust,ignore
/// use qnxfs_core::{BlockDevice, Result};
///
/// struct MyDevice {
///     // ...
/// }
///
/// impl BlockDevice for MyDevice {
///     fn size(&self) -> u64 {
///         1440 * 1024
///     }
///
///     fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
///         // 实现字节读取
///         Ok(buf.len())
///     }
/// }
/// ```
pub trait BlockDevice {
    /// 后端总字节数
    fn size(&self) -> u64;

    /// 从字节偏移 `offset` 读取数据
    ///
    /// # 返回
    ///
    /// 实际读取的字节数，可能小于 `buf.len()`；返回 0 表示没有更多数据
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize>;
}

/// 磁盘镜像
///
/// 独占后端设备，所有逻辑地址都会加上分区偏移。
/// 内部持有一个扇区大小的临时缓冲区，不可在多个调用者之间共享。
pub struct DiskImage<D> {
    /// 底层设备
    pub(super) device: D,
    /// 镜像大小（字节）
    pub(super) image_size: u64,
    /// 分区偏移（字节）
    pub(super) partition_offset: u64,
    /// 扇区缓冲区
    pub(super) sector_buf: [u8; QNX_BLOCK_SIZE],
    /// 扇区读取次数
    read_count: u64,
}

impl<D: BlockDevice> DiskImage<D> {
    /// 在设备上创建镜像
    ///
    /// # 参数
    ///
    /// * `device` - 后端设备
    /// * `partition_offset` - 分区起始偏移（字节），整盘镜像为 0
    ///
    /// # 错误
    ///
    /// - `ErrorKind::SizeLimit` - 镜像超过 2GB 上限
    pub fn new(device: D, partition_offset: u64) -> Result<Self> {
        let image_size = device.size();
        if image_size > QNX_MAX_IMAGE_SIZE {
            warn!("image too big ({} bytes)", image_size);
            return Err(Error::new(ErrorKind::SizeLimit, "image larger than 2GB"));
        }
        debug!(
            "disk image: size={} partition_offset={}",
            image_size, partition_offset
        );

        Ok(Self {
            device,
            image_size,
            partition_offset,
            sector_buf: [0; QNX_BLOCK_SIZE],
            read_count: 0,
        })
    }

    /// 获取底层设备的引用
    pub fn device(&self) -> &D {
        &self.device
    }

    /// 取回底层设备
    pub fn into_inner(self) -> D {
        self.device
    }

    /// 镜像大小（字节）
    pub fn image_size(&self) -> u64 {
        self.image_size
    }

    pub fn partition_offset(&self) -> u64 {
        self.partition_offset
    }

    /// 分区内可寻址的块数
    pub fn block_count(&self) -> u64 {
        self.image_size.saturating_sub(self.partition_offset) / QNX_BLOCK_SIZE as u64
    }

    /// 获取扇区读取次数
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    // 内部辅助方法

    pub(super) fn inc_read_count(&mut self) {
        self.read_count += 1;
    }
}
