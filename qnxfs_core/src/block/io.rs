//! 扇区 I/O 操作实现

use log::{trace, warn};

use super::{BlockDevice, DiskImage};
use crate::consts::*;
use crate::error::{Error, ErrorKind, Result};

impl<D: BlockDevice> DiskImage<D> {
    /// 读取单个扇区
    ///
    /// 读取逻辑扇区 `sector`（从 0 开始，已计入分区偏移）到内部缓冲区。
    ///
    /// # 返回
    ///
    /// 成功返回扇区数据的引用，在下一次读取前有效
    ///
    /// # 错误
    ///
    /// - `ErrorKind::Bounds` - 扇区超出镜像末尾
    /// - `ErrorKind::Io` - 底层读取失败或数据不足
    pub fn read_sector(&mut self, sector: u64) -> Result<&[u8]> {
        let offset = sector
            .checked_mul(QNX_BLOCK_SIZE as u64)
            .and_then(|o| o.checked_add(self.partition_offset))
            .ok_or(Error::new(ErrorKind::Bounds, "sector offset overflow"))?;

        let in_bounds = offset
            .checked_add(QNX_BLOCK_SIZE as u64)
            .is_some_and(|end| end <= self.image_size);
        if !in_bounds {
            warn!(
                "trying to read beyond end of image (sector {}, offset {})",
                sector, offset
            );
            return Err(Error::new(ErrorKind::Bounds, "read beyond end of image"));
        }

        trace!("read_sector: sector={} offset={}", sector, offset);
        self.inc_read_count();

        // 底层可能分多次返回，直到读满一个扇区
        let mut filled = 0;
        while filled < QNX_BLOCK_SIZE {
            let n = self
                .device
                .read_at(offset + filled as u64, &mut self.sector_buf[filled..])?;
            if n == 0 {
                warn!(
                    "error reading from image (sector {}, offset {})",
                    sector, offset
                );
                return Err(Error::new(ErrorKind::Io, "short read from image"));
            }
            filled += n;
        }

        Ok(&self.sector_buf)
    }

    /// 读取字节
    ///
    /// 从任意字节偏移读取，自动处理跨扇区和非对齐起点。
    ///
    /// # 参数
    ///
    /// * `offset` - 字节偏移量（相对分区起点）
    /// * `buf` - 目标缓冲区，将被完整填满
    ///
    /// # 返回
    ///
    /// 成功返回读取的字节数
    ///
    /// # 示例
    ///
    /// ```rust,ignore
    /// let mut header = [0u8; 16];
    /// image.read_bytes(512, &mut header)?;
    /// ```
    pub fn read_bytes(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let block_size = QNX_BLOCK_SIZE as u64;
        let mut offset = offset;
        let mut done = 0;

        while done < buf.len() {
            let sector = offset / block_size;
            let sector_offset = (offset % block_size) as usize;
            let n = core::cmp::min(QNX_BLOCK_SIZE - sector_offset, buf.len() - done);

            self.read_sector(sector)?;
            buf[done..done + n]
                .copy_from_slice(&self.sector_buf[sector_offset..sector_offset + n]);

            done += n;
            offset += n as u64;
        }

        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemDevice;
    use alloc::vec::Vec;

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_read_sector() {
        let mut image = DiskImage::new(MemDevice::new(patterned(2048)), 0).unwrap();
        let sector = image.read_sector(1).unwrap().to_vec();
        assert_eq!(sector, patterned(2048)[512..1024]);
        assert_eq!(image.read_count(), 1);
    }

    #[test]
    fn test_read_sector_past_end() {
        let mut image = DiskImage::new(MemDevice::new(patterned(1024)), 0).unwrap();
        let err = image.read_sector(2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn test_huge_partition_offset() {
        let mut image = DiskImage::new(MemDevice::new(patterned(1024)), u64::MAX - 100).unwrap();
        assert_eq!(image.block_count(), 0);
        let err = image.read_sector(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);

        let mut buf = [0u8; 4];
        let err = image.read_bytes(0, &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
        assert_eq!(image.read_count(), 0);
    }

    #[test]
    fn test_partition_offset() {
        let data = patterned(4096);
        let mut image = DiskImage::new(MemDevice::new(data.clone()), 1000).unwrap();
        let mut buf = [0u8; 20];
        image.read_bytes(10, &mut buf).unwrap();
        assert_eq!(buf[..], data[1010..1030]);
        assert_eq!(image.block_count(), 6);
    }

    #[test]
    fn test_read_bytes_unaligned_span() {
        let data = patterned(4096);
        let mut image = DiskImage::new(MemDevice::new(data.clone()), 0).unwrap();

        // 跨越三个扇区，起点不对齐
        let mut buf = alloc::vec![0u8; 700];
        let n = image.read_bytes(300, &mut buf).unwrap();
        assert_eq!(n, 700);
        assert_eq!(buf[..], data[300..1000]);
        assert_eq!(image.read_count(), 2);

        let mut buf = alloc::vec![0u8; 1100];
        image.read_bytes(500, &mut buf).unwrap();
        assert_eq!(buf[..], data[500..1600]);
    }

    #[test]
    fn test_read_bytes_empty() {
        let mut image = DiskImage::new(MemDevice::new(patterned(512)), 0).unwrap();
        assert_eq!(image.read_bytes(0, &mut []).unwrap(), 0);
        assert_eq!(image.read_count(), 0);
    }

    #[test]
    fn test_read_bytes_tail_out_of_bounds() {
        let mut image = DiskImage::new(MemDevice::new(patterned(1024)), 0).unwrap();
        let mut buf = [0u8; 100];
        let err = image.read_bytes(1000, &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    /// 每次只返回少量字节的设备
    struct TrickleDevice {
        data: Vec<u8>,
        chunk: usize,
    }

    impl BlockDevice for TrickleDevice {
        fn size(&self) -> u64 {
            self.data.len() as u64
        }

        fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
            let start = offset as usize;
            let n = self.chunk.min(buf.len()).min(self.data.len() - start);
            buf[..n].copy_from_slice(&self.data[start..start + n]);
            Ok(n)
        }
    }

    #[test]
    fn test_partial_device_reads_are_completed() {
        let data = patterned(1024);
        let dev = TrickleDevice { data: data.clone(), chunk: 100 };
        let mut image = DiskImage::new(dev, 0).unwrap();
        assert_eq!(image.read_sector(1).unwrap(), &data[512..1024]);
    }

    /// 声称的大小比实际数据大，模拟被截断的镜像文件
    struct TruncatedDevice {
        data: Vec<u8>,
        claimed: u64,
    }

    impl BlockDevice for TruncatedDevice {
        fn size(&self) -> u64 {
            self.claimed
        }

        fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
            let start = (offset as usize).min(self.data.len());
            let n = buf.len().min(self.data.len() - start);
            buf[..n].copy_from_slice(&self.data[start..start + n]);
            Ok(n)
        }
    }

    #[test]
    fn test_short_device_read_is_io_error() {
        let dev = TruncatedDevice { data: patterned(700), claimed: 1024 };
        let mut image = DiskImage::new(dev, 0).unwrap();
        let err = image.read_sector(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_size_limit() {
        let dev = TruncatedDevice { data: Vec::new(), claimed: QNX_MAX_IMAGE_SIZE + 1 };
        let err = DiskImage::new(dev, 0).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::SizeLimit);

        let dev = TruncatedDevice { data: Vec::new(), claimed: QNX_MAX_IMAGE_SIZE };
        assert!(DiskImage::new(dev, 0).is_ok());
    }
}
