//! 文件镜像后端（需要 `std` 特性）

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, warn};

use super::{BlockDevice, DiskImage};
use crate::error::{Error, ErrorKind, Result};

/// 以只读方式打开的镜像文件
#[derive(Debug)]
pub struct FileDevice {
    file: File,
    size: u64,
}

impl FileDevice {
    /// 打开镜像文件
    ///
    /// # 错误
    ///
    /// - `ErrorKind::Open` - 文件不存在、不可读或无法获取大小
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            warn!("{} open error: {}", path.display(), e);
            Error::new(ErrorKind::Open, "unable to open image file")
        })?;
        let size = file
            .metadata()
            .map_err(|e| {
                warn!("stat error on {}: {}", path.display(), e);
                Error::new(ErrorKind::Open, "unable to stat image file")
            })?
            .len();
        debug!("opened {} ({} bytes)", path.display(), size);

        Ok(Self { file, size })
    }
}

impl BlockDevice for FileDevice {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|_| Error::new(ErrorKind::Io, "seek failed"))?;
        loop {
            match self.file.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => return Err(Error::new(ErrorKind::Io, "read failed")),
            }
        }
    }
}

impl DiskImage<FileDevice> {
    /// 打开磁盘镜像文件
    ///
    /// # 参数
    ///
    /// * `path` - 镜像路径
    /// * `partition_offset` - 分区起始偏移（字节），例如硬盘镜像中的分区
    ///
    /// # 示例
    ///
    /// ```rust,ignore
    /// let mut image = DiskImage::open("qnx12.img", 0)?;
    /// let sector = image.read_sector(0)?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P, partition_offset: u64) -> Result<Self> {
        let device = FileDevice::open(path)?;
        Self::new(device, partition_offset)
    }
}
